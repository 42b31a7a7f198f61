//! Package name normalization.

use std::{
    borrow::Borrow,
    fmt::{self, Debug, Formatter},
    hash::{Hash, Hasher},
};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A conda-style package name: the source string it was created from plus a
/// normalized (ASCII-lowercase) form used for comparison and hashing.
///
/// `PackageName` does not implement [`std::fmt::Display`] because it is
/// ambiguous whether that should print the source or the normalized form —
/// call [`PackageName::as_source`] or [`PackageName::as_normalized`]
/// explicitly.
#[derive(Clone, Eq)]
pub struct PackageName {
    normalized: Box<str>,
    source: Box<str>,
}

/// An error produced when a string cannot be used as a [`PackageName`].
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum InvalidPackageNameError {
    /// The name contained a character outside `[a-zA-Z0-9._-]`.
    #[error("invalid character {1:?} in package name {0:?}")]
    InvalidCharacter(String, char),
    /// The name was empty.
    #[error("package name cannot be empty")]
    Empty,
}

impl PackageName {
    /// Constructs a `PackageName`, validating that it only contains
    /// characters legal in a conda package name.
    pub fn new(source: impl Into<String>) -> Result<Self, InvalidPackageNameError> {
        let source: String = source.into();
        if source.is_empty() {
            return Err(InvalidPackageNameError::Empty);
        }
        if let Some(bad) = source
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
        {
            return Err(InvalidPackageNameError::InvalidCharacter(source, bad));
        }
        let normalized = source.to_ascii_lowercase().into_boxed_str();
        Ok(Self {
            source: source.into_boxed_str(),
            normalized,
        })
    }

    /// Constructs a `PackageName` without validating the input. Only use
    /// this for strings that are already known to be valid (e.g. literals
    /// in tests).
    pub fn new_unchecked(source: impl Into<String>) -> Self {
        let source: String = source.into();
        let normalized = source.to_ascii_lowercase().into_boxed_str();
        Self {
            source: source.into_boxed_str(),
            normalized,
        }
    }

    /// The string this name was constructed from, case preserved.
    pub fn as_source(&self) -> &str {
        &self.source
    }

    /// The ASCII-lowercased form used for comparison.
    pub fn as_normalized(&self) -> &str {
        &self.normalized
    }
}

impl Debug for PackageName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PackageName").field(&self.source).finish()
    }
}

impl PartialEq for PackageName {
    fn eq(&self, other: &Self) -> bool {
        self.normalized == other.normalized
    }
}

impl Hash for PackageName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized.hash(state);
    }
}

impl Borrow<str> for PackageName {
    fn borrow(&self) -> &str {
        &self.normalized
    }
}

impl PartialOrd for PackageName {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PackageName {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.normalized.cmp(&other.normalized)
    }
}

impl Serialize for PackageName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for PackageName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        PackageName::new(source).map_err(de::Error::custom)
    }
}
