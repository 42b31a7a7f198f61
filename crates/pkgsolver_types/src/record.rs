//! [`PackageRecord`]: a single candidate installable artifact.

use std::fmt::{self, Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Namespace, PackageName, Version};

/// The unique key that identifies a [`PackageRecord`] in an index: no two
/// records with the same key may differ.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct RecordKey {
    /// The channel this record was published under.
    pub channel: String,
    /// The platform subdirectory (e.g. `linux-64`).
    pub subdir: String,
    /// The namespace this record belongs to.
    pub namespace: Namespace,
    /// The normalized package name.
    pub name: String,
    /// The version, rendered to its source string (so the key is directly
    /// comparable/hashable without pulling in `Version`'s custom equality).
    pub version: String,
    /// The build string.
    pub build_string: String,
    /// The build number.
    pub build_number: u64,
}

/// A single candidate installable artifact.
///
/// Records are immutable once loaded into an index: nothing in the solver
/// ever mutates a `PackageRecord` after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageRecord {
    /// The package name.
    pub name: PackageName,
    /// The package version.
    pub version: Version,
    /// The build string, e.g. `py39h6de7cb9_0`.
    pub build_string: String,
    /// The build number. Higher build numbers with the same version are
    /// preferred.
    pub build_number: u64,
    /// The channel this record was published under.
    pub channel: String,
    /// The platform subdirectory, e.g. `linux-64`.
    pub subdir: String,
    /// The namespace this record belongs to (`global`, `python`, `r`, ...).
    pub namespace: Namespace,
    /// Dependency specs, stored as raw text and parsed lazily at match time,
    /// exactly as a [`crate::MatchSpec`]'s textual form.
    pub depends: Vec<String>,
    /// Specs that apply only if the named package is also present in the
    /// environment.
    pub constrains: Vec<String>,
    /// Feature tokens this record supplies.
    pub features: Vec<String>,
    /// Feature tokens this record tracks (pulls into the environment).
    pub track_features: Vec<String>,
    /// Used only as a tie-breaker among otherwise-equal candidates.
    pub timestamp: Option<DateTime<Utc>>,
}

impl PackageRecord {
    /// The key that uniquely identifies this record.
    pub fn key(&self) -> RecordKey {
        RecordKey {
            channel: self.channel.clone(),
            subdir: self.subdir.clone(),
            namespace: self.namespace.clone(),
            name: self.name.as_normalized().to_string(),
            version: self.version.as_str().to_string(),
            build_string: self.build_string.clone(),
            build_number: self.build_number,
        }
    }
}

impl Display for PackageRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.build_string.is_empty() {
            write!(f, "{} {}", self.name.as_normalized(), self.version)
        } else {
            write!(
                f,
                "{}-{}-{}",
                self.name.as_normalized(),
                self.version,
                self.build_string
            )
        }
    }
}

impl PartialEq for PackageRecord {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for PackageRecord {}
