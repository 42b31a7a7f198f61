//! The language-ish partition that allows multiple records with the same
//! bare name to coexist (`global`, `python`, `r`, `perl`, ...).

use std::{
    cmp::Ordering,
    fmt::{self, Display, Formatter},
};

use serde::{Deserialize, Serialize};

/// A package namespace.
///
/// Namespaces have a deterministic preference order used to disambiguate a
/// bare name that resolves to candidates in more than one namespace:
/// `global < python < r < perl < other namespaces, alphabetically`.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Namespace {
    /// The default, language-agnostic namespace.
    Global,
    /// Python-ecosystem packages.
    Python,
    /// R-ecosystem packages.
    R,
    /// Perl-ecosystem packages.
    Perl,
    /// Any other namespace, identified by name.
    Other(String),
}

impl Namespace {
    /// Parses a namespace token as it appears in a qualified match spec
    /// name (`python:graphviz`) or a record's `namespace` field.
    pub fn parse(token: &str) -> Self {
        match token {
            "global" => Namespace::Global,
            "python" => Namespace::Python,
            "r" => Namespace::R,
            "perl" => Namespace::Perl,
            other => Namespace::Other(other.to_string()),
        }
    }

    /// The canonical string form of this namespace.
    pub fn as_str(&self) -> &str {
        match self {
            Namespace::Global => "global",
            Namespace::Python => "python",
            Namespace::R => "r",
            Namespace::Perl => "perl",
            Namespace::Other(name) => name,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Namespace::Global => 0,
            Namespace::Python => 1,
            Namespace::R => 2,
            Namespace::Perl => 3,
            Namespace::Other(_) => 4,
        }
    }
}

impl Display for Namespace {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Namespace::Global
    }
}

impl PartialOrd for Namespace {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Namespace {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank()).then_with(|| match (self, other) {
            (Namespace::Other(a), Namespace::Other(b)) => a.cmp(b),
            _ => Ordering::Equal,
        })
    }
}
