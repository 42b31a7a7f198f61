//! The version part of a [`crate::MatchSpec`], e.g. `>=3.4,<4.0` or `1.7|1.8`.

mod parse;

use std::fmt::{self, Display, Formatter};

use thiserror::Error;

pub use parse::ParseVersionSpecError;

use crate::Version;

/// A comparison operator usable in a [`VersionSpec::Range`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum RangeOperator {
    /// `>`
    Greater,
    /// `>=`
    GreaterEquals,
    /// `<`
    Less,
    /// `<=`
    LessEquals,
}

impl Display for RangeOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RangeOperator::Greater => ">",
            RangeOperator::GreaterEquals => ">=",
            RangeOperator::Less => "<",
            RangeOperator::LessEquals => "<=",
        })
    }
}

/// `==` or `!=`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum EqualityOperator {
    /// `==`
    Equals,
    /// `!=`
    NotEquals,
}

impl Display for EqualityOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EqualityOperator::Equals => "==",
            EqualityOperator::NotEquals => "!=",
        })
    }
}

/// Combines a group of [`VersionSpec`]s.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum LogicalOperator {
    /// `,` — every member must match.
    And,
    /// `|` — at least one member must match.
    Or,
}

/// A parsed version predicate, as found in the `version` field of a
/// [`crate::MatchSpec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSpec {
    /// No version constraint was given at all.
    None,
    /// `*` on its own: matches any version.
    Any,
    /// A glob pattern, e.g. `1.2*` over the version's source text.
    Glob(glob::Pattern),
    /// A bound, e.g. `>=1.7`.
    Range(RangeOperator, Version),
    /// An (in)equality, e.g. `==1.7` or `!=1.7`.
    Exact(EqualityOperator, Version),
    /// A conjunction/disjunction of specs, e.g. `>=1.7,<1.9` or `1.7|1.8`.
    Group(LogicalOperator, Vec<VersionSpec>),
}

impl Default for VersionSpec {
    fn default() -> Self {
        VersionSpec::None
    }
}

impl VersionSpec {
    /// Parses a version spec from its textual form.
    pub fn parse(source: &str) -> Result<Self, ParseVersionSpecError> {
        parse::parse_version_spec(source)
    }

    /// Returns whether `version` satisfies this spec.
    pub fn matches(&self, version: &Version) -> bool {
        match self {
            VersionSpec::None | VersionSpec::Any => true,
            VersionSpec::Glob(pattern) => pattern.matches(version.as_str()),
            VersionSpec::Range(op, bound) => match op {
                RangeOperator::Greater => version > bound,
                RangeOperator::GreaterEquals => version >= bound,
                RangeOperator::Less => version < bound,
                RangeOperator::LessEquals => version <= bound,
            },
            VersionSpec::Exact(op, exact) => match op {
                EqualityOperator::Equals => version == exact,
                EqualityOperator::NotEquals => version != exact,
            },
            VersionSpec::Group(LogicalOperator::And, specs) => {
                specs.iter().all(|s| s.matches(version))
            }
            VersionSpec::Group(LogicalOperator::Or, specs) => {
                specs.iter().any(|s| s.matches(version))
            }
        }
    }
}

impl Display for VersionSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            VersionSpec::None => Ok(()),
            VersionSpec::Any => write!(f, "*"),
            VersionSpec::Glob(pattern) => write!(f, "{}", pattern.as_str()),
            VersionSpec::Range(op, version) => write!(f, "{op}{version}"),
            VersionSpec::Exact(op, version) => write!(f, "{op}{version}"),
            VersionSpec::Group(LogicalOperator::And, specs) => {
                write!(f, "{}", specs.iter().map(ToString::to_string).collect::<Vec<_>>().join(","))
            }
            VersionSpec::Group(LogicalOperator::Or, specs) => {
                write!(f, "{}", specs.iter().map(ToString::to_string).collect::<Vec<_>>().join("|"))
            }
        }
    }
}

/// An error returned by glob-pattern compilation elsewhere in the crate.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[error("invalid glob pattern {0:?}")]
pub struct InvalidGlobError(pub String);
