//! The `build_number` predicate of a [`crate::MatchSpec`].

use std::fmt::{self, Display, Formatter};

use thiserror::Error;

use crate::version_spec::RangeOperator;

/// A predicate over a record's `build_number`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum BuildNumberSpec {
    /// An exact build number.
    Exact(u64),
    /// A bound, e.g. `>=2`.
    Range(RangeOperator, u64),
}

/// An error produced while parsing a [`BuildNumberSpec`].
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum ParseBuildNumberSpecError {
    /// The text was not a valid unsigned integer (after stripping an
    /// optional comparison operator).
    #[error("invalid build number in {0:?}")]
    InvalidNumber(String),
}

impl BuildNumberSpec {
    /// Parses a build number predicate, e.g. `"0"`, `">=2"`, `"<=5"`.
    pub fn parse(source: &str) -> Result<Self, ParseBuildNumberSpecError> {
        let source = source.trim();
        let (op, rest) = if let Some(rest) = source.strip_prefix(">=") {
            (Some(RangeOperator::GreaterEquals), rest)
        } else if let Some(rest) = source.strip_prefix("<=") {
            (Some(RangeOperator::LessEquals), rest)
        } else if let Some(rest) = source.strip_prefix('>') {
            (Some(RangeOperator::Greater), rest)
        } else if let Some(rest) = source.strip_prefix('<') {
            (Some(RangeOperator::Less), rest)
        } else {
            (None, source)
        };

        let value: u64 = rest
            .trim()
            .parse()
            .map_err(|_| ParseBuildNumberSpecError::InvalidNumber(source.to_string()))?;

        Ok(match op {
            Some(op) => BuildNumberSpec::Range(op, value),
            None => BuildNumberSpec::Exact(value),
        })
    }

    /// Returns whether `build_number` satisfies this predicate.
    pub fn matches(&self, build_number: u64) -> bool {
        match self {
            BuildNumberSpec::Exact(expected) => build_number == *expected,
            BuildNumberSpec::Range(RangeOperator::Greater, bound) => build_number > *bound,
            BuildNumberSpec::Range(RangeOperator::GreaterEquals, bound) => build_number >= *bound,
            BuildNumberSpec::Range(RangeOperator::Less, bound) => build_number < *bound,
            BuildNumberSpec::Range(RangeOperator::LessEquals, bound) => build_number <= *bound,
        }
    }
}

impl Display for BuildNumberSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            BuildNumberSpec::Exact(n) => write!(f, "{n}"),
            BuildNumberSpec::Range(op, n) => write!(f, "{op}{n}"),
        }
    }
}
