use thiserror::Error;

use super::{EqualityOperator, InvalidGlobError, LogicalOperator, RangeOperator, VersionSpec};
use crate::version::ParseVersionError;
use crate::Version;

/// An error produced while parsing a [`VersionSpec`].
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum ParseVersionSpecError {
    /// An embedded version bound was not a valid [`Version`].
    #[error("invalid version in version spec: {0}")]
    InvalidVersion(#[from] ParseVersionError),
    /// The spec text was empty.
    #[error("empty version spec")]
    Empty,
    /// An embedded glob term was not a valid glob pattern.
    #[error(transparent)]
    InvalidGlob(#[from] InvalidGlobError),
}

pub(super) fn parse_version_spec(source: &str) -> Result<VersionSpec, ParseVersionSpecError> {
    let source = source.trim();
    if source.is_empty() {
        return Ok(VersionSpec::None);
    }
    if source == "*" {
        return Ok(VersionSpec::Any);
    }

    let and_terms: Vec<&str> = source.split(',').map(str::trim).collect();
    let mut and_parts = Vec::with_capacity(and_terms.len());
    for term in and_terms {
        and_parts.push(parse_or_group(term)?);
    }

    Ok(if and_parts.len() == 1 {
        and_parts.into_iter().next().unwrap()
    } else {
        VersionSpec::Group(LogicalOperator::And, and_parts)
    })
}

fn parse_or_group(source: &str) -> Result<VersionSpec, ParseVersionSpecError> {
    let or_terms: Vec<&str> = source.split('|').map(str::trim).collect();
    let mut or_parts = Vec::with_capacity(or_terms.len());
    for term in or_terms {
        or_parts.push(parse_term(term)?);
    }

    Ok(if or_parts.len() == 1 {
        or_parts.into_iter().next().unwrap()
    } else {
        VersionSpec::Group(LogicalOperator::Or, or_parts)
    })
}

fn parse_term(term: &str) -> Result<VersionSpec, ParseVersionSpecError> {
    if term.is_empty() {
        return Err(ParseVersionSpecError::Empty);
    }
    if term == "*" {
        return Ok(VersionSpec::Any);
    }

    if let Some(rest) = term.strip_prefix(">=") {
        return Ok(VersionSpec::Range(RangeOperator::GreaterEquals, Version::parse(rest)?));
    }
    if let Some(rest) = term.strip_prefix("<=") {
        return Ok(VersionSpec::Range(RangeOperator::LessEquals, Version::parse(rest)?));
    }
    if let Some(rest) = term.strip_prefix("==") {
        return Ok(VersionSpec::Exact(EqualityOperator::Equals, Version::parse(rest)?));
    }
    if let Some(rest) = term.strip_prefix("!=") {
        return Ok(VersionSpec::Exact(EqualityOperator::NotEquals, Version::parse(rest)?));
    }
    if let Some(rest) = term.strip_prefix('>') {
        return Ok(VersionSpec::Range(RangeOperator::Greater, Version::parse(rest)?));
    }
    if let Some(rest) = term.strip_prefix('<') {
        return Ok(VersionSpec::Range(RangeOperator::Less, Version::parse(rest)?));
    }

    // `1.7.*` is shorthand for `>=1.7,<1.8`.
    if let Some(prefix) = term.strip_suffix(".*") {
        if !prefix.contains('*') {
            let lower = Version::parse(prefix)?;
            let upper = Version::parse(&bump_last_segment(prefix))?;
            return Ok(VersionSpec::Group(
                LogicalOperator::And,
                vec![
                    VersionSpec::Range(RangeOperator::GreaterEquals, lower),
                    VersionSpec::Range(RangeOperator::Less, upper),
                ],
            ));
        }
    }

    // An embedded (non-suffix) `*` is a plain glob over the version's source
    // text, e.g. `1.2*`.
    if term.contains('*') {
        let pattern = glob::Pattern::new(term).map_err(|_| InvalidGlobError(term.to_string()))?;
        return Ok(VersionSpec::Glob(pattern));
    }

    // A bare version with no operator is an exact match.
    Ok(VersionSpec::Exact(EqualityOperator::Equals, Version::parse(term)?))
}

/// Increments the final numeric segment of a release string, dropping any
/// local/epoch decoration (the prefix is always a bare release by
/// construction: it is what preceded a `.*` suffix).
fn bump_last_segment(release: &str) -> String {
    let mut parts: Vec<&str> = release.split('.').collect();
    let Some(last) = parts.pop() else {
        return format!("{release}.0");
    };
    match last.parse::<u64>() {
        Ok(n) => {
            let bumped = (n + 1).to_string();
            if parts.is_empty() {
                bumped
            } else {
                format!("{}.{bumped}", parts.join("."))
            }
        }
        Err(_) => {
            // Non-numeric last segment: there is no well-defined "next"
            // value, so fall back to appending a zero segment, which keeps
            // the range well formed (if a little generous) rather than
            // failing the whole parse.
            format!("{release}.0")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_none() {
        assert_eq!(parse_version_spec("").unwrap(), VersionSpec::None);
    }

    #[test]
    fn bump_segment_simple() {
        assert_eq!(bump_last_segment("1.7"), "1.8");
        assert_eq!(bump_last_segment("1"), "2");
        assert_eq!(bump_last_segment("1.7.9"), "1.7.10");
    }
}
