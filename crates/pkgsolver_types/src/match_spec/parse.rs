use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use super::matcher::StringMatcher;
use super::MatchSpec;
use crate::build_spec::{BuildNumberSpec, ParseBuildNumberSpecError};
use crate::version_spec::{InvalidGlobError, ParseVersionSpecError, VersionSpec};
use crate::{InvalidPackageNameError, Namespace, PackageName};

/// An error produced while parsing a [`MatchSpec`] from its textual form.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum ParseMatchSpecError {
    /// The spec text was empty.
    #[error("empty match spec")]
    Empty,
    /// The `[...]` suffix was opened but never closed.
    #[error("unterminated bracket in match spec {0:?}")]
    UnterminatedBracket(String),
    /// A bracket entry was not of the form `key=value`.
    #[error("malformed bracket entry {0:?}, expected key=value")]
    MalformedBracketEntry(String),
    /// A bracket key was not one this implementation recognizes.
    #[error("unknown match spec key {0:?}")]
    UnknownKey(String),
    /// The name part was not a valid package name.
    #[error(transparent)]
    InvalidName(#[from] InvalidPackageNameError),
    /// The version part was not a valid version spec.
    #[error(transparent)]
    InvalidVersion(#[from] ParseVersionSpecError),
    /// The `build_number` bracket entry was not a valid predicate.
    #[error(transparent)]
    InvalidBuildNumber(#[from] ParseBuildNumberSpecError),
    /// The `build` bracket entry was not a valid glob pattern.
    #[error(transparent)]
    InvalidBuildGlob(#[from] InvalidGlobError),
}

static NAME_AND_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z0-9_.\-\*]*)\s*(.*)$").expect("static regex is valid"));

pub(super) fn parse_match_spec(source: &str) -> Result<MatchSpec, ParseMatchSpecError> {
    let source = source.trim();
    if source.is_empty() {
        return Err(ParseMatchSpecError::Empty);
    }

    let (head, bracket) = split_bracket(source)?;
    let mut spec = MatchSpec::default();

    if let Some(bracket) = bracket {
        for entry in split_top_level(bracket, ',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let Some((key, value)) = entry.split_once('=') else {
                return Err(ParseMatchSpecError::MalformedBracketEntry(entry.to_string()));
            };
            apply_bracket_entry(&mut spec, key.trim(), unquote(value.trim()))?;
        }
    }

    let head = head.trim();
    let (namespace, rest) = split_namespace(head);
    spec.namespace = namespace;

    let captures = NAME_AND_VERSION
        .captures(rest)
        .expect("regex always matches, even the empty string");
    let name_part = captures.get(1).map_or("", |m| m.as_str());
    let version_part = captures.get(2).map_or("", |m| m.as_str()).trim();

    if !name_part.is_empty() && name_part != "*" {
        spec.name = Some(PackageName::new(name_part)?);
    }
    if !version_part.is_empty() {
        // A bracket `version=` entry, if present, already populated
        // `spec.version`; a positional version part always wins since it is
        // more specific to this particular spec occurrence.
        spec.version = VersionSpec::parse(version_part)?;
    }

    Ok(spec)
}

fn apply_bracket_entry(
    spec: &mut MatchSpec,
    key: &str,
    value: &str,
) -> Result<(), ParseMatchSpecError> {
    match key {
        "version" => spec.version = VersionSpec::parse(value)?,
        "build" => spec.build = Some(value.parse::<StringMatcher>()?),
        "build_number" => spec.build_number = Some(BuildNumberSpec::parse(value)?),
        "channel" => spec.channel = Some(value.to_string()),
        "subdir" => spec.subdir = Some(value.to_string()),
        "features" => spec.features = split_whitespace_list(value),
        "track_features" => spec.track_features = split_whitespace_list(value),
        other => return Err(ParseMatchSpecError::UnknownKey(other.to_string())),
    }
    Ok(())
}

fn split_whitespace_list(value: &str) -> Vec<String> {
    value.split_whitespace().map(str::to_string).collect()
}

/// Splits off a trailing `[...]` bracket, if the spec has one.
fn split_bracket(source: &str) -> Result<(&str, Option<&str>), ParseMatchSpecError> {
    let Some(open) = source.find('[') else {
        return Ok((source, None));
    };
    if !source.ends_with(']') {
        return Err(ParseMatchSpecError::UnterminatedBracket(source.to_string()));
    }
    Ok((&source[..open], Some(&source[open + 1..source.len() - 1])))
}

/// Splits a leading `namespace:` qualifier off the name/version head, e.g.
/// `python:graphviz>=2.4` -> (`Some(Python)`, `graphviz>=2.4`).
fn split_namespace(head: &str) -> (Option<Namespace>, &str) {
    match head.split_once(':') {
        Some((ns, rest)) if !ns.is_empty() && ns.chars().all(|c| c.is_ascii_alphanumeric()) => {
            (Some(Namespace::parse(ns)), rest)
        }
        _ => (None, head),
    }
}

fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    text.split(sep).collect()
}

fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2
        && ((bytes[0] == b'"' && bytes[bytes.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[bytes.len() - 1] == b'\''))
    {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_name() {
        let spec = parse_match_spec("numpy").unwrap();
        assert_eq!(spec.name.as_ref().unwrap().as_normalized(), "numpy");
        assert_eq!(spec.version, VersionSpec::None);
    }

    #[test]
    fn name_and_version_with_space() {
        let spec = parse_match_spec("numpy 1.7.*").unwrap();
        assert_eq!(spec.name.as_ref().unwrap().as_normalized(), "numpy");
        assert_eq!(spec.version, VersionSpec::parse("1.7.*").unwrap());
    }

    #[test]
    fn name_and_version_no_space() {
        let spec = parse_match_spec("numpy>=1.7,<1.9").unwrap();
        assert_eq!(spec.name.as_ref().unwrap().as_normalized(), "numpy");
        assert_eq!(spec.version, VersionSpec::parse(">=1.7,<1.9").unwrap());
    }

    #[test]
    fn qualified_namespace() {
        let spec = parse_match_spec("python:graphviz").unwrap();
        assert_eq!(spec.namespace, Some(Namespace::Python));
        assert_eq!(spec.name.as_ref().unwrap().as_normalized(), "graphviz");
    }

    #[test]
    fn bracket_fields() {
        let spec = parse_match_spec("numpy>=1.7,<1.9[build=*py27*,channel=main]").unwrap();
        assert_eq!(spec.name.as_ref().unwrap().as_normalized(), "numpy");
        assert_eq!(spec.version, VersionSpec::parse(">=1.7,<1.9").unwrap());
        assert!(spec.build.as_ref().unwrap().matches("cp27_py27_0"));
        assert_eq!(spec.channel.as_deref(), Some("main"));
    }

    #[test]
    fn bracket_fields_full_struct() {
        let spec = parse_match_spec("numpy[build=*py27*,channel=main]").unwrap();
        let expected = MatchSpec {
            name: Some(PackageName::new("numpy").unwrap()),
            build: Some("*py27*".parse().unwrap()),
            channel: Some("main".to_string()),
            ..MatchSpec::default()
        };
        similar_asserts::assert_eq!(spec, expected);
    }

    use rstest::rstest;

    #[rstest]
    #[case("numpy", "numpy", true)]
    #[case("numpy 1.7.*", "numpy", true)]
    #[case("python:graphviz", "graphviz", true)]
    #[case("numpy[bogus=1]", "numpy", false)]
    fn parse_table(#[case] source: &str, #[case] expected_name: &str, #[case] should_parse: bool) {
        match parse_match_spec(source) {
            Ok(spec) => {
                assert!(should_parse);
                assert_eq!(spec.name.as_ref().unwrap().as_normalized(), expected_name);
            }
            Err(_) => assert!(!should_parse),
        }
    }

    #[test]
    fn rejects_unknown_key() {
        assert!(parse_match_spec("numpy[bogus=1]").is_err());
    }

    #[test]
    fn rejects_unterminated_bracket() {
        assert!(parse_match_spec("numpy[build=1").is_err());
    }
}
