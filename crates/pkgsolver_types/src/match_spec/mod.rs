//! The predicate language used for dependency, constraint, and user-facing
//! requested specs alike: `numpy>=1.7,<1.9[build=*py27*,channel=main]`.

mod matcher;
mod parse;

use std::fmt::{self, Display, Formatter};

pub use matcher::StringMatcher;
pub use parse::ParseMatchSpecError;

use crate::build_spec::BuildNumberSpec;
use crate::{Namespace, PackageName, PackageRecord, VersionSpec};

/// A parsed match spec: every field defaults to "unconstrained", so an
/// empty `MatchSpec` matches every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchSpec {
    /// The package name to match, or `None` for "any name" (only sensible
    /// combined with other constraints, e.g. a bare `build_number` filter).
    pub name: Option<PackageName>,
    /// The namespace to match, or `None` for "any namespace".
    pub namespace: Option<Namespace>,
    /// The version predicate.
    pub version: VersionSpec,
    /// The build string predicate.
    pub build: Option<StringMatcher>,
    /// The build number predicate.
    pub build_number: Option<BuildNumberSpec>,
    /// Restricts matches to a single channel.
    pub channel: Option<String>,
    /// Restricts matches to a single platform subdirectory.
    pub subdir: Option<String>,
    /// Features that a matching record must supply.
    pub features: Vec<String>,
    /// Features that a matching record must track.
    pub track_features: Vec<String>,
}

impl MatchSpec {
    /// Parses a match spec from its textual form.
    pub fn parse(source: &str) -> Result<Self, ParseMatchSpecError> {
        parse::parse_match_spec(source)
    }

    /// A match spec that only constrains the package name (every other
    /// field left unconstrained).
    pub fn from_name(name: PackageName) -> Self {
        Self {
            name: Some(name),
            ..Self::default()
        }
    }

    /// The name this spec constrains to, if any. Most call sites key an
    /// index lookup off this before falling back to a full scan.
    pub fn name(&self) -> Option<&PackageName> {
        self.name.as_ref()
    }

    /// Returns whether `record` satisfies every constraint in this spec.
    pub fn matches(&self, record: &PackageRecord) -> bool {
        if let Some(name) = &self.name {
            if name != &record.name {
                return false;
            }
        }
        if let Some(namespace) = &self.namespace {
            if namespace != &record.namespace {
                return false;
            }
        }
        if !self.version.matches(&record.version) {
            return false;
        }
        if let Some(build) = &self.build {
            if !build.matches(&record.build_string) {
                return false;
            }
        }
        if let Some(build_number) = &self.build_number {
            if !build_number.matches(record.build_number) {
                return false;
            }
        }
        if let Some(channel) = &self.channel {
            if channel != &record.channel {
                return false;
            }
        }
        if let Some(subdir) = &self.subdir {
            if subdir != &record.subdir {
                return false;
            }
        }
        if !self.features.is_empty()
            && !self.features.iter().all(|f| record.features.iter().any(|rf| rf == f))
        {
            return false;
        }
        if !self.track_features.is_empty()
            && !self
                .track_features
                .iter()
                .all(|f| record.track_features.iter().any(|rf| rf == f))
        {
            return false;
        }
        true
    }
}

impl Display for MatchSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(namespace) = &self.namespace {
            write!(f, "{namespace}:")?;
        }
        match &self.name {
            Some(name) => write!(f, "{}", name.as_source())?,
            None => write!(f, "*")?,
        }
        if self.version != VersionSpec::None {
            write!(f, "{}", self.version)?;
        }

        let mut extras = Vec::new();
        if let Some(build) = &self.build {
            extras.push(format!("build={build}"));
        }
        if let Some(build_number) = &self.build_number {
            extras.push(format!("build_number={build_number}"));
        }
        if let Some(channel) = &self.channel {
            extras.push(format!("channel={channel}"));
        }
        if let Some(subdir) = &self.subdir {
            extras.push(format!("subdir={subdir}"));
        }
        if !self.features.is_empty() {
            extras.push(format!("features={}", self.features.join(" ")));
        }
        if !self.track_features.is_empty() {
            extras.push(format!("track_features={}", self.track_features.join(" ")));
        }
        if !extras.is_empty() {
            write!(f, "[{}]", extras.join(","))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn record(name: &str, version: &str, build_number: u64) -> PackageRecord {
        PackageRecord {
            name: PackageName::new_unchecked(name),
            version: crate::Version::parse(version).unwrap(),
            build_string: "0".to_string(),
            build_number,
            channel: "main".to_string(),
            subdir: "linux-64".to_string(),
            namespace: Namespace::Global,
            depends: Vec::new(),
            constrains: Vec::new(),
            features: Vec::new(),
            track_features: Vec::new(),
            timestamp: Some(Utc::now()),
        }
    }

    #[test]
    fn bare_name_matches_any_version() {
        let spec = MatchSpec::parse("numpy").unwrap();
        assert!(spec.matches(&record("numpy", "1.7.0", 0)));
        assert!(spec.matches(&record("numpy", "2.0.0", 0)));
        assert!(!spec.matches(&record("scipy", "1.7.0", 0)));
    }

    #[test]
    fn version_bound_excludes_out_of_range() {
        let spec = MatchSpec::parse("numpy>=1.7,<1.9").unwrap();
        assert!(spec.matches(&record("numpy", "1.8.0", 0)));
        assert!(!spec.matches(&record("numpy", "1.9.0", 0)));
    }

    #[test]
    fn build_number_bound() {
        let spec = MatchSpec::parse("numpy[build_number=>=2]").unwrap();
        assert!(spec.matches(&record("numpy", "1.7.0", 2)));
        assert!(!spec.matches(&record("numpy", "1.7.0", 1)));
    }

    #[test]
    fn display_round_trips_through_parse() {
        let spec = MatchSpec::parse("numpy>=1.7,<1.9[build=*py27*]").unwrap();
        let rendered = spec.to_string();
        let reparsed = MatchSpec::parse(&rendered).unwrap();
        assert_eq!(spec, reparsed);
    }
}
