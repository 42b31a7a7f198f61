//! A total order over version strings.
//!
//! Version strings are decomposed as `[epoch!]release[+local]`, with each
//! dot/underscore-delimited segment of `release` (and of `local`) split again
//! into alternating runs of digits and non-digits. Comparison proceeds
//! epoch first, then segment-by-segment through `release`, then through
//! `local`. Missing segments on either side compare as a single `0`
//! component, which is what makes `1.1` and `1.1.0` compare equal.
//!
//! Within a segment, a component that starts with a letter has an implicit
//! leading `0` inserted ahead of it, which is what keeps `1.1a1` and
//! `1.1.0a1` in phase with each other. The special tokens `dev` and `post`
//! are not ordered like other identifiers: `dev` sorts below every other
//! component (including a missing one), and `post` sorts above every other
//! component, matching a release/pre-release/post-release versioning
//! scheme.
//!
//! ```
//! use pkgsolver_types::Version;
//!
//! assert!(Version::parse("1.1").unwrap() == Version::parse("1.1.0").unwrap());
//! assert!(Version::parse("1.0a1").unwrap() < Version::parse("1.0").unwrap());
//! assert!(Version::parse("1.0.dev1").unwrap() < Version::parse("1.0a1").unwrap());
//! assert!(Version::parse("1.0.post1").unwrap() > Version::parse("1.0").unwrap());
//! assert!(Version::parse("1!0.1").unwrap() > Version::parse("9.9.9").unwrap());
//! ```

mod parse;

use std::{
    cmp::Ordering,
    fmt::{self, Display, Formatter},
};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;

pub use parse::ParseVersionError;

/// A single tokenized piece of a version segment.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub(crate) enum Component {
    /// The `dev` tag. Always orders below anything else, including a
    /// missing component.
    Dev,
    /// Any other alphabetic run (pre-release tags like `a`, `rc`, `alpha`,
    /// as well as arbitrary tags).
    Ident(Box<str>),
    /// A missing component, used only as the padding value when segments of
    /// differing length are compared against each other.
    Zero,
    /// A numeral run.
    Numeral(u64),
    /// The `post` tag. Always orders above anything else.
    Post,
}

impl Component {
    fn rank(&self) -> u8 {
        match self {
            Component::Dev => 0,
            Component::Ident(_) => 1,
            Component::Zero => 2,
            Component::Numeral(0) => 2,
            Component::Numeral(_) => 3,
            Component::Post => 4,
        }
    }
}

impl Ord for Component {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Component::Numeral(a), Component::Numeral(b)) => a.cmp(b),
            (Component::Numeral(0), Component::Zero) | (Component::Zero, Component::Numeral(0)) => {
                Ordering::Equal
            }
            (Component::Ident(a), Component::Ident(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Component {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A single `.`/`_`-delimited segment, already split into its alternating
/// digit/non-digit components.
type Segment = SmallVec<[Component; 4]>;

fn compare_segments(a: &Segment, b: &Segment) -> Ordering {
    let len = a.len().max(b.len());
    for i in 0..len {
        let ca = a.get(i).unwrap_or(&Component::Zero);
        let cb = b.get(i).unwrap_or(&Component::Zero);
        match ca.cmp(cb) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

fn compare_segment_lists(a: &[Segment], b: &[Segment]) -> Ordering {
    let len = a.len().max(b.len());
    let zero_segment: Segment = SmallVec::from_elem(Component::Zero, 1);
    for i in 0..len {
        let sa = a.get(i).unwrap_or(&zero_segment);
        let sb = b.get(i).unwrap_or(&zero_segment);
        match compare_segments(sa, sb) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// A parsed, comparable version string.
///
/// `Version` keeps the original source string (for `Display`) alongside the
/// tokenized form used for comparison. Two versions compare equal exactly
/// when their tokenized forms compare equal, even if their source strings
/// differ only in trailing-zero segments or case.
#[derive(Debug, Clone)]
pub struct Version {
    source: Box<str>,
    epoch: u64,
    release: SmallVec<[Segment; 4]>,
    local: SmallVec<[Segment; 2]>,
}

impl Version {
    /// Parses a version string.
    pub fn parse(source: &str) -> Result<Self, ParseVersionError> {
        parse::parse_version(source)
    }

    /// The original string this version was parsed from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether this version carries a non-zero epoch.
    pub fn has_epoch(&self) -> bool {
        self.epoch != 0
    }

    /// Whether this version carries a local segment (after `+`).
    pub fn has_local(&self) -> bool {
        !self.local.is_empty()
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| compare_segment_lists(&self.release, &other.release))
            .then_with(|| compare_segment_lists(&self.local, &other.local))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Version::parse(&source).map_err(de::Error::custom)
    }
}

impl std::hash::Hash for Version {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // Two versions that compare equal (e.g. "1.1" and "1.1.0") must hash
        // equal, so we hash the normalized release/local segments rather
        // than the source string.
        self.epoch.hash(state);
        for segment in &self.release {
            for component in segment {
                if !matches!(component, Component::Zero | Component::Numeral(0)) {
                    component.hash(state);
                }
            }
        }
        for segment in &self.local {
            for component in segment {
                component.hash(state);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_zero_segments_are_equal() {
        assert_eq!(Version::parse("1.1").unwrap(), Version::parse("1.1.0").unwrap());
        assert_eq!(Version::parse("1").unwrap(), Version::parse("1.0.0").unwrap());
    }

    #[test]
    fn basic_numeric_order() {
        assert!(Version::parse("1.0").unwrap() < Version::parse("1.1").unwrap());
        assert!(Version::parse("1.9").unwrap() < Version::parse("1.10").unwrap());
        assert!(Version::parse("2.0").unwrap() > Version::parse("1.99.99").unwrap());
    }

    #[test]
    fn pre_release_sorts_before_release() {
        assert!(Version::parse("1.0a1").unwrap() < Version::parse("1.0").unwrap());
        assert!(Version::parse("1.0b1").unwrap() > Version::parse("1.0a1").unwrap());
        assert!(Version::parse("1.0rc1").unwrap() < Version::parse("1.0").unwrap());
    }

    #[test]
    fn dev_sorts_before_everything_else() {
        assert!(Version::parse("1.0.dev1").unwrap() < Version::parse("1.0a1").unwrap());
        assert!(Version::parse("1.0.dev1").unwrap() < Version::parse("1.0").unwrap());
    }

    #[test]
    fn post_sorts_after_everything_else() {
        assert!(Version::parse("1.0.post1").unwrap() > Version::parse("1.0").unwrap());
        assert!(Version::parse("1.0.post1").unwrap() > Version::parse("1.0rc1").unwrap());
    }

    #[test]
    fn epoch_dominates() {
        assert!(Version::parse("1!0.1").unwrap() > Version::parse("9.9.9").unwrap());
        assert!(Version::parse("2!0.1").unwrap() > Version::parse("1!9.9.9").unwrap());
    }

    #[test]
    fn local_segment_is_lower_priority_than_release() {
        assert!(Version::parse("1.0").unwrap() < Version::parse("1.1").unwrap());
        assert!(Version::parse("1.0+abc").unwrap() > Version::parse("1.0").unwrap());
        assert!(Version::parse("1.0+abc").unwrap() < Version::parse("1.1").unwrap());
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(Version::parse("1.0RC1").unwrap(), Version::parse("1.0rc1").unwrap());
    }

    #[test]
    fn display_preserves_source() {
        assert_eq!(Version::parse("1.0.0").unwrap().to_string(), "1.0.0");
    }

    use rstest::rstest;

    #[rstest]
    #[case("1.0", "1.1", Ordering::Less)]
    #[case("1.9", "1.10", Ordering::Less)]
    #[case("1.0a1", "1.0", Ordering::Less)]
    #[case("1.0.dev1", "1.0a1", Ordering::Less)]
    #[case("1.0.post1", "1.0", Ordering::Greater)]
    #[case("1!0.1", "9.9.9", Ordering::Greater)]
    #[case("1.1", "1.1.0", Ordering::Equal)]
    fn ordering_table(#[case] a: &str, #[case] b: &str, #[case] expected: Ordering) {
        assert_eq!(Version::parse(a).unwrap().cmp(&Version::parse(b).unwrap()), expected);
    }
}
