//! Matches a string either exactly or via a glob pattern.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::version_spec::InvalidGlobError;

/// Matches a build string (or other free-form text field) either by exact
/// value or by glob (`*` = any run of characters).
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum StringMatcher {
    /// An exact string match.
    Exact(String),
    /// A glob pattern containing at least one `*`.
    Glob(glob::Pattern),
}

impl StringMatcher {
    /// Returns whether `text` satisfies this matcher.
    pub fn matches(&self, text: &str) -> bool {
        match self {
            StringMatcher::Exact(expected) => expected == text,
            StringMatcher::Glob(pattern) => pattern.matches(text),
        }
    }
}

impl FromStr for StringMatcher {
    type Err = InvalidGlobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s.contains('*') {
            StringMatcher::Glob(glob::Pattern::new(s).map_err(|_| InvalidGlobError(s.to_string()))?)
        } else {
            StringMatcher::Exact(s.to_string())
        })
    }
}

impl Display for StringMatcher {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            StringMatcher::Exact(s) => write!(f, "{s}"),
            StringMatcher::Glob(pattern) => write!(f, "{}", pattern.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact() {
        let m: StringMatcher = "py27_0".parse().unwrap();
        assert!(m.matches("py27_0"));
        assert!(!m.matches("py37_0"));
    }

    #[test]
    fn glob() {
        let m: StringMatcher = "*py27*".parse().unwrap();
        assert!(m.matches("cp27mu_py27_0"));
        assert!(!m.matches("py37_0"));
    }
}
