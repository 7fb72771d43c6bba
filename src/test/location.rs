//! Source locations of compiled steps and test cases.

use derive_more::with_trait::Display;

/// Position in a source document where a [`Step`] or [`Case`] is defined.
///
/// Immutable value, used for backtraces and identity in tests.
///
/// [`Case`]: crate::test::Case
/// [`Step`]: crate::test::Step
#[derive(Clone, Debug, Display, Eq, Hash, PartialEq)]
#[display("{uri}:{line}")]
pub struct Location {
    /// Identity of the source document.
    pub uri: String,

    /// 1-based line number inside the document.
    pub line: u32,
}

impl Location {
    /// Creates a new [`Location`] at the given `uri` and `line`.
    #[must_use]
    pub fn new(uri: impl Into<String>, line: u32) -> Self {
        Self {
            uri: uri.into(),
            line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_as_uri_and_line() {
        let location = Location::new("features/f.feature", 10);
        assert_eq!(location.to_string(), "features/f.feature:10");
    }

    #[test]
    fn equality_covers_both_fields() {
        assert_eq!(Location::new("a", 1), Location::new("a", 1));
        assert_ne!(Location::new("a", 1), Location::new("a", 2));
        assert_ne!(Location::new("a", 1), Location::new("b", 1));
    }
}
