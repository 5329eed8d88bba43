use serde::Serialize;
use std::fmt;

/// A language guess with its confidence.
///
/// `confident` is false when several languages matched equally well; in that
/// case `primary` is the candidate the native library picked (it documents
/// "first in alphabetical order"), which the bridge passes through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Guess {
    /// Most likely language, empty when nothing matched
    pub primary: String,
    /// Whether the answer was unambiguous
    pub confident: bool,
}

impl Guess {
    pub fn new(primary: impl Into<String>, confident: bool) -> Self {
        Self {
            primary: primary.into(),
            confident,
        }
    }

    /// No language matched
    pub fn is_unknown(&self) -> bool {
        self.primary.is_empty()
    }
}

impl fmt::Display for Guess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.confident {
            write!(f, "{}", self.primary)
        } else {
            write!(f, "{} (ambiguous)", self.primary)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Guess::new("Go", true).to_string(), "Go");
        assert_eq!(Guess::new("C", false).to_string(), "C (ambiguous)");
    }

    #[test]
    fn test_unknown() {
        assert!(Guess::new("", false).is_unknown());
        assert!(!Guess::new("Rust", true).is_unknown());
    }

    #[test]
    fn test_serializes_fields() {
        let json = serde_json::to_string(&Guess::new("Python", true)).unwrap();
        assert_eq!(json, r#"{"primary":"Python","confident":true}"#);
    }
}
