// src/feature/version.rs

//! Dotted-number feature versions
//!
//! Feature versions are plain dotted numbers ("1.0", "10.0.1") with no
//! epoch or release component. Whether a string parses as a version also
//! decides whether the trailing segment of a symbolic name is a version
//! suffix or just part of a hyphenated name.

use std::cmp::Ordering;
use std::fmt;

/// A validated dotted-number version
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeatureVersion {
    parts: Vec<u32>,
    text: String,
}

impl FeatureVersion {
    /// Parse a dotted-number version string
    ///
    /// Returns `None` when the string is not a version ("beta", "a.b", "").
    /// Examples:
    /// - "1.0" → Some
    /// - "10.0.1" → Some
    /// - "security" → None
    pub fn parse(s: &str) -> Option<Self> {
        if s.is_empty() {
            return None;
        }
        let mut parts = Vec::new();
        for piece in s.split('.') {
            if piece.is_empty() {
                return None;
            }
            parts.push(piece.parse::<u32>().ok()?);
        }
        Some(Self {
            parts,
            text: s.to_string(),
        })
    }

    /// The canonical version text as authored
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Numeric version components
    pub fn parts(&self) -> &[u32] {
        &self.parts
    }
}

impl fmt::Display for FeatureVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl Ord for FeatureVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.parts.cmp(&other.parts)
    }
}

impl PartialOrd for FeatureVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let v = FeatureVersion::parse("1.0").unwrap();
        assert_eq!(v.parts(), &[1, 0]);
        assert_eq!(v.text(), "1.0");
    }

    #[test]
    fn test_parse_three_components() {
        let v = FeatureVersion::parse("10.0.1").unwrap();
        assert_eq!(v.parts(), &[10, 0, 1]);
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert!(FeatureVersion::parse("beta").is_none());
        assert!(FeatureVersion::parse("1.b").is_none());
        assert!(FeatureVersion::parse("").is_none());
        assert!(FeatureVersion::parse("1..0").is_none());
    }

    #[test]
    fn test_numeric_ordering() {
        let v2 = FeatureVersion::parse("2.0").unwrap();
        let v10 = FeatureVersion::parse("10.0").unwrap();
        assert!(v2 < v10);
    }

    #[test]
    fn test_display_round_trip() {
        let v = FeatureVersion::parse("9.0").unwrap();
        assert_eq!(v.to_string(), "9.0");
    }
}
