// src/extractors/number.rs
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::utils::error::ExtractError;

/// Dot-separated hierarchical section identifier such as `7.1.2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SectionNumber {
    parts: Vec<u32>,
}

impl SectionNumber {
    /// Number of components; always at least 1.
    pub fn level(&self) -> usize {
        self.parts.len()
    }

    pub fn last(&self) -> u32 {
        // parts is never empty
        self.parts[self.parts.len() - 1]
    }

    fn with_last(&self, last: u32) -> Self {
        let mut parts = self.parts.clone();
        let idx = parts.len() - 1;
        parts[idx] = last;
        Self { parts }
    }

    /// Syntactic neighbours used to bracket a best-effort region when the
    /// number itself is missing from the index. Neither is checked for
    /// existence.
    ///
    /// * `next`: same prefix, last component + 2 (saturating)
    /// * `prev`: same prefix, last component - 1; a trailing 0 promotes to the
    ///   parent; single-component numbers are left unchanged
    pub fn fallback_range(&self) -> FallbackRange {
        let next = self.with_last(self.last().saturating_add(2));

        let prev = if self.level() > 1 {
            if self.last() > 0 {
                self.with_last(self.last() - 1)
            } else {
                Self { parts: self.parts[..self.level() - 1].to_vec() }
            }
        } else {
            self.clone()
        };

        FallbackRange { prev, next }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackRange {
    pub prev: SectionNumber,
    pub next: SectionNumber,
}

impl FromStr for SectionNumber {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ExtractError::InvalidSectionNumber(s.to_string()));
        }

        let parts = trimmed
            .split('.')
            .map(|part| part.parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| ExtractError::InvalidSectionNumber(s.to_string()))?;

        Ok(Self { parts })
    }
}

impl TryFrom<String> for SectionNumber {
    type Error = ExtractError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SectionNumber> for String {
    fn from(value: SectionNumber) -> Self {
        value.to_string()
    }
}

impl fmt::Display for SectionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", part)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(s: &str) -> SectionNumber {
        s.parse().unwrap()
    }

    #[test]
    fn parses_levels() {
        assert_eq!(n("7").level(), 1);
        assert_eq!(n("7.1.2").level(), 3);
        assert_eq!(n("7.1.2").last(), 2);
        assert_eq!(n(" 10.4 ").to_string(), "10.4");
    }

    #[test]
    fn rejects_malformed_numbers() {
        for bad in ["", "7.", ".1", "7.a", "7..1", "-1"] {
            assert!(bad.parse::<SectionNumber>().is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn fallback_range_arithmetic() {
        assert_eq!(n("7.1").fallback_range().next, n("7.3"));
        assert_eq!(n("7.1").fallback_range().prev, n("7.0"));
        assert_eq!(n("7.0").fallback_range().prev, n("7"));
        assert_eq!(n("7").fallback_range().prev, n("7"));
        assert_eq!(n("7").fallback_range().next, n("9"));
        assert_eq!(n("9.9").fallback_range().next, n("9.11"));
        assert_eq!(n("9.9").fallback_range().prev, n("9.8"));
    }

    #[test]
    fn fallback_range_saturates_at_u32_max() {
        let range = n("7.4294967295").fallback_range();
        assert_eq!(range.next, n("7.4294967295"));
        assert_eq!(range.prev, n("7.4294967294"));
        assert_eq!(n("4294967294").fallback_range().next, n("4294967295"));
    }

    #[test]
    fn deserializes_from_json_string() {
        let parsed: Vec<SectionNumber> = serde_json::from_str(r#"["7.1", "12"]"#).unwrap();
        assert_eq!(parsed, vec![n("7.1"), n("12")]);
        assert!(serde_json::from_str::<SectionNumber>(r#""x.1""#).is_err());
    }
}
