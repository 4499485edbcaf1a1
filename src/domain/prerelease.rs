//! Pre-release tag handling
//!
//! A pre-release tag is a textual label plus an optional trailing number,
//! e.g. `beta.12` -> name "beta", number 12.

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

use regex::Regex;
use std::sync::OnceLock;

fn label_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<name>.*?)\.?(?P<number>\d+)$").expect("static pre-release pattern")
    })
}

/// Pre-release label with an optional number
#[derive(Debug, Clone, Serialize)]
pub struct PreReleaseTag {
    /// The textual label (alpha, beta, a sanitized branch name, ...)
    pub name: String,
    /// Trailing number, incremented per pre-release
    pub number: Option<u64>,
}

impl PreReleaseTag {
    /// Create a new pre-release tag
    pub fn new(name: impl Into<String>, number: Option<u64>) -> Self {
        PreReleaseTag {
            name: name.into(),
            number,
        }
    }

    /// Split a pre-release suffix into name and number using the longest
    /// trailing run of digits.
    ///
    /// # Examples
    /// ```
    /// # use git_stamp::domain::PreReleaseTag;
    /// let tag = PreReleaseTag::parse("beta.12");
    /// assert_eq!(tag.name, "beta");
    /// assert_eq!(tag.number, Some(12));
    /// assert_eq!(PreReleaseTag::parse("beta").number, None);
    /// ```
    pub fn parse(s: &str) -> Self {
        match label_regex().captures(s) {
            Some(caps) => {
                let number = caps["number"].parse::<u64>().ok();
                match number {
                    Some(n) => PreReleaseTag::new(&caps["name"], Some(n)),
                    // Overflowing digit runs stay part of the name
                    None => PreReleaseTag::new(s, None),
                }
            }
            None => PreReleaseTag::new(s, None),
        }
    }

    /// Returns a copy with the number bumped by one (absent becomes 1,
    /// `u64::MAX` stays put)
    pub fn increment_number(&self) -> Self {
        PreReleaseTag {
            name: self.name.clone(),
            number: Some(self.number.map_or(1, |n| n.saturating_add(1))),
        }
    }

    /// Case-insensitive label comparison
    pub fn has_label(&self, label: &str) -> bool {
        self.name.eq_ignore_ascii_case(label)
    }

    /// Legacy rendering: `beta4`, or zero-padded `beta0004` when `pad` > 0
    pub fn legacy(&self, pad: usize) -> String {
        match self.number {
            Some(n) if pad > 0 => format!("{}{:0width$}", self.name, n, width = pad),
            Some(n) => format!("{}{}", self.name, n),
            None => self.name.clone(),
        }
    }
}

impl PartialEq for PreReleaseTag {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PreReleaseTag {}

impl PartialOrd for PreReleaseTag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PreReleaseTag {
    /// Name compares case-insensitively, then number with absent < present.
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .to_lowercase()
            .cmp(&other.name.to_lowercase())
            .then_with(|| self.number.cmp(&other.number))
    }
}

impl fmt::Display for PreReleaseTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.name.is_empty(), self.number) {
            (false, Some(n)) => write!(f, "{}.{}", self.name, n),
            (false, None) => write!(f, "{}", self.name),
            (true, Some(n)) => write!(f, "{}", n),
            (true, None) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_number() {
        let pr = PreReleaseTag::parse("beta.1");
        assert_eq!(pr.name, "beta");
        assert_eq!(pr.number, Some(1));
    }

    #[test]
    fn test_parse_without_dot() {
        let pr = PreReleaseTag::parse("beta0004");
        assert_eq!(pr.name, "beta");
        assert_eq!(pr.number, Some(4));
    }

    #[test]
    fn test_parse_no_number() {
        let pr = PreReleaseTag::parse("alpha");
        assert_eq!(pr.name, "alpha");
        assert_eq!(pr.number, None);
    }

    #[test]
    fn test_parse_dotted_label_keeps_inner_digits() {
        let pr = PreReleaseTag::parse("rc.1.2");
        assert_eq!(pr.name, "rc.1");
        assert_eq!(pr.number, Some(2));
    }

    #[test]
    fn test_parse_numeric_only() {
        let pr = PreReleaseTag::parse("7");
        assert_eq!(pr.name, "");
        assert_eq!(pr.number, Some(7));
        assert_eq!(pr.to_string(), "7");
    }

    #[test]
    fn test_increment_number() {
        assert_eq!(
            PreReleaseTag::parse("rc.99").increment_number().number,
            Some(100)
        );
        assert_eq!(
            PreReleaseTag::new("alpha", None).increment_number().number,
            Some(1)
        );
    }

    #[test]
    fn test_increment_number_saturates() {
        let tag = PreReleaseTag::parse("rc.18446744073709551615");
        assert_eq!(tag.number, Some(u64::MAX));
        assert_eq!(tag.increment_number().number, Some(u64::MAX));
    }

    #[test]
    fn test_ordering_is_case_insensitive() {
        assert_eq!(
            PreReleaseTag::parse("Beta.2"),
            PreReleaseTag::parse("beta.2")
        );
        assert!(PreReleaseTag::parse("alpha.9") < PreReleaseTag::parse("BETA.1"));
    }

    #[test]
    fn test_absent_number_sorts_first() {
        assert!(PreReleaseTag::parse("beta") < PreReleaseTag::parse("beta.1"));
        assert!(PreReleaseTag::parse("beta.2") < PreReleaseTag::parse("beta.10"));
    }

    #[test]
    fn test_legacy_rendering() {
        let pr = PreReleaseTag::parse("beta.4");
        assert_eq!(pr.legacy(0), "beta4");
        assert_eq!(pr.legacy(4), "beta0004");
    }
}
