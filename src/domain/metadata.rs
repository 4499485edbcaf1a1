//! Build metadata attached to a version. Never affects ordering.

use crate::domain::branch::sanitize_label;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Provenance data appended after `+` in a full version string
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildMetaData {
    /// Commits after the base version source, up to and including the current commit
    pub commits_since_source: Option<u64>,
    pub branch: String,
    pub sha: String,
    pub commit_date: Option<DateTime<Utc>>,
    /// Descriptions of base version candidates that lost the selection
    pub other_version_sources: Vec<String>,
    /// Unrecognised dot-separated metadata kept verbatim from a parsed version
    pub other_metadata: Option<String>,
}

impl BuildMetaData {
    /// Parse the text after `+`: `5`, `5.Branch.main.Sha.abc123`, or free-form
    pub fn parse(text: &str) -> Self {
        let mut meta = BuildMetaData::default();
        let mut rest: Vec<&str> = Vec::new();
        let mut parts = text.split('.').peekable();

        if let Some(first) = parts.peek() {
            if let Ok(n) = first.parse::<u64>() {
                meta.commits_since_source = Some(n);
                parts.next();
            }
        }

        while let Some(part) = parts.next() {
            match part {
                "Branch" => {
                    if let Some(branch) = parts.next() {
                        meta.branch = branch.to_string();
                    }
                }
                "Sha" => {
                    if let Some(sha) = parts.next() {
                        meta.sha = sha.to_string();
                    }
                }
                other => rest.push(other),
            }
        }

        if !rest.is_empty() {
            meta.other_metadata = Some(rest.join("."));
        }
        meta
    }

    /// The short form used in `FullSemVer`: the commit count only
    pub fn short(&self) -> Option<String> {
        self.commits_since_source.map(|n| n.to_string())
    }

    /// The informational form: `5.Branch.feature-x.Sha.0123abcd...`
    pub fn full(&self) -> String {
        let mut parts = Vec::new();
        if let Some(n) = self.commits_since_source {
            parts.push(n.to_string());
        }
        if !self.branch.is_empty() {
            parts.push(format!("Branch.{}", sanitize_label(&self.branch)));
        }
        if !self.sha.is_empty() {
            parts.push(format!("Sha.{}", self.sha));
        }
        if let Some(other) = &self.other_metadata {
            parts.push(other.clone());
        }
        parts.join(".")
    }
}

impl fmt::Display for BuildMetaData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_count_only() {
        let meta = BuildMetaData::parse("5");
        assert_eq!(meta.commits_since_source, Some(5));
        assert!(meta.other_metadata.is_none());
    }

    #[test]
    fn test_parse_full_form() {
        let meta = BuildMetaData::parse("3.Branch.develop.Sha.abc123");
        assert_eq!(meta.commits_since_source, Some(3));
        assert_eq!(meta.branch, "develop");
        assert_eq!(meta.sha, "abc123");
    }

    #[test]
    fn test_parse_free_form() {
        let meta = BuildMetaData::parse("build.42");
        assert_eq!(meta.commits_since_source, None);
        assert_eq!(meta.other_metadata.as_deref(), Some("build.42"));
    }

    #[test]
    fn test_full_escapes_branch() {
        let meta = BuildMetaData {
            commits_since_source: Some(2),
            branch: "feature/login".to_string(),
            sha: "deadbeef".to_string(),
            ..Default::default()
        };
        assert_eq!(meta.full(), "2.Branch.feature-login.Sha.deadbeef");
        assert_eq!(meta.short().as_deref(), Some("2"));
    }
}
