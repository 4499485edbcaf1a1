//! Recognising merge commit messages from the common hosting conventions.

use crate::domain::branch::{friendly_name, version_from_branch_name};
use crate::domain::SemanticVersion;
use crate::error::{GitStampError, Result};
use indexmap::IndexMap;
use regex::Regex;

/// Built-in formats, tried in this order after any configured ones
pub const DEFAULT_FORMATS: &[(&str, &str)] = &[
    (
        "Default",
        r"^Merge (?:branch|tag) '(?P<SourceBranch>[^']*)'(?: into (?P<TargetBranch>[^\s]*))*",
    ),
    (
        "SmartGit",
        r"^Finish (?P<SourceBranch>[^\s]*)(?: into (?P<TargetBranch>[^\s]*))*",
    ),
    (
        "BitBucketPull",
        r"^Merge pull request #(?P<PullRequestNumber>\d+) (?:from|in) (?P<Source>.*) from (?P<SourceBranch>[^\s]*) to (?P<TargetBranch>[^\s]*)",
    ),
    (
        "BitBucketPullv7",
        r"^Pull request #(?P<PullRequestNumber>\d+).*\r?\n\r?\nMerge in (?P<Source>.*) from (?P<SourceBranch>[^\s]*) to (?P<TargetBranch>[^\s]*)",
    ),
    (
        "BitBucketCloudPull",
        r"^Merged in (?P<SourceBranch>[^\s]*) \(pull request #(?P<PullRequestNumber>\d+)\)",
    ),
    (
        "GitHubPull",
        r"^Merge pull request #(?P<PullRequestNumber>\d+) (?:from|in) (?:[^\s/]+/)?(?P<SourceBranch>[^\s]*)(?: into (?P<TargetBranch>[^\s]*))*",
    ),
    (
        "RemoteTracking",
        r"^Merge remote-tracking branch '(?P<SourceBranch>[^\s]*)'(?: into (?P<TargetBranch>[^\s]*))*",
    ),
    (
        "AzureDevOpsPull",
        r"^Merged PR (?P<PullRequestNumber>\d+): Merge (?P<SourceBranch>[^\s]*) to (?P<TargetBranch>[^\s]*)",
    ),
];

/// A named merge message pattern with `SourceBranch`, `TargetBranch` and
/// `PullRequestNumber` capture groups (all optional)
#[derive(Debug, Clone)]
pub struct MergeMessageFormat {
    pub name: String,
    regex: Regex,
}

impl MergeMessageFormat {
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| GitStampError::pattern(pattern, e))?;
        Ok(MergeMessageFormat {
            name: name.into(),
            regex,
        })
    }
}

/// Configured formats first, built-ins after
pub fn compile_formats(custom: &IndexMap<String, String>) -> Result<Vec<MergeMessageFormat>> {
    custom
        .iter()
        .map(|(name, pattern)| (name.as_str(), pattern.as_str()))
        .chain(DEFAULT_FORMATS.iter().copied())
        .map(|(name, pattern)| MergeMessageFormat::new(name, pattern))
        .collect()
}

/// What a merge commit message says about the merge
#[derive(Debug, Clone, PartialEq)]
pub struct MergeMessage {
    pub format_name: String,
    pub merged_branch: String,
    pub target_branch: Option<String>,
    pub pull_request_number: Option<u64>,
    /// Version literal embedded in the merged branch name, if any
    pub version: Option<SemanticVersion>,
}

impl MergeMessage {
    /// Match `message` against `formats` in order; the first match wins.
    pub fn parse(message: &str, formats: &[MergeMessageFormat], prefix: &Regex) -> Option<Self> {
        formats.iter().find_map(|format| {
            let caps = format.regex.captures(message)?;
            let merged_branch = friendly_name(caps.name("SourceBranch")?.as_str());
            if merged_branch.is_empty() {
                return None;
            }

            let version = version_from_branch_name(&merged_branch, prefix);
            Some(MergeMessage {
                format_name: format.name.clone(),
                target_branch: caps
                    .name("TargetBranch")
                    .map(|m| friendly_name(m.as_str())),
                pull_request_number: caps
                    .name("PullRequestNumber")
                    .and_then(|m| m.as_str().parse().ok()),
                version,
                merged_branch,
            })
        })
    }

    pub fn is_merged_pull_request(&self) -> bool {
        self.pull_request_number.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(message: &str) -> Option<MergeMessage> {
        let formats = compile_formats(&IndexMap::new()).unwrap();
        MergeMessage::parse(message, &formats, &Regex::new("^(?:[vV]?)").unwrap())
    }

    #[test]
    fn test_github_pull_request() {
        let merge = parse("Merge pull request #42 from org/feature-foo into develop").unwrap();
        assert_eq!(merge.format_name, "GitHubPull");
        assert_eq!(merge.merged_branch, "feature-foo");
        assert_eq!(merge.target_branch.as_deref(), Some("develop"));
        assert_eq!(merge.pull_request_number, Some(42));
        assert!(merge.version.is_none());
        assert!(merge.is_merged_pull_request());
    }

    #[test]
    fn test_default_merge_with_version() {
        let merge = parse("Merge branch 'release/2.0.0' into main").unwrap();
        assert_eq!(merge.format_name, "Default");
        assert_eq!(merge.merged_branch, "release/2.0.0");
        assert_eq!(merge.version, Some(SemanticVersion::new(2, 0, 0)));
        assert!(!merge.is_merged_pull_request());
    }

    #[test]
    fn test_smartgit_finish() {
        let merge = parse("Finish feature/login").unwrap();
        assert_eq!(merge.format_name, "SmartGit");
        assert_eq!(merge.merged_branch, "feature/login");
    }

    #[test]
    fn test_bitbucket_before_github() {
        let merge =
            parse("Merge pull request #7 from ~user/repo from hotfix/1.0.1 to main").unwrap();
        assert_eq!(merge.format_name, "BitBucketPull");
        assert_eq!(merge.merged_branch, "hotfix/1.0.1");
        assert_eq!(merge.version, Some(SemanticVersion::new(1, 0, 1)));
    }

    #[test]
    fn test_bitbucket_cloud() {
        let merge = parse("Merged in feature/x (pull request #12)").unwrap();
        assert_eq!(merge.pull_request_number, Some(12));
        assert_eq!(merge.merged_branch, "feature/x");
    }

    #[test]
    fn test_remote_tracking_strips_remote() {
        let merge = parse("Merge remote-tracking branch 'origin/release/1.4.0'").unwrap();
        assert_eq!(merge.merged_branch, "release/1.4.0");
    }

    #[test]
    fn test_azure_devops() {
        let merge = parse("Merged PR 123: Merge refs/heads/feature/y to refs/heads/main").unwrap();
        assert_eq!(merge.merged_branch, "feature/y");
        assert_eq!(merge.target_branch.as_deref(), Some("main"));
    }

    #[test]
    fn test_custom_format_takes_precedence() {
        let mut custom = IndexMap::new();
        custom.insert(
            "Jira".to_string(),
            r"^Merge branch '(?P<SourceBranch>[^']*)' \[JIRA\]".to_string(),
        );
        let formats = compile_formats(&custom).unwrap();
        let merge = MergeMessage::parse(
            "Merge branch 'feature/a' [JIRA]",
            &formats,
            &Regex::new("^(?:[vV]?)").unwrap(),
        )
        .unwrap();
        assert_eq!(merge.format_name, "Jira");
    }

    #[test]
    fn test_plain_commit_does_not_match() {
        assert!(parse("Fix the build").is_none());
    }
}
