use crate::config::GitStampConfig;
use crate::domain::VersionField;
use crate::error::{GitStampError, Result};
use regex::{Regex, RegexBuilder};
use std::sync::OnceLock;

fn conventional_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<type>[a-z]+)(?:\((?P<scope>[^)]+)\))?(?P<bang>!?):\s*(?P<desc>.*)")
            .expect("static conventional commit pattern")
    })
}

/// Parsed header of a conventional commit message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommit {
    pub r#type: String,
    pub scope: Option<String>,
    pub description: String,
    pub is_breaking_change: bool,
}

impl ParsedCommit {
    /// Parse a commit message according to the conventional commits format.
    /// Supports:
    /// - type(scope)!: description
    /// - type(scope): description
    /// - type!: description
    /// - type: description
    ///
    /// Returns `None` for anything else.
    pub fn parse(message: &str) -> Option<Self> {
        let header = message.lines().next().unwrap_or_default();
        let caps = conventional_regex().captures(header)?;

        let is_breaking_change = &caps["bang"] == "!"
            || message.contains("BREAKING CHANGE:")
            || message.contains("BREAKING-CHANGE:");

        Some(ParsedCommit {
            r#type: caps["type"].to_string(),
            scope: caps.name("scope").map(|m| m.as_str().to_string()),
            description: caps["desc"].to_string(),
            is_breaking_change,
        })
    }

    /// The increment this commit implies, if any
    pub fn implied_increment(&self) -> Option<VersionField> {
        if self.is_breaking_change {
            return Some(VersionField::Major);
        }
        match self.r#type.as_str() {
            "feat" | "feature" => Some(VersionField::Minor),
            "fix" | "perf" => Some(VersionField::Patch),
            _ => None,
        }
    }
}

/// Compiled commit-message increment override markers
#[derive(Debug, Clone)]
pub struct IncrementMarkers {
    major: Regex,
    minor: Regex,
    patch: Regex,
    no_bump: Regex,
    conventional: bool,
}

fn case_insensitive(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .multi_line(true)
        .build()
        .map_err(|e| GitStampError::pattern(pattern, e))
}

impl IncrementMarkers {
    /// Compile the marker patterns from the global configuration
    pub fn from_config(config: &GitStampConfig) -> Result<Self> {
        Ok(IncrementMarkers {
            major: case_insensitive(&config.major_version_bump_message)?,
            minor: case_insensitive(&config.minor_version_bump_message)?,
            patch: case_insensitive(&config.patch_version_bump_message)?,
            no_bump: case_insensitive(&config.no_bump_message)?,
            conventional: config.conventional_commits,
        })
    }

    /// Find the override a commit message asks for.
    ///
    /// Explicit markers are checked from the largest increment down, so
    /// `+semver: major` beats `+semver: none` in the same message.
    /// `Some(VersionField::None)` means "do not bump".
    pub fn find(&self, message: &str) -> Option<VersionField> {
        if self.major.is_match(message) {
            return Some(VersionField::Major);
        }
        if self.minor.is_match(message) {
            return Some(VersionField::Minor);
        }
        if self.patch.is_match(message) {
            return Some(VersionField::Patch);
        }
        if self.no_bump.is_match(message) {
            return Some(VersionField::None);
        }
        if self.conventional {
            return ParsedCommit::parse(message).and_then(|c| c.implied_increment());
        }
        None
    }
}
