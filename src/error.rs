use thiserror::Error;

/// Unified error type for git-stamp operations
#[derive(Error, Debug)]
pub enum GitStampError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Configuration error for branch '{branch}': {reason}")]
    Configuration { branch: String, reason: String },

    #[error("Version parsing error: {0}")]
    Parse(String),

    #[error("Unexpected branch topology for '{branch}': {message}")]
    GraphIntegrity { branch: String, message: String },

    #[error("Ambiguous {subject}; candidates: {}", .candidates.join(", "))]
    Ambiguity {
        subject: String,
        candidates: Vec<String>,
    },

    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Branch error: {0}")]
    Branch(String),

    #[error("Failed to parse configuration file: {0}")]
    ConfigFile(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Version calculation was cancelled")]
    Cancelled,
}

/// Convenience type alias for Results in git-stamp
pub type Result<T> = std::result::Result<T, GitStampError>;

impl GitStampError {
    /// Create a configuration error naming the offending branch
    pub fn config(branch: impl Into<String>, reason: impl Into<String>) -> Self {
        GitStampError::Configuration {
            branch: branch.into(),
            reason: reason.into(),
        }
    }

    /// Create a version parsing error
    pub fn parse(msg: impl Into<String>) -> Self {
        GitStampError::Parse(msg.into())
    }

    /// Create a graph integrity error with a hint about the expected topology
    pub fn graph(branch: impl Into<String>, message: impl Into<String>) -> Self {
        GitStampError::GraphIntegrity {
            branch: branch.into(),
            message: message.into(),
        }
    }

    /// Create an ambiguity error listing every competing candidate
    pub fn ambiguity<I, S>(subject: impl Into<String>, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        GitStampError::Ambiguity {
            subject: subject.into(),
            candidates: candidates.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a branch lookup error
    pub fn branch(msg: impl Into<String>) -> Self {
        GitStampError::Branch(msg.into())
    }

    /// Wrap a regex compilation failure with the offending pattern
    pub fn pattern(pattern: impl Into<String>, source: regex::Error) -> Self {
        GitStampError::InvalidPattern {
            pattern: pattern.into(),
            source,
        }
    }

    /// Parse errors are recovered locally by the strategy that hit them;
    /// everything else aborts the calculation.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, GitStampError::Parse(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_names_branch() {
        let err = GitStampError::config("release/2.0.0", "label template is empty");
        assert_eq!(
            err.to_string(),
            "Configuration error for branch 'release/2.0.0': label template is empty"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: GitStampError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_ambiguity_lists_candidates() {
        let err = GitStampError::ambiguity(
            "current branch for commit abc1234",
            ["feature/a", "feature/b"],
        );
        let msg = err.to_string();
        assert!(msg.contains("feature/a"));
        assert!(msg.contains("feature/b"));
        assert!(msg.starts_with("Ambiguous current branch"));
    }

    #[test]
    fn test_graph_error_message() {
        let err = GitStampError::graph("hotfix/1.0.1", "no common ancestor with 'main'");
        let msg = err.to_string();
        assert!(msg.contains("hotfix/1.0.1"));
        assert!(msg.contains("no common ancestor"));
    }

    #[test]
    fn test_only_parse_errors_are_recoverable() {
        assert!(!GitStampError::parse("bad").is_fatal());
        assert!(GitStampError::config("main", "x").is_fatal());
        assert!(GitStampError::graph("main", "x").is_fatal());
        assert!(GitStampError::ambiguity("x", ["a"]).is_fatal());
        assert!(GitStampError::Cancelled.is_fatal());
    }

    #[test]
    fn test_invalid_pattern_keeps_source() {
        let source = regex::Regex::new("(unclosed").unwrap_err();
        let err = GitStampError::pattern("(unclosed", source);
        assert!(err.to_string().contains("(unclosed"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_error_messages_are_descriptive() {
        let error_pairs = vec![
            (GitStampError::parse("x"), "Version parsing error"),
            (GitStampError::branch("x"), "Branch error"),
            (GitStampError::Cancelled, "Version calculation was cancelled"),
        ];

        for (err, expected_prefix) in error_pairs {
            let msg = err.to_string();
            assert!(
                msg.starts_with(expected_prefix),
                "Error message should start with '{}', but got '{}'",
                expected_prefix,
                msg
            );
        }
    }
}
