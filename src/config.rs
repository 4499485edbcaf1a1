use crate::domain::merge_message::compile_formats;
use crate::domain::{IncrementMarkers, VersionField};
use crate::error::{GitStampError, Result};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up in the repository root and the user config directory
pub const CONFIG_FILE_NAME: &str = "gitstamp.toml";

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "GITSTAMP_CONFIG";

/// Branch type used when no configured pattern matches
pub const UNKNOWN_BRANCH_TYPE: &str = "unknown";

/// How pre-release labels and numbers are derived for a branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeploymentMode {
    /// Every build is a release candidate: `1.2.1-ci.3`
    #[default]
    ContinuousDelivery,
    /// Builds on unlabelled branches are stable releases
    ContinuousDeployment,
    /// Walk the whole trunk history applying mainline rules
    TrunkBased,
}

/// Which commit messages may override the configured increment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CommitMessageIncrementMode {
    #[default]
    Enabled,
    Disabled,
    /// Only merge commits are inspected
    MergeMessageOnly,
}

/// Increment strategy configured for a branch type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncrementStrategy {
    None,
    Patch,
    Minor,
    Major,
    /// Take the strategy of the nearest ancestor branch
    Inherit,
}

impl IncrementStrategy {
    /// The concrete field, or `None` for `Inherit`
    pub fn field(self) -> Option<VersionField> {
        match self {
            IncrementStrategy::None => Some(VersionField::None),
            IncrementStrategy::Patch => Some(VersionField::Patch),
            IncrementStrategy::Minor => Some(VersionField::Minor),
            IncrementStrategy::Major => Some(VersionField::Major),
            IncrementStrategy::Inherit => None,
        }
    }
}

impl From<VersionField> for IncrementStrategy {
    fn from(field: VersionField) -> Self {
        match field {
            VersionField::None => IncrementStrategy::None,
            VersionField::Patch => IncrementStrategy::Patch,
            VersionField::Minor => IncrementStrategy::Minor,
            VersionField::Major => IncrementStrategy::Major,
        }
    }
}

/// A policy fragment for one branch type.
///
/// Every field is optional; unset fields fall through to the defaults when
/// fragments are merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchConfig {
    pub regex: Option<String>,
    pub increment: Option<IncrementStrategy>,
    /// Pre-release label template; may contain `{BranchName}` and `{Number}`
    pub label: Option<String>,
    pub mode: Option<DeploymentMode>,
    pub is_main_branch: Option<bool>,
    pub is_release_branch: Option<bool>,
    pub tracks_release_branches: Option<bool>,
    /// Branch type names this branch is created from
    pub source_branches: Option<Vec<String>>,
    pub prevent_increment_if_current_commit_tagged: Option<bool>,
    pub prevent_increment_of_merged_branch_version: Option<bool>,
    pub label_number_pattern: Option<String>,
    pub track_merge_target: Option<bool>,
    pub commit_message_incrementing: Option<CommitMessageIncrementMode>,
}

impl BranchConfig {
    /// Overlay `other` on top of `self`: fields set in `other` win
    pub fn merge(&self, other: &BranchConfig) -> BranchConfig {
        BranchConfig {
            regex: other.regex.clone().or_else(|| self.regex.clone()),
            increment: other.increment.or(self.increment),
            label: other.label.clone().or_else(|| self.label.clone()),
            mode: other.mode.or(self.mode),
            is_main_branch: other.is_main_branch.or(self.is_main_branch),
            is_release_branch: other.is_release_branch.or(self.is_release_branch),
            tracks_release_branches: other
                .tracks_release_branches
                .or(self.tracks_release_branches),
            source_branches: other
                .source_branches
                .clone()
                .or_else(|| self.source_branches.clone()),
            prevent_increment_if_current_commit_tagged: other
                .prevent_increment_if_current_commit_tagged
                .or(self.prevent_increment_if_current_commit_tagged),
            prevent_increment_of_merged_branch_version: other
                .prevent_increment_of_merged_branch_version
                .or(self.prevent_increment_of_merged_branch_version),
            label_number_pattern: other
                .label_number_pattern
                .clone()
                .or_else(|| self.label_number_pattern.clone()),
            track_merge_target: other.track_merge_target.or(self.track_merge_target),
            commit_message_incrementing: other
                .commit_message_incrementing
                .or(self.commit_message_incrementing),
        }
    }
}

/// Global defaults every branch type is merged over
pub fn default_branch_config() -> BranchConfig {
    BranchConfig {
        regex: None,
        increment: Some(IncrementStrategy::Inherit),
        label: Some("{BranchName}".to_string()),
        mode: None,
        is_main_branch: Some(false),
        is_release_branch: Some(false),
        tracks_release_branches: Some(false),
        source_branches: Some(Vec::new()),
        prevent_increment_if_current_commit_tagged: Some(true),
        prevent_increment_of_merged_branch_version: Some(false),
        label_number_pattern: Some(r"[/-](?P<number>\d+)".to_string()),
        track_merge_target: Some(false),
        commit_message_incrementing: None,
    }
}

/// Fragment applied to branches no configured pattern matches
pub fn unknown_branch_config() -> BranchConfig {
    BranchConfig {
        regex: Some("(?P<BranchName>.+)".to_string()),
        increment: Some(IncrementStrategy::Patch),
        label: Some("{BranchName}".to_string()),
        source_branches: Some(vec!["main".to_string(), "develop".to_string()]),
        ..Default::default()
    }
}

fn strings(items: &[&str]) -> Option<Vec<String>> {
    Some(items.iter().map(|s| s.to_string()).collect())
}

/// Built-in branch types in match order
pub fn default_branches() -> IndexMap<String, BranchConfig> {
    let mut branches = IndexMap::new();
    branches.insert(
        "main".to_string(),
        BranchConfig {
            regex: Some("^master$|^main$".to_string()),
            increment: Some(IncrementStrategy::Patch),
            label: Some(String::new()),
            is_main_branch: Some(true),
            prevent_increment_of_merged_branch_version: Some(true),
            source_branches: strings(&["develop", "release"]),
            ..Default::default()
        },
    );
    branches.insert(
        "develop".to_string(),
        BranchConfig {
            regex: Some("^dev(elop)?(ment)?$".to_string()),
            increment: Some(IncrementStrategy::Minor),
            label: Some("alpha".to_string()),
            tracks_release_branches: Some(true),
            track_merge_target: Some(true),
            source_branches: strings(&["main"]),
            ..Default::default()
        },
    );
    branches.insert(
        "release".to_string(),
        BranchConfig {
            regex: Some("^releases?[/-](?P<BranchName>.+)".to_string()),
            increment: Some(IncrementStrategy::None),
            label: Some("beta".to_string()),
            is_release_branch: Some(true),
            source_branches: strings(&["main", "develop", "support", "release"]),
            ..Default::default()
        },
    );
    branches.insert(
        "feature".to_string(),
        BranchConfig {
            regex: Some("^features?[/-](?P<BranchName>.+)".to_string()),
            increment: Some(IncrementStrategy::Minor),
            label: Some("{BranchName}".to_string()),
            source_branches: strings(&["main", "develop", "release", "feature", "support", "hotfix"]),
            ..Default::default()
        },
    );
    branches.insert(
        "pull-request".to_string(),
        BranchConfig {
            regex: Some("^(pull|pull-requests|pr)[/-]".to_string()),
            increment: Some(IncrementStrategy::Inherit),
            label: Some("PullRequest{Number}".to_string()),
            label_number_pattern: Some(r"[/-](?P<number>\d+)".to_string()),
            source_branches: strings(&["main", "develop", "release", "feature", "support", "hotfix"]),
            ..Default::default()
        },
    );
    branches.insert(
        "hotfix".to_string(),
        BranchConfig {
            regex: Some("^hotfix(es)?[/-](?P<BranchName>.+)".to_string()),
            increment: Some(IncrementStrategy::Patch),
            label: Some("beta".to_string()),
            is_release_branch: Some(true),
            source_branches: strings(&["main", "support"]),
            ..Default::default()
        },
    );
    branches.insert(
        "support".to_string(),
        BranchConfig {
            regex: Some("^support[/-](?P<BranchName>.+)".to_string()),
            increment: Some(IncrementStrategy::Patch),
            label: Some(String::new()),
            is_main_branch: Some(true),
            source_branches: strings(&["main"]),
            ..Default::default()
        },
    );
    branches
}

fn default_tag_prefix() -> String {
    "[vV]?".to_string()
}

fn default_major_message() -> String {
    r"\+semver:\s?(breaking|major)".to_string()
}

fn default_minor_message() -> String {
    r"\+semver:\s?(feature|minor)".to_string()
}

fn default_patch_message() -> String {
    r"\+semver:\s?(fix|patch)".to_string()
}

fn default_no_bump_message() -> String {
    r"\+semver:\s?(none|skip)".to_string()
}

fn default_fallback_label() -> String {
    "ci".to_string()
}

fn default_padding() -> usize {
    4
}

/// Complete configuration for git-stamp.
///
/// `branch_defaults` and `branches` hold user fragments only; use
/// [`GitStampConfig::branch_types`] and [`GitStampConfig::global_branch_defaults`]
/// for the values merged over the built-ins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitStampConfig {
    pub mode: DeploymentMode,

    /// Regex stripped from the start of tag names before parsing
    pub tag_prefix: String,

    /// Explicit version the next release should carry
    pub next_version: Option<String>,

    pub major_version_bump_message: String,
    pub minor_version_bump_message: String,
    pub patch_version_bump_message: String,
    pub no_bump_message: String,

    pub commit_message_incrementing: CommitMessageIncrementMode,

    /// Also treat conventional commit headers as increment markers
    pub conventional_commits: bool,

    pub continuous_delivery_fallback_label: String,

    pub legacy_semver_padding: usize,

    /// Named merge message patterns tried before the built-in formats
    pub merge_message_formats: IndexMap<String, String>,

    pub branch_defaults: BranchConfig,

    pub branches: IndexMap<String, BranchConfig>,
}

impl Default for GitStampConfig {
    fn default() -> Self {
        GitStampConfig {
            mode: DeploymentMode::default(),
            tag_prefix: default_tag_prefix(),
            next_version: None,
            major_version_bump_message: default_major_message(),
            minor_version_bump_message: default_minor_message(),
            patch_version_bump_message: default_patch_message(),
            no_bump_message: default_no_bump_message(),
            commit_message_incrementing: CommitMessageIncrementMode::default(),
            conventional_commits: false,
            continuous_delivery_fallback_label: default_fallback_label(),
            legacy_semver_padding: default_padding(),
            merge_message_formats: IndexMap::new(),
            branch_defaults: BranchConfig::default(),
            branches: IndexMap::new(),
        }
    }
}

impl GitStampConfig {
    /// Built-in defaults with the user's `branch_defaults` overlaid
    pub fn global_branch_defaults(&self) -> BranchConfig {
        default_branch_config().merge(&self.branch_defaults)
    }

    /// Branch types in match order: built-ins (with user overrides merged in)
    /// followed by user-defined types
    pub fn branch_types(&self) -> IndexMap<String, BranchConfig> {
        let mut types = default_branches();
        for (name, fragment) in &self.branches {
            let merged = match types.get(name) {
                Some(builtin) => builtin.merge(fragment),
                None => fragment.clone(),
            };
            types.insert(name.clone(), merged);
        }
        types
    }

    /// The configuration with every fragment merged, as the engine sees it
    pub fn resolved(&self) -> GitStampConfig {
        GitStampConfig {
            branch_defaults: self.global_branch_defaults(),
            branches: self.branch_types(),
            ..self.clone()
        }
    }

    /// The tag prefix compiled and anchored at the start of the text
    pub fn tag_prefix_regex(&self) -> Result<Regex> {
        let pattern = format!("^(?:{})", self.tag_prefix);
        Regex::new(&pattern).map_err(|e| GitStampError::pattern(pattern, e))
    }

    /// Compile every configured pattern so mistakes surface before any
    /// repository access
    pub fn validate(&self) -> Result<()> {
        self.tag_prefix_regex()?;
        IncrementMarkers::from_config(self)?;
        compile_formats(&self.merge_message_formats)?;

        let defaults = self.global_branch_defaults();
        for (name, fragment) in self.branch_types() {
            let regex = fragment.regex.as_deref().ok_or_else(|| {
                GitStampError::config(&name, "branch type has no regex")
            })?;
            Regex::new(regex).map_err(|e| GitStampError::pattern(regex, e))?;

            let merged = defaults.merge(&fragment);
            if let Some(pattern) = merged.label_number_pattern.as_deref() {
                Regex::new(pattern).map_err(|e| GitStampError::pattern(pattern, e))?;
            }
        }
        Ok(())
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Explicit path provided as parameter
/// 2. The file named by `GITSTAMP_CONFIG`
/// 3. `gitstamp.toml` in the repository directory
/// 4. `gitstamp.toml` in the user config directory
/// 5. Default configuration if no file found
///
/// A file that exists but cannot be read or parsed is an error.
pub fn load_config(explicit_path: Option<&Path>, repo_dir: Option<&Path>) -> Result<GitStampConfig> {
    let path = match explicit_path {
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file(repo_dir),
    };

    let Some(path) = path else {
        tracing::debug!("No configuration file found, using defaults");
        return Ok(GitStampConfig::default());
    };

    tracing::debug!(path = %path.display(), "Loading configuration");
    let content = fs::read_to_string(&path)?;
    let config: GitStampConfig = toml::from_str(&content)?;
    Ok(config)
}

fn find_config_file(repo_dir: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(path));
    }

    let repo_file = repo_dir.map(|dir| dir.join(CONFIG_FILE_NAME));
    let user_file = dirs::config_dir().map(|dir| dir.join(CONFIG_FILE_NAME));

    repo_file.into_iter().chain(user_file).find(|p| p.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_prefers_overlay_fields() {
        let base = BranchConfig {
            increment: Some(IncrementStrategy::Patch),
            label: Some("alpha".to_string()),
            ..Default::default()
        };
        let overlay = BranchConfig {
            label: Some("beta".to_string()),
            ..Default::default()
        };
        let merged = base.merge(&overlay);
        assert_eq!(merged.increment, Some(IncrementStrategy::Patch));
        assert_eq!(merged.label.as_deref(), Some("beta"));
    }

    #[test]
    fn test_builtin_branch_order() {
        let names: Vec<String> = GitStampConfig::default().branch_types().into_keys().collect();
        assert_eq!(
            names,
            vec!["main", "develop", "release", "feature", "pull-request", "hotfix", "support"]
        );
    }

    #[test]
    fn test_user_branch_merges_over_builtin() {
        let mut config = GitStampConfig::default();
        config.branches.insert(
            "develop".to_string(),
            BranchConfig {
                label: Some("dev".to_string()),
                ..Default::default()
            },
        );
        config.branches.insert(
            "docs".to_string(),
            BranchConfig {
                regex: Some("^docs/".to_string()),
                increment: Some(IncrementStrategy::None),
                ..Default::default()
            },
        );

        let types = config.branch_types();
        let develop = &types["develop"];
        assert_eq!(develop.label.as_deref(), Some("dev"));
        assert_eq!(develop.increment, Some(IncrementStrategy::Minor));
        assert_eq!(types.keys().last().map(String::as_str), Some("docs"));
    }

    #[test]
    fn test_increment_strategy_field() {
        assert_eq!(IncrementStrategy::Minor.field(), Some(VersionField::Minor));
        assert_eq!(IncrementStrategy::Inherit.field(), None);
        assert_eq!(IncrementStrategy::from(VersionField::Major), IncrementStrategy::Major);
    }

    #[test]
    fn test_validate_rejects_bad_regex() {
        let mut config = GitStampConfig::default();
        config.branches.insert(
            "broken".to_string(),
            BranchConfig {
                regex: Some("(unclosed".to_string()),
                ..Default::default()
            },
        );
        assert!(matches!(
            config.validate(),
            Err(GitStampError::InvalidPattern { .. })
        ));
        assert!(GitStampConfig::default().validate().is_ok());
    }

    #[test]
    fn test_tag_prefix_is_anchored() {
        let re = GitStampConfig::default().tag_prefix_regex().unwrap();
        assert_eq!(re.find("v1.0.0").map(|m| m.end()), Some(1));
        assert_eq!(re.find("1.0.0").map(|m| m.end()), Some(0));
    }
}
