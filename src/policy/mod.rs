//! Branch policy resolution
//!
//! A branch name is matched against the configured branch types in
//! declaration order. The first match is merged over the global defaults to
//! produce an [EffectiveConfiguration]; names nothing matches get the
//! `unknown` fallback.

pub mod inherit;
pub mod label;

pub use inherit::resolve_increment;
pub use label::render_label;

use crate::config::{
    unknown_branch_config, BranchConfig, CommitMessageIncrementMode,
    DeploymentMode, GitStampConfig, IncrementStrategy, UNKNOWN_BRANCH_TYPE,
};
use crate::error::{GitStampError, Result};
use regex::Regex;

/// A configured branch type with its pattern compiled and its fragment
/// already merged over the global defaults
#[derive(Debug, Clone)]
pub struct BranchType {
    pub name: String,
    pub regex: Regex,
    pub config: BranchConfig,
}

impl BranchType {
    fn compile(name: &str, defaults: &BranchConfig, fragment: &BranchConfig) -> Result<Self> {
        let config = defaults.merge(fragment);
        let pattern = config
            .regex
            .clone()
            .ok_or_else(|| GitStampError::config(name, "branch type has no regex"))?;
        let regex = Regex::new(&pattern).map_err(|e| GitStampError::pattern(&pattern, e))?;
        Ok(BranchType {
            name: name.to_string(),
            regex,
            config,
        })
    }

    pub fn matches(&self, branch_name: &str) -> bool {
        self.regex.is_match(branch_name)
    }
}

/// The fully resolved policy for one concrete branch
#[derive(Debug, Clone)]
pub struct EffectiveConfiguration {
    pub branch_name: String,
    pub branch_type: String,
    pub branch_regex: Regex,
    /// May still be `Inherit`; see [resolve_increment]
    pub increment: IncrementStrategy,
    pub label_template: String,
    pub mode: DeploymentMode,
    pub is_main_branch: bool,
    pub is_release_branch: bool,
    pub tracks_release_branches: bool,
    pub source_branches: Vec<String>,
    pub prevent_increment_if_current_commit_tagged: bool,
    pub prevent_increment_of_merged_branch_version: bool,
    pub label_number_pattern: Option<Regex>,
    pub track_merge_target: bool,
    pub commit_message_incrementing: CommitMessageIncrementMode,
}

impl EffectiveConfiguration {
    /// Reject self-contradictory policies
    pub fn validate(&self) -> Result<()> {
        if self.is_release_branch && self.label_template.trim().is_empty() {
            return Err(GitStampError::config(
                &self.branch_name,
                format!(
                    "branch type '{}' is a release branch but has no label",
                    self.branch_type
                ),
            ));
        }
        Ok(())
    }

    /// Render the label template for this branch
    pub fn label(&self) -> Result<String> {
        render_label(
            &self.label_template,
            &self.branch_name,
            &self.branch_regex,
            self.label_number_pattern.as_ref(),
        )
    }
}

/// Matches branch names to branch types
#[derive(Debug, Clone)]
pub struct BranchPolicyResolver {
    types: Vec<BranchType>,
    unknown: BranchType,
    mode: DeploymentMode,
    commit_message_incrementing: CommitMessageIncrementMode,
}

impl BranchPolicyResolver {
    pub fn new(config: &GitStampConfig) -> Result<Self> {
        let defaults = config.global_branch_defaults();
        let types = config
            .branch_types()
            .iter()
            .map(|(name, fragment)| BranchType::compile(name, &defaults, fragment))
            .collect::<Result<Vec<_>>>()?;
        let unknown =
            BranchType::compile(UNKNOWN_BRANCH_TYPE, &defaults, &unknown_branch_config())?;

        Ok(BranchPolicyResolver {
            types,
            unknown,
            mode: config.mode,
            commit_message_incrementing: config.commit_message_incrementing,
        })
    }

    /// Configured branch types in match order
    pub fn types(&self) -> &[BranchType] {
        &self.types
    }

    /// The first branch type whose pattern matches, or the unknown fallback
    pub fn branch_type_of(&self, branch_name: &str) -> &BranchType {
        self.types
            .iter()
            .find(|t| t.matches(branch_name))
            .unwrap_or(&self.unknown)
    }

    /// Look up a branch type by its configured name
    pub fn type_named(&self, type_name: &str) -> Option<&BranchType> {
        self.types.iter().find(|t| t.name == type_name)
    }

    /// True when the branch falls in one of the named branch types
    pub fn is_of_type(&self, branch_name: &str, type_names: &[String]) -> bool {
        let found = self.branch_type_of(branch_name);
        type_names.iter().any(|t| *t == found.name)
    }

    /// Effective policy for a branch name. Never fails on an unmatched name.
    pub fn resolve(&self, branch_name: &str) -> Result<EffectiveConfiguration> {
        let branch_type = self.branch_type_of(branch_name);
        let config = &branch_type.config;

        let label_number_pattern = match config.label_number_pattern.as_deref() {
            Some(p) if !p.is_empty() => {
                Some(Regex::new(p).map_err(|e| GitStampError::pattern(p, e))?)
            }
            _ => None,
        };

        let effective = EffectiveConfiguration {
            branch_name: branch_name.to_string(),
            branch_type: branch_type.name.clone(),
            branch_regex: branch_type.regex.clone(),
            increment: config.increment.unwrap_or(IncrementStrategy::Inherit),
            label_template: config.label.clone().unwrap_or_default(),
            mode: config.mode.unwrap_or(self.mode),
            is_main_branch: config.is_main_branch.unwrap_or(false),
            is_release_branch: config.is_release_branch.unwrap_or(false),
            tracks_release_branches: config.tracks_release_branches.unwrap_or(false),
            source_branches: config.source_branches.clone().unwrap_or_default(),
            prevent_increment_if_current_commit_tagged: config
                .prevent_increment_if_current_commit_tagged
                .unwrap_or(true),
            prevent_increment_of_merged_branch_version: config
                .prevent_increment_of_merged_branch_version
                .unwrap_or(false),
            label_number_pattern,
            track_merge_target: config.track_merge_target.unwrap_or(false),
            commit_message_incrementing: config
                .commit_message_incrementing
                .unwrap_or(self.commit_message_incrementing),
        };

        tracing::debug!(
            branch = branch_name,
            branch_type = %effective.branch_type,
            increment = ?effective.increment,
            "Resolved branch policy"
        );
        Ok(effective)
    }
}
