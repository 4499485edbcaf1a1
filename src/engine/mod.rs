//! Version calculation entry point
//!
//! Ties the pieces together: resolve the branch and its policy, gather the
//! version tags that apply, then either walk the mainline (trunk-based mode)
//! or run the base version strategies and derive the next version from the
//! winner.

pub mod cancellation;
pub mod result;

pub use cancellation::CancellationToken;
pub use result::VersionResult;

use crate::config::{CommitMessageIncrementMode, DeploymentMode, GitStampConfig};
use crate::domain::merge_message::compile_formats;
use crate::domain::{BuildMetaData, IncrementMarkers, SemanticVersion, VersionField, VersionTag};
use crate::error::{GitStampError, Result};
use crate::git::{short_sha, BranchInfo, CommitInfo, Repository};
use crate::mainline::{apply_operator, GraphInputs, MainlineCalculator, MainlineGraph};
use crate::policy::{resolve_increment, BranchPolicyResolver, EffectiveConfiguration};
use crate::strategy::{evaluate_all, select, BaseVersion, StrategyContext};
use git2::Oid;
use std::collections::{BTreeSet, HashSet};
use tracing::instrument;

/// Branch name used when HEAD is detached on a commit no branch points at
pub const DETACHED_BRANCH_NAME: &str = "(no branch)";

/// What to calculate a version for
#[derive(Debug, Clone, Default)]
pub struct CalculateOptions {
    /// Version this branch instead of the checked-out one
    pub branch: Option<String>,
    /// Version this commit instead of the branch tip or HEAD
    pub commit: Option<Oid>,
    pub cancellation: CancellationToken,
}

/// Outcome before metadata is stamped
struct Calculated {
    version: SemanticVersion,
    source: Option<Oid>,
    strategy: String,
    description: String,
    increment: Option<VersionField>,
    commits_since_source: u64,
    other_sources: Vec<String>,
}

/// Calculate the version of a commit.
///
/// The repository is only read. The same repository state and configuration
/// always give the same result.
#[instrument(skip_all, fields(branch = ?options.branch))]
pub fn calculate_version(
    repo: &dyn Repository,
    config: &GitStampConfig,
    options: &CalculateOptions,
) -> Result<VersionResult> {
    config.validate()?;
    let resolver = BranchPolicyResolver::new(config)?;
    let tag_prefix = config.tag_prefix_regex()?;
    let markers = IncrementMarkers::from_config(config)?;
    let merge_formats = compile_formats(&config.merge_message_formats)?;
    let cancellation = &options.cancellation;

    let branches = repo.branches()?;
    let (branch_name, commit_id) = resolve_target(repo, &branches, options)?;
    let head = repo.find_commit(commit_id)?;

    let policy = resolver.resolve(&branch_name)?;
    policy.validate()?;
    tracing::debug!(
        branch = %branch_name,
        commit = %head.short_sha(),
        branch_type = %policy.branch_type,
        mode = ?policy.mode,
        "Calculating version"
    );

    let tags = applicable_tags(repo, &policy, &head, &tag_prefix)?;
    let increment = resolve_increment(repo, &resolver, &policy, head.id, &branches)?;
    cancellation.check()?;

    let calculated = match tagged_current_commit(&policy, &tags, head.id) {
        Some(calculated) => calculated,
        None if policy.mode == DeploymentMode::TrunkBased => {
            let graph = MainlineGraph::build(&GraphInputs {
                repo,
                resolver: &resolver,
                policy: &policy,
                increment,
                head: head.id,
                branches: &branches,
                merge_formats: &merge_formats,
                tag_prefix: &tag_prefix,
            })?;
            let outcome = MainlineCalculator {
                graph: &graph,
                tags: &tags,
                markers: &markers,
                message_mode: policy.commit_message_incrementing,
                tag_prefix: &tag_prefix,
            }
            .calculate(cancellation)?;
            Calculated {
                commits_since_source: commits_since(repo, outcome.source, head.id)?,
                version: outcome.version,
                source: outcome.source,
                strategy: "Mainline".to_string(),
                description: outcome.description,
                increment: outcome.increment,
                other_sources: Vec::new(),
            }
        }
        None => {
            let ctx = StrategyContext {
                repo,
                config,
                resolver: &resolver,
                policy: &policy,
                head: &head,
                branches: &branches,
                tags: &tags,
                merge_formats: &merge_formats,
                tag_prefix: &tag_prefix,
            };
            let candidates = evaluate_all(&ctx, cancellation)?;
            let selection = select(candidates);
            let mut calculated = next_version(&ctx, config, &markers, increment, selection.winner)?;
            calculated.other_sources = selection.others.iter().map(ToString::to_string).collect();
            calculated
        }
    };

    let commits_since_source = calculated.commits_since_source;
    let metadata = BuildMetaData {
        commits_since_source: Some(commits_since_source),
        branch: branch_name.clone(),
        sha: head.sha(),
        commit_date: Some(head.when),
        other_version_sources: calculated.other_sources,
        other_metadata: None,
    };

    let result = VersionResult {
        version: calculated.version.with_metadata(metadata),
        branch: branch_name,
        sha: head.sha(),
        commit_date: head.when,
        strategy: calculated.strategy,
        description: calculated.description,
        source_sha: calculated.source.map(|id| id.to_string()),
        commits_since_source,
        increment: calculated.increment,
        mode: policy.mode,
        legacy_padding: config.legacy_semver_padding,
    };
    tracing::info!(
        version = %result.version,
        strategy = %result.strategy,
        commits = result.commits_since_source,
        "Calculated version"
    );
    Ok(result)
}

/// Branch and commit to version
fn resolve_target(
    repo: &dyn Repository,
    branches: &[BranchInfo],
    options: &CalculateOptions,
) -> Result<(String, Oid)> {
    if let Some(name) = &options.branch {
        let branch = branches
            .iter()
            .filter(|b| b.name == *name || b.canonical_name == *name)
            .min_by_key(|b| b.is_remote)
            .ok_or_else(|| GitStampError::branch(format!("Branch not found: {}", name)))?;
        return Ok((branch.name.clone(), options.commit.unwrap_or(branch.tip)));
    }

    let head = repo.head()?;
    let commit = options.commit.unwrap_or(head.commit);
    match head.branch {
        Some(name) if commit == head.commit => Ok((name, commit)),
        _ => Ok((branch_at(branches, commit)?, commit)),
    }
}

/// The one branch whose tip is `commit`; local and remote refs with the same
/// friendly name count once
fn branch_at(branches: &[BranchInfo], commit: Oid) -> Result<String> {
    let names: BTreeSet<&str> = branches
        .iter()
        .filter(|b| b.tip == commit)
        .map(|b| b.name.as_str())
        .collect();
    match names.len() {
        0 => {
            tracing::debug!(commit = %short_sha(commit), "No branch points at the commit");
            Ok(DETACHED_BRANCH_NAME.to_string())
        }
        1 => Ok(names.first().copied().unwrap_or_default().to_string()),
        _ => Err(GitStampError::ambiguity(
            format!("current branch for commit {}", short_sha(commit)),
            names,
        )),
    }
}

/// Version tags on commits reachable from `head`, plus tags on merge commits
/// that took `head`'s history into another branch when the policy tracks
/// merge targets
fn applicable_tags(
    repo: &dyn Repository,
    policy: &EffectiveConfiguration,
    head: &CommitInfo,
    tag_prefix: &regex::Regex,
) -> Result<Vec<VersionTag>> {
    let reachable: HashSet<Oid> = repo
        .commits_between(None, head.id, false)?
        .into_iter()
        .map(|c| c.id)
        .collect();

    let mut tags = Vec::new();
    for tag in VersionTag::parse_all(&repo.tags()?, tag_prefix) {
        if reachable.contains(&tag.target) {
            tags.push(tag);
        } else if policy.track_merge_target {
            let target = repo.find_commit(tag.target)?;
            if target.is_merge() && target.parents.iter().any(|p| reachable.contains(p)) {
                tracing::debug!(tag = %tag.name, "Tracking tag on merge target");
                tags.push(tag);
            }
        }
    }
    Ok(tags)
}

/// A tag on the current commit is the answer when the policy says so
fn tagged_current_commit(
    policy: &EffectiveConfiguration,
    tags: &[VersionTag],
    commit: Oid,
) -> Option<Calculated> {
    if !policy.prevent_increment_if_current_commit_tagged {
        return None;
    }
    let tag = VersionTag::highest_on(tags, commit)?;
    tracing::debug!(tag = %tag.name, "Current commit is tagged");
    Some(Calculated {
        version: tag.version.clone(),
        source: Some(commit),
        strategy: "TaggedCommit".to_string(),
        description: format!("Current commit is tagged '{}'", tag.name),
        increment: None,
        commits_since_source: 0,
        other_sources: Vec::new(),
    })
}

/// Commits after `source` up to and including `head` along first parents;
/// no source counts from the root
fn commits_since(repo: &dyn Repository, source: Option<Oid>, head: Oid) -> Result<u64> {
    match source {
        Some(source) if source == head => Ok(0),
        source => Ok(repo.commits_between(source, head, true)?.len() as u64),
    }
}

/// Override marker on the tip commit, honouring the incrementing mode
fn tip_marker(
    head: &CommitInfo,
    markers: &IncrementMarkers,
    mode: CommitMessageIncrementMode,
) -> Option<VersionField> {
    match mode {
        CommitMessageIncrementMode::Disabled => None,
        CommitMessageIncrementMode::MergeMessageOnly if !head.is_merge() => None,
        _ => markers.find(&head.message),
    }
}

/// Label the mode asks for: the branch label, or the fallback label in
/// continuous delivery
fn mode_label(mode: DeploymentMode, config: &GitStampConfig, branch_label: String) -> String {
    match mode {
        DeploymentMode::ContinuousDelivery if branch_label.is_empty() => {
            config.continuous_delivery_fallback_label.clone()
        }
        _ => branch_label,
    }
}

/// Increment and label the selected base version
fn next_version(
    ctx: &StrategyContext<'_>,
    config: &GitStampConfig,
    markers: &IncrementMarkers,
    branch_increment: VersionField,
    base: BaseVersion,
) -> Result<Calculated> {
    let policy_increment = match &base.branch_name_override {
        Some(name) => {
            let merged = ctx.resolver.resolve(name)?;
            resolve_increment(ctx.repo, ctx.resolver, &merged, ctx.head.id, ctx.branches)?
        }
        None => branch_increment,
    };
    let marker = tip_marker(ctx.head, markers, ctx.policy.commit_message_incrementing);
    let field = marker.unwrap_or(policy_increment);
    let label = mode_label(ctx.policy.mode, config, ctx.policy.label()?);

    let commits_since_source = commits_since(ctx.repo, base.source, ctx.head.id)?;

    // An explicit `none` marker keeps the core version; a configured `None`
    // increment still moves a stable base off its release
    let (next, increment) = match (base.should_increment, marker) {
        (false, _) => (base.semantic_version.clone(), None),
        (true, Some(VersionField::None)) => {
            (base.semantic_version.clone(), Some(VersionField::None))
        }
        (true, _) => (apply_operator(&base.semantic_version, field, &label), Some(field)),
    };
    let version = shape_pre_release(&base.semantic_version, next, &label, commits_since_source);
    tracing::debug!(
        base = %base.semantic_version,
        next = %version,
        increment = ?increment,
        "Derived next version"
    );

    Ok(Calculated {
        version,
        source: base.source,
        strategy: base.strategy.to_string(),
        description: base.description,
        increment,
        commits_since_source,
        other_sources: Vec::new(),
    })
}

/// Set the pre-release part for the deployment mode's label.
///
/// No label gives a stable version. Otherwise the number continues from
/// the base when it already carries the same label on the same core
/// version, and grows with every commit since the source.
fn shape_pre_release(
    base: &SemanticVersion,
    next: SemanticVersion,
    label: &str,
    commits_since_source: u64,
) -> SemanticVersion {
    if label.is_empty() {
        return next.to_stable();
    }
    let continued = match &base.pre_release {
        Some(pre) if pre.has_label(label) && base.core() == next.core() => pre.number.unwrap_or(0),
        _ => 0,
    };
    next.with_pre_release(label, Some(continued.saturating_add(commits_since_source.max(1))))
}
