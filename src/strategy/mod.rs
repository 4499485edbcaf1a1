//! Base version strategies
//!
//! Each strategy independently proposes zero or more candidate starting
//! versions from one signal in the repository. They only read the shared
//! context, so they are evaluated in parallel; the selector then sees every
//! candidate in declaration order.

mod branch_name;
mod configured;
mod merge_message;
pub mod selector;
mod tagged;
mod track_release;

pub use selector::{select, Selection};

use crate::config::GitStampConfig;
use crate::domain::{MergeMessageFormat, SemanticVersion, VersionTag};
use crate::engine::CancellationToken;
use crate::error::{GitStampError, Result};
use crate::git::{BranchInfo, CommitInfo, Repository};
use crate::policy::{BranchPolicyResolver, EffectiveConfiguration};
use chrono::{DateTime, Utc};
use git2::Oid;
use rayon::prelude::*;
use regex::Regex;
use serde::Serialize;
use std::fmt;

/// The signals a base version can come from, in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StrategyKind {
    ConfiguredNextVersion,
    TaggedCommit,
    VersionInBranchName,
    MergeMessage,
    TrackReleaseBranches,
    /// Seed used when no strategy proposes anything
    Fallback,
}

impl StrategyKind {
    /// Every proposing strategy; the order breaks selection ties
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::ConfiguredNextVersion,
        StrategyKind::TaggedCommit,
        StrategyKind::VersionInBranchName,
        StrategyKind::MergeMessage,
        StrategyKind::TrackReleaseBranches,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::ConfiguredNextVersion => "ConfiguredNextVersion",
            StrategyKind::TaggedCommit => "TaggedCommit",
            StrategyKind::VersionInBranchName => "VersionInBranchName",
            StrategyKind::MergeMessage => "MergeMessage",
            StrategyKind::TrackReleaseBranches => "TrackReleaseBranches",
            StrategyKind::Fallback => "Fallback",
        }
    }

    /// Run this strategy against the context
    pub fn propose(self, ctx: &StrategyContext<'_>) -> Result<Vec<BaseVersion>> {
        match self {
            StrategyKind::ConfiguredNextVersion => configured::propose(ctx),
            StrategyKind::TaggedCommit => tagged::propose(ctx),
            StrategyKind::VersionInBranchName => branch_name::propose(ctx),
            StrategyKind::MergeMessage => merge_message::propose(ctx),
            StrategyKind::TrackReleaseBranches => track_release::propose(ctx),
            StrategyKind::Fallback => Ok(vec![BaseVersion::fallback()]),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A candidate starting version
#[derive(Debug, Clone, PartialEq)]
pub struct BaseVersion {
    pub strategy: StrategyKind,
    pub description: String,
    pub semantic_version: SemanticVersion,
    pub should_increment: bool,
    /// Commit the version is counted from; `None` counts from the root
    pub source: Option<Oid>,
    /// Only used to break ties between equal versions
    pub when: Option<DateTime<Utc>>,
    /// Branch whose policy should drive the increment instead of the current one
    pub branch_name_override: Option<String>,
}

impl BaseVersion {
    pub fn fallback() -> Self {
        BaseVersion {
            strategy: StrategyKind::Fallback,
            description: "Fallback base version".to_string(),
            semantic_version: SemanticVersion::new(0, 0, 0),
            should_increment: false,
            source: None,
            when: None,
            branch_name_override: None,
        }
    }
}

impl fmt::Display for BaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} ({})",
            self.strategy, self.semantic_version, self.description
        )
    }
}

/// Read-only inputs shared by every strategy
pub struct StrategyContext<'a> {
    pub repo: &'a dyn Repository,
    pub config: &'a GitStampConfig,
    pub resolver: &'a BranchPolicyResolver,
    pub policy: &'a EffectiveConfiguration,
    pub head: &'a CommitInfo,
    pub branches: &'a [BranchInfo],
    /// Version tags on commits reachable from HEAD
    pub tags: &'a [VersionTag],
    pub merge_formats: &'a [MergeMessageFormat],
    pub tag_prefix: &'a Regex,
}

impl StrategyContext<'_> {
    /// Branches other than the current one, one entry per friendly name
    /// (local refs listed before remote ones win)
    pub fn other_branches(&self) -> Vec<&BranchInfo> {
        let mut seen = std::collections::HashSet::new();
        let mut ordered: Vec<&BranchInfo> = self.branches.iter().collect();
        ordered.sort_by_key(|b| b.is_remote);
        ordered
            .into_iter()
            .filter(|b| b.name != self.policy.branch_name)
            .filter(|b| seen.insert(b.name.as_str()))
            .collect()
    }

    pub fn commit_time(&self, id: Oid) -> Result<DateTime<Utc>> {
        Ok(self.repo.find_commit(id)?.when)
    }
}

/// Parse errors only mean "no candidate from this strategy"
fn recover(kind: StrategyKind, result: Result<Vec<BaseVersion>>) -> Result<Vec<BaseVersion>> {
    match result {
        Err(e) if !e.is_fatal() => {
            tracing::debug!(strategy = %kind, error = %e, "Strategy yielded no candidate");
            Ok(Vec::new())
        }
        other => other,
    }
}

/// Evaluate every strategy in parallel and gather the candidates in
/// declaration order.
pub fn evaluate_all(
    ctx: &StrategyContext<'_>,
    cancellation: &CancellationToken,
) -> Result<Vec<BaseVersion>> {
    let results: Vec<Result<Vec<BaseVersion>>> = StrategyKind::ALL
        .par_iter()
        .map(|kind| {
            cancellation.check()?;
            let proposed = recover(*kind, kind.propose(ctx))?;
            for candidate in &proposed {
                tracing::debug!(candidate = %candidate, "Base version candidate");
            }
            Ok(proposed)
        })
        .collect();

    let mut candidates = Vec::new();
    for result in results {
        candidates.extend(result?);
    }
    cancellation.check()?;
    Ok(candidates)
}

/// Nearest fork point between `tip` and any branch of the given types.
///
/// Returns `Ok(None)` when no such branch exists. Branches built on `tip`
/// along their first parents are ignored; branches that merged `tip` in
/// still count, from where `tip` forked off them. When branches exist but none shares
/// history with `tip`, the topology is broken.
pub(crate) fn nearest_source(
    ctx: &StrategyContext<'_>,
    tip: Oid,
    source_types: &[String],
) -> Result<Option<(Oid, String)>> {
    let candidates: Vec<&BranchInfo> = ctx
        .other_branches()
        .into_iter()
        .filter(|b| ctx.resolver.is_of_type(&b.name, source_types))
        .collect();
    if candidates.is_empty() {
        return Ok(None);
    }

    let mut best: Option<(usize, Oid, String)> = None;
    let mut related = false;
    for branch in &candidates {
        let Some(base) = ctx.repo.fork_point(tip, branch.tip)? else {
            continue;
        };
        related = true;
        if base == tip && branch.tip != tip {
            continue;
        }
        let distance = ctx.repo.commits_between(Some(base), tip, true)?.len();
        let better = match &best {
            None => true,
            Some((d, _, name)) => (distance, &branch.name) < (*d, name),
        };
        if better {
            best = Some((distance, base, branch.name.clone()));
        }
    }

    if !related {
        let names: Vec<&str> = candidates.iter().map(|b| b.name.as_str()).collect();
        return Err(GitStampError::graph(
            &ctx.policy.branch_name,
            format!(
                "no common ancestor with any source branch ({}); branches of type '{}' must be created from one of them",
                names.join(", "),
                ctx.policy.branch_type
            ),
        ));
    }
    Ok(best.map(|(_, base, name)| (base, name)))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::domain::merge_message::compile_formats;
    use crate::domain::tag::VersionTag;
    use crate::git::MockRepository;

    /// Owns everything a [StrategyContext] borrows
    pub struct Fixture {
        pub repo: MockRepository,
        pub config: GitStampConfig,
        pub resolver: BranchPolicyResolver,
        pub policy: EffectiveConfiguration,
        pub head: CommitInfo,
        pub branches: Vec<BranchInfo>,
        pub tags: Vec<VersionTag>,
        pub formats: Vec<MergeMessageFormat>,
        pub prefix: Regex,
    }

    impl Fixture {
        pub fn new(repo: MockRepository, config: GitStampConfig) -> Self {
            let head_info = repo.head().unwrap();
            let head = repo.find_commit(head_info.commit).unwrap();
            let branch_name = head_info.branch.unwrap_or_else(|| "(no branch)".to_string());
            let resolver = BranchPolicyResolver::new(&config).unwrap();
            let policy = resolver.resolve(&branch_name).unwrap();
            let prefix = config.tag_prefix_regex().unwrap();
            let tags = VersionTag::parse_all(&repo.tags().unwrap(), &prefix)
                .into_iter()
                .filter(|t| repo.is_ancestor(t.target, head.id).unwrap())
                .collect();
            Fixture {
                branches: repo.branches().unwrap(),
                formats: compile_formats(&config.merge_message_formats).unwrap(),
                repo,
                config,
                resolver,
                policy,
                head,
                tags,
                prefix,
            }
        }

        pub fn ctx(&self) -> StrategyContext<'_> {
            StrategyContext {
                repo: &self.repo,
                config: &self.config,
                resolver: &self.resolver,
                policy: &self.policy,
                head: &self.head,
                branches: &self.branches,
                tags: &self.tags,
                merge_formats: &self.formats,
                tag_prefix: &self.prefix,
            }
        }
    }
}
