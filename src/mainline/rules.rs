use super::graph::{MainlineCommit, MainlineGraph, MainlineIteration};
use crate::config::CommitMessageIncrementMode;
use crate::domain::branch::version_from_branch_name;
use crate::domain::{IncrementMarkers, SemanticVersion, VersionField, VersionTag};
use git2::Oid;
use regex::Regex;
use serde::Serialize;
use std::fmt;

/// Read-only state the rules consult
pub struct RuleContext<'a> {
    pub graph: &'a MainlineGraph,
    /// Version tags reachable from HEAD
    pub tags: &'a [VersionTag],
    pub markers: &'a IncrementMarkers,
    pub message_mode: CommitMessageIncrementMode,
    pub tag_prefix: &'a Regex,
}

/// What a rule asks the calculator to do
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Adopt this version verbatim
    Operand {
        version: SemanticVersion,
        source: Oid,
    },
    /// Derive the next version from the current one
    Operator {
        increment: VersionField,
        label: String,
        source: Oid,
    },
    /// A version observed in a merged release branch name
    Alternative {
        version: SemanticVersion,
        source: Oid,
    },
}

/// Incrementer rules in precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MainlineRule {
    TaggedStable,
    TaggedPreRelease,
    MergeCommitOnTrunk,
    TerminalMerge,
    BranchTip,
    PlainCommit,
}

impl fmt::Display for MainlineRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl MainlineRule {
    pub const PRECEDENCE: [MainlineRule; 6] = [
        MainlineRule::TaggedStable,
        MainlineRule::TaggedPreRelease,
        MainlineRule::MergeCommitOnTrunk,
        MainlineRule::TerminalMerge,
        MainlineRule::BranchTip,
        MainlineRule::PlainCommit,
    ];

    /// The highest-precedence rule matching this commit
    pub fn first_match(
        iteration: &MainlineIteration,
        commit: &MainlineCommit,
        ctx: &RuleContext<'_>,
    ) -> MainlineRule {
        Self::PRECEDENCE
            .into_iter()
            .find(|rule| rule.matches(iteration, commit, ctx))
            .unwrap_or(MainlineRule::PlainCommit)
    }

    pub fn matches(
        self,
        iteration: &MainlineIteration,
        commit: &MainlineCommit,
        ctx: &RuleContext<'_>,
    ) -> bool {
        match self {
            MainlineRule::TaggedStable => {
                VersionTag::highest_on(ctx.tags, commit.id).map_or(false, |t| t.version.is_stable())
            }
            MainlineRule::TaggedPreRelease => VersionTag::highest_on(ctx.tags, commit.id)
                .map_or(false, |t| !t.version.is_stable()),
            MainlineRule::MergeCommitOnTrunk => {
                iteration.is_trunk && commit.child_iteration.is_some() && commit.successor.is_some()
            }
            MainlineRule::TerminalMerge => {
                iteration.is_trunk && commit.child_iteration.is_some() && commit.successor.is_none()
            }
            MainlineRule::BranchTip => !iteration.is_trunk && commit.successor.is_none(),
            MainlineRule::PlainCommit => true,
        }
    }

    pub fn apply(
        self,
        iteration: &MainlineIteration,
        commit: &MainlineCommit,
        ctx: &RuleContext<'_>,
    ) -> Vec<Operation> {
        match self {
            MainlineRule::TaggedStable | MainlineRule::TaggedPreRelease => {
                VersionTag::highest_on(ctx.tags, commit.id)
                    .map(|tag| Operation::Operand {
                        version: tag.version.clone(),
                        source: commit.id,
                    })
                    .into_iter()
                    .collect()
            }
            MainlineRule::MergeCommitOnTrunk | MainlineRule::TerminalMerge => {
                apply_merge(iteration, commit, ctx)
            }
            MainlineRule::BranchTip | MainlineRule::PlainCommit => vec![Operation::Operator {
                increment: marker_for(commit.id, ctx).unwrap_or(iteration.increment),
                label: iteration.label.clone(),
                source: commit.id,
            }],
        }
    }
}

/// Override marker in a commit message, honouring the incrementing mode
fn marker_for(id: Oid, ctx: &RuleContext<'_>) -> Option<VersionField> {
    let info = ctx.graph.commit(id)?;
    match ctx.message_mode {
        CommitMessageIncrementMode::Disabled => None,
        CommitMessageIncrementMode::MergeMessageOnly if !info.is_merge() => None,
        _ => ctx.markers.find(&info.message),
    }
}

/// A merge on trunk carries the merged branch's increment (raised by any
/// markers on the merged commits) and the trunk label. A merged release
/// branch whose name holds a version also adds that version as an
/// alternative.
fn apply_merge(
    iteration: &MainlineIteration,
    commit: &MainlineCommit,
    ctx: &RuleContext<'_>,
) -> Vec<Operation> {
    let Some(child) = commit
        .child_iteration
        .and_then(|idx| ctx.graph.iterations.get(idx))
    else {
        return Vec::new();
    };

    let increment = match marker_for(commit.id, ctx) {
        Some(field) => field,
        None => child
            .commits
            .iter()
            .filter_map(|c| match ctx.message_mode {
                CommitMessageIncrementMode::Enabled => marker_for(c.id, ctx),
                _ => None,
            })
            .fold(child.increment, VersionField::max),
    };

    let mut operations = vec![Operation::Operator {
        increment,
        label: iteration.label.clone(),
        source: commit.id,
    }];

    if child.policy.is_release_branch {
        if let Some(version) = version_from_branch_name(&child.branch_name, ctx.tag_prefix) {
            let version = if iteration.label.is_empty() {
                version.to_stable()
            } else {
                version.with_pre_release(&iteration.label, Some(1))
            };
            operations.push(Operation::Alternative {
                version,
                source: commit.id,
            });
        }
    }
    operations
}
