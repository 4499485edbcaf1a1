//! Resolving `Inherit` increments from the nearest ancestor branch

use super::{BranchPolicyResolver, EffectiveConfiguration};
use crate::domain::VersionField;
use crate::error::{GitStampError, Result};
use crate::git::{BranchInfo, Repository};
use git2::Oid;
use std::collections::HashSet;

struct Candidate<'a> {
    branch: &'a BranchInfo,
    fork_point: Oid,
    distance: usize,
}

/// Concrete increment for `policy` observed at commit `tip`.
///
/// A non-`Inherit` increment is returned as is. Otherwise the branches of the
/// policy's source types (every other branch when none are listed) are
/// ranked by first-parent distance from `tip` to their fork point, and the
/// nearest one with a concrete increment wins. Branches built on `tip`
/// along their first parents are not ancestors and are skipped. A visited set bounds the walk
/// on histories that merge back and forth.
pub fn resolve_increment<R: Repository + ?Sized>(
    repo: &R,
    resolver: &BranchPolicyResolver,
    policy: &EffectiveConfiguration,
    tip: Oid,
    branches: &[BranchInfo],
) -> Result<VersionField> {
    let mut visited = HashSet::new();
    resolve_inner(repo, resolver, policy, tip, branches, &mut visited)
}

fn resolve_inner<R: Repository + ?Sized>(
    repo: &R,
    resolver: &BranchPolicyResolver,
    policy: &EffectiveConfiguration,
    tip: Oid,
    branches: &[BranchInfo],
    visited: &mut HashSet<String>,
) -> Result<VersionField> {
    if let Some(field) = policy.increment.field() {
        return Ok(field);
    }
    visited.insert(policy.branch_name.clone());

    let mut candidates = Vec::new();
    let mut seen_names = HashSet::new();
    for branch in branches {
        if visited.contains(&branch.name) || !seen_names.insert(branch.name.as_str()) {
            continue;
        }
        if !policy.source_branches.is_empty()
            && !resolver.is_of_type(&branch.name, &policy.source_branches)
        {
            continue;
        }
        let Some(fork_point) = repo.fork_point(tip, branch.tip)? else {
            continue;
        };
        if fork_point == tip && branch.tip != tip {
            continue;
        }
        let distance = repo.commits_between(Some(fork_point), tip, true)?.len();
        candidates.push(Candidate {
            branch,
            fork_point,
            distance,
        });
    }

    candidates.sort_by(|a, b| {
        a.distance
            .cmp(&b.distance)
            .then_with(|| a.branch.name.cmp(&b.branch.name))
    });

    for candidate in candidates {
        let parent = resolver.resolve(&candidate.branch.name)?;
        match resolve_inner(repo, resolver, &parent, candidate.fork_point, branches, visited) {
            Ok(field) => {
                tracing::debug!(
                    branch = %policy.branch_name,
                    inherited_from = %candidate.branch.name,
                    increment = %field,
                    "Inherited increment"
                );
                return Ok(field);
            }
            Err(GitStampError::Configuration { .. }) => continue,
            Err(e) => return Err(e),
        }
    }

    Err(GitStampError::config(
        &policy.branch_name,
        "increment is Inherit but no ancestor branch with a concrete increment was found",
    ))
}
