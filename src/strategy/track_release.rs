use super::{BaseVersion, StrategyContext, StrategyKind};
use crate::domain::branch::version_from_branch_name;
use crate::error::Result;

/// Versions of open release branches, so a branch that tracks them (usually
/// `develop`) stays ahead of every pending release.
pub(super) fn propose(ctx: &StrategyContext<'_>) -> Result<Vec<BaseVersion>> {
    if !ctx.policy.tracks_release_branches {
        return Ok(Vec::new());
    }

    let mut proposed = Vec::new();
    for branch in ctx.other_branches() {
        if !ctx.resolver.resolve(&branch.name)?.is_release_branch {
            continue;
        }
        let Some(version) = version_from_branch_name(&branch.name, ctx.tag_prefix) else {
            continue;
        };
        let Some(fork_point) = ctx.repo.merge_base(ctx.head.id, branch.tip)? else {
            continue;
        };

        proposed.push(BaseVersion {
            strategy: StrategyKind::TrackReleaseBranches,
            description: format!("Release branch '{}'", branch.name),
            semantic_version: version,
            should_increment: true,
            source: Some(fork_point),
            when: Some(ctx.commit_time(fork_point)?),
            branch_name_override: None,
        });
    }
    Ok(proposed)
}
