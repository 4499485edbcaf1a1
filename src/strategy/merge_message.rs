use super::{BaseVersion, StrategyContext, StrategyKind};
use crate::domain::MergeMessage;
use crate::error::Result;

/// A release branch merged into HEAD, recognised from the merge message.
///
/// Only merge commits are inspected. The merged branch must resolve to a
/// release-type policy and carry a version in its name; its name is kept as
/// the branch name override so the increment follows the merged branch.
pub(super) fn propose(ctx: &StrategyContext<'_>) -> Result<Vec<BaseVersion>> {
    if !ctx.head.is_merge() {
        return Ok(Vec::new());
    }
    let Some(merge) = MergeMessage::parse(&ctx.head.message, ctx.merge_formats, ctx.tag_prefix)
    else {
        return Ok(Vec::new());
    };
    tracing::debug!(
        format = %merge.format_name,
        merged_branch = %merge.merged_branch,
        pull_request = ?merge.pull_request_number,
        "Recognised merge message"
    );

    let merged_policy = ctx.resolver.resolve(&merge.merged_branch)?;
    let Some(version) = merge.version.clone().filter(|_| merged_policy.is_release_branch) else {
        return Ok(Vec::new());
    };

    Ok(vec![BaseVersion {
        strategy: StrategyKind::MergeMessage,
        description: format!("Merge message '{}'", ctx.head.summary()),
        semantic_version: version,
        should_increment: !ctx.policy.prevent_increment_of_merged_branch_version,
        source: Some(ctx.head.id),
        when: Some(ctx.head.when),
        branch_name_override: Some(merge.merged_branch),
    }])
}
