use super::{nearest_source, BaseVersion, StrategyContext, StrategyKind};
use crate::domain::branch::version_from_branch_name;
use crate::error::Result;

/// A version literal in the name of a release-type branch, e.g.
/// `release/2.0.0`. The version is the one being released, so it is not
/// incremented; commits are counted from the fork point with the nearest
/// source branch.
pub(super) fn propose(ctx: &StrategyContext<'_>) -> Result<Vec<BaseVersion>> {
    if !ctx.policy.is_release_branch {
        return Ok(Vec::new());
    }
    let branch = &ctx.policy.branch_name;
    let Some(version) = version_from_branch_name(branch, ctx.tag_prefix) else {
        tracing::debug!(branch = %branch, "No version in release branch name");
        return Ok(Vec::new());
    };

    let source = nearest_source(ctx, ctx.head.id, &ctx.policy.source_branches)?;
    let when = match &source {
        Some((id, _)) => Some(ctx.commit_time(*id)?),
        None => None,
    };
    let description = match &source {
        Some((_, from)) => format!("Version in branch name '{}' (branched from '{}')", branch, from),
        None => format!("Version in branch name '{}'", branch),
    };

    Ok(vec![BaseVersion {
        strategy: StrategyKind::VersionInBranchName,
        description,
        semantic_version: version,
        should_increment: false,
        source: source.map(|(id, _)| id),
        when,
        branch_name_override: None,
    }])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GitStampConfig;
    use crate::domain::SemanticVersion;
    use crate::error::GitStampError;
    use crate::git::MockRepository;
    use crate::strategy::test_support::Fixture;

    #[test]
    fn test_release_branch_without_commits() {
        let mut repo = MockRepository::new();
        repo.commit("root");
        let fork = repo.commit("ready");
        repo.checkout_new("release/2.0.0");

        let fixture = Fixture::new(repo, GitStampConfig::default());
        let proposed = propose(&fixture.ctx()).unwrap();
        assert_eq!(proposed.len(), 1);
        assert_eq!(proposed[0].semantic_version, SemanticVersion::new(2, 0, 0));
        assert!(!proposed[0].should_increment);
        assert_eq!(proposed[0].source, Some(fork));
    }

    #[test]
    fn test_non_release_branch_yields_nothing() {
        let mut repo = MockRepository::new();
        repo.commit("root");
        repo.checkout_new("feature/2.0.0");
        let fixture = Fixture::new(repo, GitStampConfig::default());
        assert!(propose(&fixture.ctx()).unwrap().is_empty());
    }

    #[test]
    fn test_release_branch_without_version() {
        let mut repo = MockRepository::new();
        repo.commit("root");
        repo.checkout_new("release/next");
        let fixture = Fixture::new(repo, GitStampConfig::default());
        assert!(propose(&fixture.ctx()).unwrap().is_empty());
    }

    #[test]
    fn test_hotfix_unrelated_to_main_is_graph_error() {
        let mut repo = MockRepository::new();
        repo.commit("main root");
        repo.checkout("hotfix/1.0.1");
        repo.commit_with_parents("orphan root", &[]);

        let fixture = Fixture::new(repo, GitStampConfig::default());
        let err = propose(&fixture.ctx()).unwrap_err();
        assert!(matches!(err, GitStampError::GraphIntegrity { ref branch, .. } if branch == "hotfix/1.0.1"));
        assert!(err.to_string().contains("main"));
    }
}
