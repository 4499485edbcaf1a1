use super::{BaseVersion, StrategyContext, StrategyKind};
use crate::error::Result;

/// The most recent version tag reachable from HEAD.
///
/// Recency is the tagged commit's time; equal times fall back to the higher
/// version. A tag on HEAD itself is not incremented again.
pub(super) fn propose(ctx: &StrategyContext<'_>) -> Result<Vec<BaseVersion>> {
    let latest = ctx
        .tags
        .iter()
        .filter(|tag| tag.when <= ctx.head.when || tag.target == ctx.head.id)
        .max_by(|a, b| {
            a.when
                .cmp(&b.when)
                .then_with(|| a.version.cmp(&b.version))
        });

    Ok(latest
        .map(|tag| BaseVersion {
            strategy: StrategyKind::TaggedCommit,
            description: format!("Git tag '{}'", tag.name),
            semantic_version: tag.version.clone(),
            should_increment: tag.target != ctx.head.id,
            source: Some(tag.target),
            when: Some(tag.when),
            branch_name_override: None,
        })
        .into_iter()
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GitStampConfig;
    use crate::domain::SemanticVersion;
    use crate::git::MockRepository;
    use crate::strategy::test_support::Fixture;

    #[test]
    fn test_latest_reachable_tag() {
        let mut repo = MockRepository::new();
        repo.commit("root");
        repo.tag("1.0.0");
        let second = repo.commit("second");
        repo.tag("v1.1.0");
        repo.commit("third");

        let fixture = Fixture::new(repo, GitStampConfig::default());
        let proposed = propose(&fixture.ctx()).unwrap();
        assert_eq!(proposed.len(), 1);
        assert_eq!(proposed[0].semantic_version, SemanticVersion::new(1, 1, 0));
        assert_eq!(proposed[0].source, Some(second));
        assert!(proposed[0].should_increment);
    }

    #[test]
    fn test_tag_on_head_is_not_incremented() {
        let mut repo = MockRepository::new();
        repo.commit("root");
        repo.tag("1.0.0");

        let fixture = Fixture::new(repo, GitStampConfig::default());
        let proposed = propose(&fixture.ctx()).unwrap();
        assert!(!proposed[0].should_increment);
    }

    #[test]
    fn test_unreachable_tags_are_ignored() {
        let mut repo = MockRepository::new();
        repo.commit("root");
        repo.checkout_new("feature/x");
        repo.commit("feature work");
        repo.tag("5.0.0");
        repo.checkout("main");
        repo.commit("main work");

        let fixture = Fixture::new(repo, GitStampConfig::default());
        assert!(propose(&fixture.ctx()).unwrap().is_empty());
    }

    #[test]
    fn test_non_version_tags_are_ignored() {
        let mut repo = MockRepository::new();
        repo.commit("root");
        repo.tag("nightly");

        let fixture = Fixture::new(repo, GitStampConfig::default());
        assert!(propose(&fixture.ctx()).unwrap().is_empty());
    }
}
