use super::{BaseVersion, StrategyContext, StrategyKind};
use crate::domain::SemanticVersion;
use crate::error::Result;

/// An explicit `next_version` in the configuration, never incremented
pub(super) fn propose(ctx: &StrategyContext<'_>) -> Result<Vec<BaseVersion>> {
    let Some(literal) = ctx.config.next_version.as_deref() else {
        return Ok(Vec::new());
    };

    let version = SemanticVersion::parse(literal, Some(ctx.tag_prefix))?;
    Ok(vec![BaseVersion {
        strategy: StrategyKind::ConfiguredNextVersion,
        description: "NextVersion in configuration".to_string(),
        semantic_version: version,
        should_increment: false,
        source: None,
        when: None,
        branch_name_override: None,
    }])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GitStampConfig;
    use crate::git::MockRepository;
    use crate::strategy::test_support::Fixture;

    #[test]
    fn test_next_version_from_config() {
        let mut repo = MockRepository::new();
        repo.commit("root");
        let config = GitStampConfig {
            next_version: Some("v2.1.0".to_string()),
            ..GitStampConfig::default()
        };
        let fixture = Fixture::new(repo, config);

        let proposed = propose(&fixture.ctx()).unwrap();
        assert_eq!(proposed.len(), 1);
        assert_eq!(proposed[0].semantic_version, SemanticVersion::new(2, 1, 0));
        assert!(!proposed[0].should_increment);
    }

    #[test]
    fn test_no_next_version_yields_nothing() {
        let mut repo = MockRepository::new();
        repo.commit("root");
        let fixture = Fixture::new(repo, GitStampConfig::default());
        assert!(propose(&fixture.ctx()).unwrap().is_empty());
    }
}
