use crate::domain::SemanticVersion;
use crate::git::TagInfo;
use chrono::{DateTime, Utc};
use git2::Oid;
use regex::Regex;

/// A git tag whose name parsed as a version
#[derive(Debug, Clone, PartialEq)]
pub struct VersionTag {
    pub name: String,
    /// Commit the tag points at (annotated tags already peeled)
    pub target: Oid,
    pub version: SemanticVersion,
    /// Commit time of the target
    pub when: DateTime<Utc>,
}

impl VersionTag {
    /// Parse a raw tag, returning `None` when the name is not a version
    pub fn from_tag(tag: &TagInfo, prefix: &Regex) -> Option<Self> {
        let version = SemanticVersion::try_parse(&tag.name, Some(prefix))?;
        Some(VersionTag {
            name: tag.name.clone(),
            target: tag.target,
            version,
            when: tag.target_time,
        })
    }

    /// Parse every tag, silently skipping names that are not versions
    pub fn parse_all(tags: &[TagInfo], prefix: &Regex) -> Vec<Self> {
        tags.iter()
            .filter_map(|tag| {
                let parsed = Self::from_tag(tag, prefix);
                if parsed.is_none() {
                    tracing::trace!(tag = %tag.name, "tag is not a version, skipping");
                }
                parsed
            })
            .collect()
    }

    /// Highest version among tags pointing at `commit`
    pub fn highest_on<'a>(tags: &'a [VersionTag], commit: Oid) -> Option<&'a VersionTag> {
        tags.iter()
            .filter(|t| t.target == commit)
            .max_by(|a, b| a.version.cmp(&b.version).then_with(|| b.name.cmp(&a.name)))
    }
}
