use crate::config::DeploymentMode;
use crate::domain::branch::sanitize_label;
use crate::domain::{SemanticVersion, VersionField, VersionFormat};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use regex::{Captures, Regex};
use serde::Serialize;
use std::sync::OnceLock;

/// The calculated version and where it came from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionResult {
    /// Final version, build metadata included
    pub version: SemanticVersion,
    pub branch: String,
    pub sha: String,
    pub commit_date: DateTime<Utc>,
    /// Winning strategy, or `Mainline`
    pub strategy: String,
    pub description: String,
    /// Commit the version is counted from; `None` means the root
    pub source_sha: Option<String>,
    pub commits_since_source: u64,
    /// Increment that was applied, if any
    pub increment: Option<VersionField>,
    pub mode: DeploymentMode,
    #[serde(skip)]
    pub legacy_padding: usize,
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{(\w+)\}").expect("static placeholder pattern"))
}

impl VersionResult {
    /// Render the version in one of the fixed shapes
    pub fn render(&self, format: VersionFormat) -> String {
        match format {
            VersionFormat::LegacySemVerPadded(_) => self
                .version
                .format(VersionFormat::LegacySemVerPadded(self.legacy_padding)),
            other => self.version.format(other),
        }
    }

    /// Every output variable, in a stable order
    pub fn variables(&self) -> IndexMap<&'static str, String> {
        let v = &self.version;
        let pre = v.pre_release.as_ref();
        let meta = v.build_metadata.as_ref();

        let mut vars = IndexMap::new();
        vars.insert("Major", v.major.to_string());
        vars.insert("Minor", v.minor.to_string());
        vars.insert("Patch", v.patch.to_string());
        vars.insert(
            "PreReleaseTag",
            pre.map(ToString::to_string).unwrap_or_default(),
        );
        vars.insert(
            "PreReleaseLabel",
            pre.map(|p| p.name.clone()).unwrap_or_default(),
        );
        vars.insert(
            "PreReleaseNumber",
            pre.and_then(|p| p.number)
                .map(|n| n.to_string())
                .unwrap_or_default(),
        );
        vars.insert(
            "BuildMetaData",
            meta.and_then(|m| m.short()).unwrap_or_default(),
        );
        vars.insert(
            "FullBuildMetaData",
            meta.map(|m| m.full()).unwrap_or_default(),
        );
        vars.insert("MajorMinorPatch", self.render(VersionFormat::MajorMinorPatch));
        vars.insert("SemVer", self.render(VersionFormat::SemVer));
        vars.insert("FullSemVer", self.render(VersionFormat::FullSemVer));
        vars.insert("LegacySemVer", self.render(VersionFormat::LegacySemVer));
        vars.insert(
            "LegacySemVerPadded",
            self.render(VersionFormat::LegacySemVerPadded(self.legacy_padding)),
        );
        vars.insert("AssemblySemVer", self.render(VersionFormat::AssemblySemVer));
        vars.insert(
            "InformationalVersion",
            self.render(VersionFormat::InformationalVersion),
        );
        vars.insert("BranchName", self.branch.clone());
        vars.insert("EscapedBranchName", sanitize_label(&self.branch));
        vars.insert("Sha", self.sha.clone());
        vars.insert("ShortSha", self.sha.chars().take(7).collect());
        vars.insert(
            "CommitDate",
            self.commit_date.format("%Y-%m-%d").to_string(),
        );
        vars.insert(
            "VersionSourceSha",
            self.source_sha.clone().unwrap_or_default(),
        );
        vars.insert(
            "CommitsSinceVersionSource",
            self.commits_since_source.to_string(),
        );
        vars
    }

    /// Expand `{Variable}` placeholders; unknown names are left untouched.
    pub fn format_template(&self, template: &str) -> String {
        let vars = self.variables();
        placeholder_regex()
            .replace_all(template, |caps: &Captures<'_>| {
                vars.get(&caps[1])
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BuildMetaData;

    fn result() -> VersionResult {
        let meta = BuildMetaData {
            commits_since_source: Some(3),
            branch: "feature/login".to_string(),
            sha: "0123456789abcdef0123456789abcdef01234567".to_string(),
            ..Default::default()
        };
        VersionResult {
            version: SemanticVersion::parse("1.2.0-login.3", None)
                .unwrap()
                .with_metadata(meta),
            branch: "feature/login".to_string(),
            sha: "0123456789abcdef0123456789abcdef01234567".to_string(),
            commit_date: DateTime::<Utc>::default(),
            strategy: "TaggedCommit".to_string(),
            description: "Git tag '1.1.0'".to_string(),
            source_sha: Some("fedcba".to_string()),
            commits_since_source: 3,
            increment: Some(VersionField::Minor),
            mode: DeploymentMode::ContinuousDelivery,
            legacy_padding: 4,
        }
    }

    #[test]
    fn test_variables() {
        let vars = result().variables();
        assert_eq!(vars["Major"], "1");
        assert_eq!(vars["PreReleaseTag"], "login.3");
        assert_eq!(vars["PreReleaseLabel"], "login");
        assert_eq!(vars["PreReleaseNumber"], "3");
        assert_eq!(vars["FullSemVer"], "1.2.0-login.3+3");
        assert_eq!(vars["LegacySemVerPadded"], "1.2.0-login0003");
        assert_eq!(vars["AssemblySemVer"], "1.2.0.0");
        assert_eq!(vars["EscapedBranchName"], "feature-login");
        assert_eq!(vars["ShortSha"], "0123456");
        assert_eq!(vars["CommitDate"], "1970-01-01");
        assert_eq!(vars["CommitsSinceVersionSource"], "3");
        assert_eq!(vars.keys().next(), Some(&"Major"));
    }

    #[test]
    fn test_format_template() {
        let rendered = result().format_template("v{MajorMinorPatch}-{ShortSha} {Unknown}");
        assert_eq!(rendered, "v1.2.0-0123456 {Unknown}");
    }

    #[test]
    fn test_informational_version() {
        assert_eq!(
            result().render(VersionFormat::InformationalVersion),
            "1.2.0-login.3+3.Branch.feature-login.Sha.0123456789abcdef0123456789abcdef01234567"
        );
    }
}
