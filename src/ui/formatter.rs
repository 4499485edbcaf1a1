//! Pure formatting for the human-readable summary.
//!
//! Builders return strings so they can be tested; the `display_*` wrappers
//! print them to stderr.

use crate::engine::VersionResult;
use crate::policy::BranchPolicyResolver;
use console::style;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a status message with a yellow arrow.
pub fn display_status(message: &str) {
    eprintln!("{} {}", style("→").yellow(), message);
}

fn row(key: &str, value: impl std::fmt::Display) -> String {
    format!("  {:<18} {}", style(key).dim(), value)
}

/// Multi-line summary of a calculation
pub fn format_summary(result: &VersionResult) -> String {
    let source = result
        .source_sha
        .as_deref()
        .map(short_sha)
        .unwrap_or_else(|| "root".to_string());
    let increment = result
        .increment
        .map(|i| i.to_string())
        .unwrap_or_else(|| "-".to_string());

    let mut lines = vec![format!(
        "{} {}",
        style("Version").bold(),
        style(result.version.to_string()).green().bold()
    )];
    lines.push(row("branch", &result.branch));
    lines.push(row("commit", short_sha(&result.sha)));
    lines.push(row("mode", format!("{:?}", result.mode)));
    lines.push(row("strategy", &result.strategy));
    lines.push(row("base", &result.description));
    lines.push(row("source", source));
    lines.push(row("commits", result.commits_since_source));
    lines.push(row("increment", increment));

    if let Some(meta) = &result.version.build_metadata {
        for other in &meta.other_version_sources {
            lines.push(row("also considered", other));
        }
    }
    lines.join("\n")
}

fn short_sha(sha: &str) -> String {
    sha.chars().take(7).collect()
}

/// Print the summary to stderr
pub fn display_summary(result: &VersionResult) {
    eprintln!("{}", format_summary(result));
}

/// Branch types in match order with their patterns
pub fn format_branch_types(resolver: &BranchPolicyResolver) -> String {
    resolver
        .types()
        .iter()
        .map(|t| format!("  {:<14} {}", style(&t.name).cyan(), t.regex.as_str()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DeploymentMode, GitStampConfig};
    use crate::domain::{SemanticVersion, VersionField};
    use chrono::{DateTime, Utc};

    fn result() -> VersionResult {
        VersionResult {
            version: SemanticVersion::parse("1.2.1-ci.1", None).unwrap(),
            branch: "main".to_string(),
            sha: "0123456789abcdef0123456789abcdef01234567".to_string(),
            commit_date: DateTime::<Utc>::default(),
            strategy: "TaggedCommit".to_string(),
            description: "Git tag '1.2.0'".to_string(),
            source_sha: None,
            commits_since_source: 1,
            increment: Some(VersionField::Patch),
            mode: DeploymentMode::ContinuousDelivery,
            legacy_padding: 4,
        }
    }

    #[test]
    fn test_summary_mentions_key_facts() {
        console::set_colors_enabled(false);
        let text = format_summary(&result());
        assert!(text.contains("1.2.1-ci.1"));
        assert!(text.contains("0123456"));
        assert!(text.contains("TaggedCommit"));
        assert!(text.contains("root"));
        assert!(text.contains("Patch"));
    }

    #[test]
    fn test_branch_types_in_order() {
        console::set_colors_enabled(false);
        let resolver = BranchPolicyResolver::new(&GitStampConfig::default()).unwrap();
        let text = format_branch_types(&resolver);
        let main = text.find("main").unwrap();
        let feature = text.find("feature").unwrap();
        assert!(main < feature);
    }
}
