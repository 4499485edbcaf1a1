use crate::domain::branch::sanitize_label;
use crate::error::{GitStampError, Result};
use regex::Regex;

/// Expand `{BranchName}` and `{Number}` in a label template.
///
/// `{BranchName}` is the `BranchName` capture of the branch type's regex, or
/// the whole branch name when the regex has no such group. `{Number}` comes
/// from the `number` capture of `number_pattern`; a template that asks for a
/// number the branch name does not carry is ambiguous.
///
/// ```rust
/// use git_stamp::policy::render_label;
/// use regex::Regex;
///
/// let branch_regex = Regex::new("^features?[/-](?P<BranchName>.+)").unwrap();
/// let label = render_label("{BranchName}", "feature/login_form", &branch_regex, None).unwrap();
/// assert_eq!(label, "login-form");
/// ```
pub fn render_label(
    template: &str,
    branch_name: &str,
    branch_regex: &Regex,
    number_pattern: Option<&Regex>,
) -> Result<String> {
    let mut label = template.to_string();

    if label.contains("{BranchName}") {
        let name = branch_regex
            .captures(branch_name)
            .and_then(|caps| caps.name("BranchName"))
            .map_or(branch_name, |m| m.as_str());
        label = label.replace("{BranchName}", &sanitize_label(name));
    }

    if label.contains("{Number}") {
        let number = number_pattern
            .and_then(|re| re.captures(branch_name))
            .and_then(|caps| caps.name("number"))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| {
                GitStampError::ambiguity(
                    format!(
                        "pre-release number for branch '{}' (label '{}' needs {{Number}})",
                        branch_name, template
                    ),
                    number_pattern.map(|re| re.as_str().to_string()),
                )
            })?;
        label = label.replace("{Number}", &number);
    }

    Ok(label)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature_regex() -> Regex {
        Regex::new("^features?[/-](?P<BranchName>.+)").unwrap()
    }

    #[test]
    fn test_branch_name_capture() {
        let label = render_label("{BranchName}", "feature/foo.bar", &feature_regex(), None).unwrap();
        assert_eq!(label, "foo-bar");
    }

    #[test]
    fn test_branch_name_without_capture_uses_full_name() {
        let regex = Regex::new("^dev").unwrap();
        let label = render_label("pre-{BranchName}", "dev/x", &regex, None).unwrap();
        assert_eq!(label, "pre-dev-x");
    }

    #[test]
    fn test_number_from_pull_request_branch() {
        let regex = Regex::new("^(pull|pull-requests|pr)[/-]").unwrap();
        let number = Regex::new(r"[/-](?P<number>\d+)").unwrap();
        let label = render_label("PullRequest{Number}", "pull/42/merge", &regex, Some(&number)).unwrap();
        assert_eq!(label, "PullRequest42");
    }

    #[test]
    fn test_missing_number_is_ambiguous() {
        let regex = Regex::new("^pr[/-]").unwrap();
        let number = Regex::new(r"[/-](?P<number>\d+)").unwrap();
        let err = render_label("PullRequest{Number}", "pr/topic", &regex, Some(&number)).unwrap_err();
        assert!(matches!(err, GitStampError::Ambiguity { .. }));
        assert!(err.to_string().contains("pr/topic"));
    }

    #[test]
    fn test_plain_label_untouched() {
        assert_eq!(render_label("beta", "release/1.0.0", &feature_regex(), None).unwrap(), "beta");
    }
}
