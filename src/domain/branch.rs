//! Branch name helpers

use crate::domain::SemanticVersion;
use regex::Regex;

/// Label-safe form of a branch name: anything outside `[A-Za-z0-9-]` becomes `-`
pub fn sanitize_label(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect()
}

/// Strip `refs/heads/`, `refs/remotes/<remote>/` and a leading `origin/`
pub fn friendly_name(name: &str) -> String {
    if let Some(rest) = name.strip_prefix("refs/heads/") {
        return rest.to_string();
    }
    if let Some(rest) = name.strip_prefix("refs/remotes/") {
        return rest.split_once('/').map_or(rest, |(_, b)| b).to_string();
    }
    name.strip_prefix("origin/").unwrap_or(name).to_string()
}

/// Extract a version literal from a branch name such as `release/2.0.0`,
/// `release-2.0.0` or `releases/v2.1.0-beta`.
///
/// The last `/` segment is tried first, then every suffix following a `-`.
pub fn version_from_branch_name(name: &str, prefix: &Regex) -> Option<SemanticVersion> {
    let segment = name.rsplit('/').next().unwrap_or(name);
    if let Some(version) = SemanticVersion::try_parse(segment, Some(prefix)) {
        return Some(version);
    }

    segment
        .match_indices('-')
        .map(|(idx, _)| &segment[idx + 1..])
        .find_map(|candidate| SemanticVersion::try_parse(candidate, Some(prefix)))
}
