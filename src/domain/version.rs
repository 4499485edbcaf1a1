use crate::domain::{BuildMetaData, PreReleaseTag};
use crate::error::{GitStampError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?P<major>\d+)\.(?P<minor>\d+)\.(?P<patch>\d+)(?:-(?P<pre>[0-9A-Za-z\-.]+))?(?:\+(?P<meta>[0-9A-Za-z\-.]+))?$",
        )
        .expect("static version pattern")
    })
}

/// Which part of a version an increment touches
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum VersionField {
    /// Pre-release-only increment
    #[default]
    None,
    Patch,
    Minor,
    Major,
}

impl fmt::Display for VersionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VersionField::None => "None",
            VersionField::Patch => "Patch",
            VersionField::Minor => "Minor",
            VersionField::Major => "Major",
        };
        f.write_str(name)
    }
}

/// Semantic version with optional pre-release tag and build metadata.
///
/// Ordering and equality ignore build metadata. Increment operations return
/// an updated copy.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SemanticVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre_release: Option<PreReleaseTag>,
    pub build_metadata: Option<BuildMetaData>,
}

impl SemanticVersion {
    /// Create a stable version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        SemanticVersion {
            major,
            minor,
            patch,
            pre_release: None,
            build_metadata: None,
        }
    }

    /// Parse `Major.Minor.Patch[-label][+metadata]`, stripping whatever the
    /// anchored `prefix` pattern matches at the start of `text`.
    pub fn parse(text: &str, prefix: Option<&Regex>) -> Result<Self> {
        let trimmed = text.trim();
        let stripped = match prefix.and_then(|re| re.find(trimmed)) {
            Some(m) if m.start() == 0 => &trimmed[m.end()..],
            _ => trimmed,
        };

        let caps = version_regex().captures(stripped).ok_or_else(|| {
            GitStampError::parse(format!(
                "'{}' is not a Major.Minor.Patch version",
                text
            ))
        })?;

        let number = |name: &str| -> Result<u64> {
            caps[name].parse::<u64>().map_err(|_| {
                GitStampError::parse(format!("Invalid {} component in '{}'", name, text))
            })
        };

        Ok(SemanticVersion {
            major: number("major")?,
            minor: number("minor")?,
            patch: number("patch")?,
            pre_release: caps.name("pre").map(|m| PreReleaseTag::parse(m.as_str())),
            build_metadata: caps.name("meta").map(|m| BuildMetaData::parse(m.as_str())),
        })
    }

    /// Parse, returning `None` instead of a parse error
    pub fn try_parse(text: &str, prefix: Option<&Regex>) -> Option<Self> {
        Self::parse(text, prefix).ok()
    }

    /// A version without a pre-release tag is stable
    pub fn is_stable(&self) -> bool {
        self.pre_release.is_none()
    }

    /// True when the pre-release tag carries `label` (case-insensitive)
    pub fn has_label(&self, label: &str) -> bool {
        self.pre_release
            .as_ref()
            .map_or(false, |pre| pre.has_label(label))
    }

    /// Return a copy with the given field incremented.
    ///
    /// Major/Minor/Patch reset the lower fields and set the pre-release tag
    /// to `label` at number 1 (no label gives a stable version). `None`
    /// bumps only the pre-release number and leaves stable versions alone.
    pub fn increment(&self, field: VersionField, label: Option<&str>) -> Self {
        let mut next = self.clone();
        let fresh_label = || {
            label
                .filter(|l| !l.is_empty())
                .map(|l| PreReleaseTag::new(l, Some(1)))
        };

        match field {
            VersionField::Major => {
                next.major = next.major.saturating_add(1);
                next.minor = 0;
                next.patch = 0;
                next.pre_release = fresh_label();
            }
            VersionField::Minor => {
                next.minor = next.minor.saturating_add(1);
                next.patch = 0;
                next.pre_release = fresh_label();
            }
            VersionField::Patch => {
                next.patch = next.patch.saturating_add(1);
                next.pre_release = fresh_label();
            }
            VersionField::None => {
                next.pre_release = self.pre_release.as_ref().map(PreReleaseTag::increment_number);
            }
        }
        next
    }

    /// Return a copy carrying `label`/`number` as its pre-release tag
    pub fn with_pre_release(&self, label: &str, number: Option<u64>) -> Self {
        let mut next = self.clone();
        next.pre_release = if label.is_empty() && number.is_none() {
            None
        } else {
            Some(PreReleaseTag::new(label, number))
        };
        next
    }

    /// Return a copy without any pre-release tag
    pub fn to_stable(&self) -> Self {
        let mut next = self.clone();
        next.pre_release = None;
        next
    }

    /// Return a copy with the given build metadata
    pub fn with_metadata(&self, metadata: BuildMetaData) -> Self {
        let mut next = self.clone();
        next.build_metadata = Some(metadata);
        next
    }

    /// `Major.Minor.Patch` only
    pub fn core(&self) -> (u64, u64, u64) {
        (self.major, self.minor, self.patch)
    }
}

impl PartialEq for SemanticVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SemanticVersion {}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SemanticVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.core()
            .cmp(&other.core())
            .then_with(|| match (&self.pre_release, &other.pre_release) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(b),
            })
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre_release {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}

impl TryFrom<&SemanticVersion> for semver::Version {
    type Error = semver::Error;

    fn try_from(v: &SemanticVersion) -> std::result::Result<Self, Self::Error> {
        let pre = match &v.pre_release {
            Some(tag) => semver::Prerelease::new(&tag.to_string())?,
            None => semver::Prerelease::EMPTY,
        };
        let build = match v.build_metadata.as_ref().and_then(BuildMetaData::short) {
            Some(count) => semver::BuildMetadata::new(&count)?,
            None => semver::BuildMetadata::EMPTY,
        };
        Ok(semver::Version {
            major: v.major,
            minor: v.minor,
            patch: v.patch,
            pre,
            build,
        })
    }
}
