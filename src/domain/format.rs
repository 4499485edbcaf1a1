//! Rendering a `SemanticVersion` in the supported output shapes.

use crate::domain::SemanticVersion;
use crate::error::{GitStampError, Result};
use std::fmt;
use std::str::FromStr;

/// Output shape for a version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionFormat {
    /// `1.2.3`
    MajorMinorPatch,
    /// `1.2.3-beta.4`
    SemVer,
    /// `1.2.3-beta.4+5`
    FullSemVer,
    /// `1.2.3-beta4`
    LegacySemVer,
    /// `1.2.3-beta0004`, padded to the given width
    LegacySemVerPadded(usize),
    /// `1.2.3.0`
    AssemblySemVer,
    /// `1.2.3-beta.4+5.Branch.main.Sha.<sha>`
    InformationalVersion,
}

impl SemanticVersion {
    /// Render in the given shape. Pure function of the fields.
    pub fn format(&self, format: VersionFormat) -> String {
        let core = format!("{}.{}.{}", self.major, self.minor, self.patch);
        match format {
            VersionFormat::MajorMinorPatch => core,
            VersionFormat::SemVer => self.to_string(),
            VersionFormat::FullSemVer => {
                match self.build_metadata.as_ref().and_then(|m| m.short()) {
                    Some(meta) => format!("{}+{}", self, meta),
                    None => self.to_string(),
                }
            }
            VersionFormat::LegacySemVer => self.legacy(0),
            VersionFormat::LegacySemVerPadded(pad) => self.legacy(pad),
            VersionFormat::AssemblySemVer => format!("{}.0", core),
            VersionFormat::InformationalVersion => {
                let meta = self
                    .build_metadata
                    .as_ref()
                    .map(|m| m.full())
                    .unwrap_or_default();
                if meta.is_empty() {
                    self.to_string()
                } else {
                    format!("{}+{}", self, meta)
                }
            }
        }
    }

    fn legacy(&self, pad: usize) -> String {
        let core = format!("{}.{}.{}", self.major, self.minor, self.patch);
        match &self.pre_release {
            Some(pre) => format!("{}-{}", core, pre.legacy(pad)),
            None => core,
        }
    }
}

impl FromStr for VersionFormat {
    type Err = GitStampError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "major-minor-patch" | "short" => Ok(VersionFormat::MajorMinorPatch),
            "semver" => Ok(VersionFormat::SemVer),
            "full-semver" | "full" => Ok(VersionFormat::FullSemVer),
            "legacy" => Ok(VersionFormat::LegacySemVer),
            "legacy-padded" => Ok(VersionFormat::LegacySemVerPadded(4)),
            "assembly" => Ok(VersionFormat::AssemblySemVer),
            "informational" => Ok(VersionFormat::InformationalVersion),
            other => Err(GitStampError::parse(format!(
                "Unknown output format '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for VersionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VersionFormat::MajorMinorPatch => "major-minor-patch",
            VersionFormat::SemVer => "semver",
            VersionFormat::FullSemVer => "full-semver",
            VersionFormat::LegacySemVer => "legacy",
            VersionFormat::LegacySemVerPadded(_) => "legacy-padded",
            VersionFormat::AssemblySemVer => "assembly",
            VersionFormat::InformationalVersion => "informational",
        };
        f.write_str(name)
    }
}
