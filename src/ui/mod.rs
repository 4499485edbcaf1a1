//! User interface: rendering results for stdout and summaries for stderr.
//!
//! - `formatter` - styled human-readable text
//! - This module - choosing what goes to stdout

use anyhow::Result;

use crate::domain::VersionFormat;
use crate::engine::VersionResult;

pub mod formatter;

pub use formatter::{
    display_error, display_status, display_summary, format_branch_types, format_summary,
};

/// What the binary prints on stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Version(VersionFormat),
    Json,
}

impl std::str::FromStr for OutputKind {
    type Err = crate::error::GitStampError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(OutputKind::Json),
            other => other.parse().map(OutputKind::Version),
        }
    }
}

/// Render a result for stdout. A template takes precedence over the kind.
pub fn render_output(
    result: &VersionResult,
    kind: OutputKind,
    template: Option<&str>,
) -> Result<String> {
    if let Some(template) = template {
        return Ok(result.format_template(template));
    }
    match kind {
        OutputKind::Version(format) => Ok(result.render(format)),
        OutputKind::Json => {
            let mut value = serde_json::to_value(result)?;
            if let Some(object) = value.as_object_mut() {
                object.insert(
                    "variables".to_string(),
                    serde_json::to_value(result.variables())?,
                );
            }
            Ok(serde_json::to_string_pretty(&value)?)
        }
    }
}
