//! Domain logic - pure value types and rules independent of git access

pub mod branch;
pub mod commit;
pub mod format;
pub mod merge_message;
pub mod metadata;
pub mod prerelease;
pub mod tag;
pub mod version;

pub use commit::{IncrementMarkers, ParsedCommit};
pub use format::VersionFormat;
pub use merge_message::{MergeMessage, MergeMessageFormat};
pub use metadata::BuildMetaData;
pub use prerelease::PreReleaseTag;
pub use tag::VersionTag;
pub use version::{SemanticVersion, VersionField};
