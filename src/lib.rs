//! Deterministic semantic versions from git history and branch policy.
//!
//! ```rust
//! use git_stamp::config::GitStampConfig;
//! use git_stamp::engine::{calculate_version, CalculateOptions};
//! use git_stamp::git::MockRepository;
//!
//! let mut repo = MockRepository::new();
//! repo.commit("initial");
//! repo.tag("1.2.0");
//! repo.commit("fix a bug");
//!
//! let result = calculate_version(&repo, &GitStampConfig::default(), &CalculateOptions::default())
//!     .unwrap();
//! assert_eq!(result.version.to_string(), "1.2.1-ci.1");
//! ```

pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod git;
pub mod mainline;
pub mod observability;
pub mod policy;
pub mod strategy;
pub mod ui;

pub use engine::{calculate_version, CalculateOptions, VersionResult};
pub use error::{GitStampError, Result};
