//! Read-only commit graph access
//!
//! The version engine only ever reads from the repository. Everything it
//! needs goes through the [Repository] trait so scenarios can be built in
//! memory with [MockRepository] and real repositories are read through
//! [Git2Repository].
//!
//! ```rust
//! use git_stamp::git::{MockRepository, Repository};
//!
//! let mut repo = MockRepository::new();
//! let first = repo.commit("initial");
//! let second = repo.commit("second");
//!
//! assert_eq!(repo.head().unwrap().commit, second);
//! assert!(repo.is_ancestor(first, second).unwrap());
//! ```

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::error::Result;
use chrono::{DateTime, Utc};
use git2::Oid;

/// A commit as the engine sees it
#[derive(Debug, Clone, PartialEq)]
pub struct CommitInfo {
    pub id: Oid,
    /// Parent ids in order; the first parent is the mainline
    pub parents: Vec<Oid>,
    pub message: String,
    pub author: String,
    pub when: DateTime<Utc>,
}

impl CommitInfo {
    pub fn sha(&self) -> String {
        self.id.to_string()
    }

    pub fn short_sha(&self) -> String {
        short_sha(self.id)
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() >= 2
    }

    /// First line of the message
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }
}

/// Seven-character abbreviation of a commit id
pub fn short_sha(id: Oid) -> String {
    id.to_string().chars().take(7).collect()
}

/// A local or remote-tracking branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchInfo {
    /// Friendly name with `refs/heads/` or `refs/remotes/<remote>/` stripped
    pub name: String,
    pub canonical_name: String,
    pub tip: Oid,
    pub is_remote: bool,
}

/// A tag peeled to the commit it points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagInfo {
    pub name: String,
    pub target: Oid,
    /// Commit time of the tagged commit
    pub target_time: DateTime<Utc>,
}

/// Where HEAD points
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadInfo {
    /// Friendly branch name, `None` when detached
    pub branch: Option<String>,
    pub commit: Oid,
}

/// Read-only view of a commit graph
///
/// All implementors must be `Send + Sync`: base version strategies query the
/// same accessor from several threads at once.
pub trait Repository: Send + Sync {
    /// Current HEAD
    fn head(&self) -> Result<HeadInfo>;

    /// Look up one commit
    fn find_commit(&self, id: Oid) -> Result<CommitInfo>;

    /// Every local and remote-tracking branch (remote `HEAD` refs excluded)
    fn branches(&self) -> Result<Vec<BranchInfo>>;

    /// Every tag that peels to a commit
    fn tags(&self) -> Result<Vec<TagInfo>>;

    /// Best common ancestor of two commits, `None` for unrelated histories
    fn merge_base(&self, a: Oid, b: Oid) -> Result<Option<Oid>>;

    /// Commits reachable from `to` but not from `from`, newest first.
    ///
    /// With `first_parent_only` the walk from `to` follows first parents
    /// only; `from` and its ancestors are still fully excluded.
    fn commits_between(
        &self,
        from: Option<Oid>,
        to: Oid,
        first_parent_only: bool,
    ) -> Result<Vec<CommitInfo>>;

    /// True when `ancestor` is reachable from `descendant` (or equal to it)
    fn is_ancestor(&self, ancestor: Oid, descendant: Oid) -> Result<bool> {
        if ancestor == descendant {
            return Ok(true);
        }
        Ok(self.merge_base(ancestor, descendant)? == Some(ancestor))
    }

    /// Where `tip` left the history of a source branch whose tip is
    /// `source_tip`, `None` for unrelated histories.
    ///
    /// Usually the merge base. When the source branch already contains `tip`
    /// through a merge, the merge base is `tip` itself; the fork point is
    /// then the newest commit on the source's first-parent chain that `tip`
    /// can reach. A result equal to `tip` means the source branch was built
    /// on top of `tip` along its own first parents.
    fn fork_point(&self, tip: Oid, source_tip: Oid) -> Result<Option<Oid>> {
        let base = self.merge_base(tip, source_tip)?;
        if base != Some(tip) || source_tip == tip {
            return Ok(base);
        }
        let reachable: std::collections::HashSet<Oid> = self
            .commits_between(None, tip, false)?
            .into_iter()
            .map(|c| c.id)
            .collect();
        Ok(self
            .commits_between(None, source_tip, true)?
            .into_iter()
            .map(|c| c.id)
            .find(|id| reachable.contains(id))
            .or(base))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_sha() {
        let id = Oid::from_str("0123456789abcdef0123456789abcdef01234567").unwrap();
        assert_eq!(short_sha(id), "0123456");
    }

    #[test]
    fn test_commit_summary_and_merge() {
        let commit = CommitInfo {
            id: Oid::zero(),
            parents: vec![Oid::zero(), Oid::zero()],
            message: "Merge branch 'x'\n\nbody".to_string(),
            author: "someone".to_string(),
            when: DateTime::<Utc>::default(),
        };
        assert_eq!(commit.summary(), "Merge branch 'x'");
        assert!(commit.is_merge());
    }
}
