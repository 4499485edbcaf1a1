use crate::domain::branch::friendly_name;
use crate::error::{GitStampError, Result};
use crate::git::{BranchInfo, CommitInfo, HeadInfo, Repository, TagInfo};
use chrono::{DateTime, Duration, Utc};
use git2::Oid;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

const EPOCH_SECONDS: i64 = 1_700_000_000;

/// In-memory commit graph for tests and examples.
///
/// Commits get deterministic ids and strictly increasing timestamps (one
/// minute apart) in creation order. A fresh repository sits on an unborn
/// `main` branch.
#[derive(Debug, Clone)]
pub struct MockRepository {
    commits: HashMap<Oid, CommitInfo>,
    sequence: HashMap<Oid, usize>,
    branches: IndexMap<String, BranchInfo>,
    tags: Vec<TagInfo>,
    current_branch: Option<String>,
    detached: Option<Oid>,
}

fn mock_oid(seq: usize) -> Oid {
    let hex = format!("{:08x}{:032x}", seq + 1, 0);
    Oid::from_str(&hex).expect("40 hex digits form a valid object id")
}

impl MockRepository {
    /// Create an empty repository on an unborn `main`
    pub fn new() -> Self {
        Self::with_initial_branch("main")
    }

    /// Create an empty repository on an unborn branch of the given name
    pub fn with_initial_branch(name: &str) -> Self {
        MockRepository {
            commits: HashMap::new(),
            sequence: HashMap::new(),
            branches: IndexMap::new(),
            tags: Vec::new(),
            current_branch: Some(name.to_string()),
            detached: None,
        }
    }

    fn head_commit(&self) -> Option<Oid> {
        match (&self.detached, &self.current_branch) {
            (Some(id), _) => Some(*id),
            (None, Some(name)) => self
                .branches
                .get(&format!("refs/heads/{}", name))
                .map(|b| b.tip),
            (None, None) => None,
        }
    }

    fn add_commit(&mut self, message: &str, parents: Vec<Oid>) -> Oid {
        let seq = self.commits.len();
        let id = mock_oid(seq);
        let when = DateTime::<Utc>::from_timestamp(EPOCH_SECONDS, 0).unwrap_or_default()
            + Duration::minutes(seq as i64);

        self.commits.insert(
            id,
            CommitInfo {
                id,
                parents,
                message: message.to_string(),
                author: "Mock Author".to_string(),
                when,
            },
        );
        self.sequence.insert(id, seq);
        self.advance_head(id);
        id
    }

    fn advance_head(&mut self, id: Oid) {
        if self.detached.is_some() {
            self.detached = Some(id);
        } else if let Some(name) = self.current_branch.clone() {
            self.set_branch(&name, id, false);
        }
    }

    fn set_branch(&mut self, name: &str, tip: Oid, is_remote: bool) {
        let canonical_name = if is_remote {
            format!("refs/remotes/{}", name)
        } else {
            format!("refs/heads/{}", name)
        };
        let key = canonical_name.clone();
        self.branches.insert(
            key,
            BranchInfo {
                name: friendly_name(&canonical_name),
                canonical_name,
                tip,
                is_remote,
            },
        );
    }

    /// Commit on top of HEAD and advance the current branch
    pub fn commit(&mut self, message: &str) -> Oid {
        let parents = self.head_commit().into_iter().collect();
        self.add_commit(message, parents)
    }

    /// Commit with explicit parents, advancing HEAD to it
    pub fn commit_with_parents(&mut self, message: &str, parents: &[Oid]) -> Oid {
        self.add_commit(message, parents.to_vec())
    }

    /// Create (or move) a local branch at HEAD
    pub fn branch(&mut self, name: &str) {
        if let Some(tip) = self.head_commit() {
            self.set_branch(name, tip, false);
        }
    }

    /// Create (or move) a local branch at the given commit
    pub fn branch_at(&mut self, name: &str, tip: Oid) {
        self.set_branch(name, tip, false);
    }

    /// Create a remote-tracking branch such as `origin/feature/x`
    pub fn remote_branch(&mut self, name: &str, tip: Oid) {
        self.set_branch(name, tip, true);
    }

    /// Remove a local branch; its commits stay in the graph
    pub fn delete_branch(&mut self, name: &str) {
        self.branches.shift_remove(&format!("refs/heads/{}", name));
    }

    /// Switch HEAD to a local branch (which may be unborn)
    pub fn checkout(&mut self, name: &str) {
        self.current_branch = Some(name.to_string());
        self.detached = None;
    }

    /// Create a branch at HEAD and switch to it
    pub fn checkout_new(&mut self, name: &str) {
        self.branch(name);
        self.checkout(name);
    }

    /// Merge the tip of local branch `name` into HEAD with the given message
    pub fn merge(&mut self, name: &str, message: &str) -> Oid {
        let other = self
            .branches
            .get(&format!("refs/heads/{}", name))
            .map(|b| b.tip);
        let parents = self.head_commit().into_iter().chain(other).collect();
        self.add_commit(message, parents)
    }

    /// Tag HEAD
    pub fn tag(&mut self, name: &str) {
        if let Some(id) = self.head_commit() {
            self.tag_at(name, id);
        }
    }

    /// Tag a specific commit
    pub fn tag_at(&mut self, name: &str, target: Oid) {
        let target_time = self
            .commits
            .get(&target)
            .map(|c| c.when)
            .unwrap_or_default();
        self.tags.push(TagInfo {
            name: name.to_string(),
            target,
            target_time,
        });
    }

    /// Detach HEAD at a commit
    pub fn detach(&mut self, id: Oid) {
        self.detached = Some(id);
        self.current_branch = None;
    }

    fn get(&self, id: Oid) -> Result<&CommitInfo> {
        self.commits
            .get(&id)
            .ok_or_else(|| GitStampError::branch(format!("Commit not found: {}", id)))
    }

    fn ancestors(&self, start: Oid) -> HashSet<Oid> {
        let mut seen = HashSet::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(commit) = self.commits.get(&id) {
                stack.extend(commit.parents.iter().copied());
            }
        }
        seen
    }

    fn seq(&self, id: &Oid) -> usize {
        self.sequence.get(id).copied().unwrap_or_default()
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for MockRepository {
    fn head(&self) -> Result<HeadInfo> {
        let commit = self
            .head_commit()
            .ok_or_else(|| GitStampError::branch("Repository has no commits"))?;
        Ok(HeadInfo {
            branch: self.current_branch.clone(),
            commit,
        })
    }

    fn find_commit(&self, id: Oid) -> Result<CommitInfo> {
        self.get(id).cloned()
    }

    fn branches(&self) -> Result<Vec<BranchInfo>> {
        Ok(self.branches.values().cloned().collect())
    }

    fn tags(&self) -> Result<Vec<TagInfo>> {
        Ok(self.tags.clone())
    }

    fn merge_base(&self, a: Oid, b: Oid) -> Result<Option<Oid>> {
        self.get(a)?;
        self.get(b)?;
        let left = self.ancestors(a);
        Ok(self
            .ancestors(b)
            .into_iter()
            .filter(|id| left.contains(id))
            .max_by_key(|id| self.seq(id)))
    }

    fn commits_between(
        &self,
        from: Option<Oid>,
        to: Oid,
        first_parent_only: bool,
    ) -> Result<Vec<CommitInfo>> {
        let hidden = from.map(|id| self.ancestors(id)).unwrap_or_default();

        let mut ids: Vec<Oid> = if first_parent_only {
            let mut chain = Vec::new();
            let mut cursor = Some(to);
            while let Some(id) = cursor {
                if hidden.contains(&id) {
                    break;
                }
                chain.push(id);
                cursor = self.get(id)?.parents.first().copied();
            }
            chain
        } else {
            self.ancestors(to)
                .into_iter()
                .filter(|id| !hidden.contains(id))
                .collect()
        };

        ids.sort_by_key(|id| std::cmp::Reverse(self.seq(id)));
        ids.into_iter().map(|id| self.find_commit(id)).collect()
    }
}
