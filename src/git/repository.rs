use crate::domain::branch::friendly_name;
use crate::error::{GitStampError, Result};
use crate::git::{BranchInfo, CommitInfo, HeadInfo, TagInfo};
use chrono::{DateTime, Utc};
use git2::{BranchType, ErrorCode, Oid, Repository as Git2Repo, Sort};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Mutex<Git2Repo>,
    workdir: Option<PathBuf>,
}

fn to_utc(time: git2::Time) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(time.seconds(), 0).unwrap_or_default()
}

fn to_commit_info(commit: &git2::Commit<'_>) -> CommitInfo {
    CommitInfo {
        id: commit.id(),
        parents: commit.parent_ids().collect(),
        message: commit.message().unwrap_or("(empty message)").to_string(),
        author: commit.author().name().unwrap_or("unknown").to_string(),
        when: to_utc(commit.time()),
    }
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;
        Ok(Self::from_git2(repo))
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        let workdir = repo.workdir().map(Path::to_path_buf);
        Git2Repository {
            repo: Mutex::new(repo),
            workdir,
        }
    }

    /// Working directory root, `None` for bare repositories
    pub fn workdir(&self) -> Option<&Path> {
        self.workdir.as_deref()
    }
}

impl super::Repository for Git2Repository {
    fn head(&self) -> Result<HeadInfo> {
        let repo = self.repo.lock();
        let head = repo
            .head()
            .map_err(|e| GitStampError::branch(format!("Cannot resolve HEAD: {}", e)))?;
        let commit = head.peel_to_commit()?.id();

        let branch = if repo.head_detached()? {
            None
        } else {
            head.name().map(friendly_name)
        };

        Ok(HeadInfo { branch, commit })
    }

    fn find_commit(&self, id: Oid) -> Result<CommitInfo> {
        let repo = self.repo.lock();
        let commit = repo
            .find_commit(id)
            .map_err(|e| GitStampError::branch(format!("Cannot find commit {}: {}", id, e)))?;
        Ok(to_commit_info(&commit))
    }

    fn branches(&self) -> Result<Vec<BranchInfo>> {
        let repo = self.repo.lock();
        let mut branches = Vec::new();

        for entry in repo.branches(None)? {
            let (branch, kind) = entry?;
            let reference = branch.get();
            let Some(canonical_name) = reference.name() else {
                continue;
            };
            if canonical_name.ends_with("/HEAD") {
                continue;
            }
            let Ok(tip) = reference.peel_to_commit().map(|c| c.id()) else {
                tracing::debug!(branch = canonical_name, "Skipping branch without a commit");
                continue;
            };

            branches.push(BranchInfo {
                name: friendly_name(canonical_name),
                canonical_name: canonical_name.to_string(),
                tip,
                is_remote: kind == BranchType::Remote,
            });
        }

        branches.sort_by(|a, b| a.canonical_name.cmp(&b.canonical_name));
        Ok(branches)
    }

    fn tags(&self) -> Result<Vec<TagInfo>> {
        let repo = self.repo.lock();
        let names = repo.tag_names(None)?;
        let mut tags = Vec::new();

        for name in names.iter().flatten() {
            let reference = repo.find_reference(&format!("refs/tags/{}", name))?;
            match reference.peel_to_commit() {
                Ok(commit) => tags.push(TagInfo {
                    name: name.to_string(),
                    target: commit.id(),
                    target_time: to_utc(commit.time()),
                }),
                Err(_) => tracing::trace!(tag = name, "Tag does not point at a commit"),
            }
        }

        Ok(tags)
    }

    fn merge_base(&self, a: Oid, b: Oid) -> Result<Option<Oid>> {
        let repo = self.repo.lock();
        match repo.merge_base(a, b) {
            Ok(oid) => Ok(Some(oid)),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn commits_between(
        &self,
        from: Option<Oid>,
        to: Oid,
        first_parent_only: bool,
    ) -> Result<Vec<CommitInfo>> {
        let repo = self.repo.lock();
        let mut revwalk = repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        if first_parent_only {
            revwalk.simplify_first_parent()?;
        }
        revwalk.push(to)?;
        if let Some(from) = from {
            revwalk.hide(from)?;
        }

        let mut commits = Vec::new();
        for oid in revwalk {
            let commit = repo.find_commit(oid?)?;
            commits.push(to_commit_info(&commit));
        }
        Ok(commits)
    }
}
