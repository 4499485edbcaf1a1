//! Walk-ordered view of the commit graph grouped by branch segment

use crate::domain::{MergeMessage, MergeMessageFormat, VersionField};
use crate::error::Result;
use crate::git::{BranchInfo, CommitInfo, Repository};
use crate::policy::{resolve_increment, BranchPolicyResolver, EffectiveConfiguration};
use git2::Oid;
use regex::Regex;
use std::collections::HashMap;

/// One commit inside an iteration
#[derive(Debug, Clone)]
pub struct MainlineCommit {
    pub id: Oid,
    /// Index of the previous commit in the same iteration
    pub predecessor: Option<usize>,
    /// Index of the next commit in the same iteration
    pub successor: Option<usize>,
    /// Iteration of a branch that forked earlier and was merged here
    pub child_iteration: Option<usize>,
    pub branch_name: String,
}

/// A contiguous branch segment, oldest commit first
#[derive(Debug, Clone)]
pub struct MainlineIteration {
    pub branch_name: String,
    pub policy: EffectiveConfiguration,
    /// Concrete increment for this segment (`Inherit` already resolved)
    pub increment: VersionField,
    pub label: String,
    pub commits: Vec<MainlineCommit>,
    pub is_trunk: bool,
}

/// Arena of iterations plus the order in which they are walked
#[derive(Debug, Clone)]
pub struct MainlineGraph {
    pub iterations: Vec<MainlineIteration>,
    /// Iterations on the path to HEAD, in walk order
    pub walk: Vec<usize>,
    pub commits: HashMap<Oid, CommitInfo>,
}

/// Inputs needed to build the graph
pub struct GraphInputs<'a> {
    pub repo: &'a dyn Repository,
    pub resolver: &'a BranchPolicyResolver,
    /// Policy of the branch being versioned, increment already resolved
    pub policy: &'a EffectiveConfiguration,
    pub increment: VersionField,
    pub head: Oid,
    pub branches: &'a [BranchInfo],
    pub merge_formats: &'a [MergeMessageFormat],
    pub tag_prefix: &'a Regex,
}

impl MainlineGraph {
    /// Split the history of HEAD into a trunk segment and, when HEAD is not
    /// on a main branch, the segment of the current branch after its fork
    /// point. Every merge on the trunk gets a child iteration for the
    /// merged branch.
    pub fn build(inputs: &GraphInputs<'_>) -> Result<Self> {
        let mut graph = MainlineGraph {
            iterations: Vec::new(),
            walk: Vec::new(),
            commits: HashMap::new(),
        };

        let main_branch = if inputs.policy.is_main_branch {
            None
        } else {
            nearest_main_branch(inputs)?
        };

        match main_branch {
            None => {
                let chain = graph.chain(inputs, None, inputs.head)?;
                let label = inputs.policy.label()?;
                let trunk = graph.push_iteration(
                    inputs,
                    inputs.policy.clone(),
                    inputs.increment,
                    label,
                    chain,
                    true,
                )?;
                graph.walk.push(trunk);
            }
            Some((main, fork_point)) => {
                let main_policy = inputs.resolver.resolve(&main.name)?;
                let main_increment = resolve_increment(
                    inputs.repo,
                    inputs.resolver,
                    &main_policy,
                    main.tip,
                    inputs.branches,
                )?;
                let main_label = main_policy.label()?;
                let trunk_chain = graph.chain(inputs, None, fork_point)?;
                let trunk = graph.push_iteration(
                    inputs,
                    main_policy,
                    main_increment,
                    main_label,
                    trunk_chain,
                    true,
                )?;
                graph.walk.push(trunk);

                let branch_chain = graph.chain(inputs, Some(fork_point), inputs.head)?;
                if !branch_chain.is_empty() {
                    let label = inputs.policy.label()?;
                    let segment = graph.push_iteration(
                        inputs,
                        inputs.policy.clone(),
                        inputs.increment,
                        label,
                        branch_chain,
                        false,
                    )?;
                    graph.walk.push(segment);
                }
            }
        }

        tracing::debug!(
            iterations = graph.iterations.len(),
            walked = graph.walk.len(),
            "Built mainline graph"
        );
        Ok(graph)
    }

    /// First-parent chain from `to` back to (excluding) `from`, oldest first
    fn chain(&mut self, inputs: &GraphInputs<'_>, from: Option<Oid>, to: Oid) -> Result<Vec<Oid>> {
        let mut commits = inputs.repo.commits_between(from, to, true)?;
        commits.reverse();
        Ok(commits
            .into_iter()
            .map(|c| {
                let id = c.id;
                self.commits.insert(id, c);
                id
            })
            .collect())
    }

    fn push_iteration(
        &mut self,
        inputs: &GraphInputs<'_>,
        policy: EffectiveConfiguration,
        increment: VersionField,
        label: String,
        chain: Vec<Oid>,
        is_trunk: bool,
    ) -> Result<usize> {
        let branch_name = policy.branch_name.clone();
        let len = chain.len();
        let mut commits: Vec<MainlineCommit> = chain
            .iter()
            .enumerate()
            .map(|(idx, id)| MainlineCommit {
                id: *id,
                predecessor: idx.checked_sub(1),
                successor: (idx + 1 < len).then_some(idx + 1),
                child_iteration: None,
                branch_name: branch_name.clone(),
            })
            .collect();

        if is_trunk {
            for commit in commits.iter_mut() {
                let info = &self.commits[&commit.id];
                if info.parents.len() >= 2 {
                    let (mainline, merged) = (info.parents[0], info.parents[1]);
                    let message = info.message.clone();
                    commit.child_iteration =
                        Some(self.push_child(inputs, &message, mainline, merged, increment)?);
                }
            }
        }

        self.iterations.push(MainlineIteration {
            branch_name,
            policy,
            increment,
            label,
            commits,
            is_trunk,
        });
        Ok(self.iterations.len() - 1)
    }

    /// Iteration for the branch merged by a trunk merge commit
    fn push_child(
        &mut self,
        inputs: &GraphInputs<'_>,
        message: &str,
        mainline: Oid,
        merged: Oid,
        trunk_increment: VersionField,
    ) -> Result<usize> {
        let name = MergeMessage::parse(message, inputs.merge_formats, inputs.tag_prefix)
            .map(|m| m.merged_branch)
            .or_else(|| {
                inputs
                    .branches
                    .iter()
                    .find(|b| b.tip == merged)
                    .map(|b| b.name.clone())
            })
            .unwrap_or_else(|| "unknown".to_string());

        let policy = inputs.resolver.resolve(&name)?;
        let increment = policy.increment.field().unwrap_or(trunk_increment);
        let label = policy.label().unwrap_or_default();
        let chain = self.chain(inputs, Some(mainline), merged)?;
        let len = chain.len();
        let commits = chain
            .iter()
            .enumerate()
            .map(|(idx, id)| MainlineCommit {
                id: *id,
                predecessor: idx.checked_sub(1),
                successor: (idx + 1 < len).then_some(idx + 1),
                child_iteration: None,
                branch_name: name.clone(),
            })
            .collect();

        self.iterations.push(MainlineIteration {
            branch_name: name,
            policy,
            increment,
            label,
            commits,
            is_trunk: false,
        });
        Ok(self.iterations.len() - 1)
    }

    pub fn commit(&self, id: Oid) -> Option<&CommitInfo> {
        self.commits.get(&id)
    }
}

/// The main-type branch HEAD forked from most recently, with the fork point
fn nearest_main_branch<'a>(inputs: &GraphInputs<'a>) -> Result<Option<(&'a BranchInfo, Oid)>> {
    let mut best: Option<(usize, &BranchInfo, Oid)> = None;
    for branch in inputs.branches {
        if branch.name == inputs.policy.branch_name {
            continue;
        }
        let policy = inputs.resolver.resolve(&branch.name)?;
        if !policy.is_main_branch {
            continue;
        }
        let Some(fork_point) = inputs.repo.fork_point(inputs.head, branch.tip)? else {
            continue;
        };
        let distance = inputs
            .repo
            .commits_between(Some(fork_point), inputs.head, true)?
            .len();
        let better = match &best {
            None => true,
            Some((d, b, _)) => (distance, &branch.name) < (*d, &b.name),
        };
        if better {
            best = Some((distance, branch, fork_point));
        }
    }
    Ok(best.map(|(_, branch, fork)| (branch, fork)))
}

