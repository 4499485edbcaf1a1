//! Trunk-based ("mainline") version calculation
//!
//! The history of HEAD is split into branch segments ([graph]) and walked
//! oldest commit first. At every commit the highest-precedence matching
//! [MainlineRule] emits operations: operands adopt a tagged version,
//! operators derive the next version from the running one. The walk is
//! strictly sequential.

pub mod graph;
pub mod rules;

pub use graph::{GraphInputs, MainlineCommit, MainlineGraph, MainlineIteration};
pub use rules::{MainlineRule, Operation, RuleContext};

use crate::config::CommitMessageIncrementMode;
use crate::domain::{IncrementMarkers, SemanticVersion, VersionField, VersionTag};
use crate::engine::CancellationToken;
use crate::error::Result;
use git2::Oid;
use regex::Regex;

/// Outcome of a mainline walk
#[derive(Debug, Clone, PartialEq)]
pub struct MainlineResult {
    pub version: SemanticVersion,
    /// Commit the final version is counted from
    pub source: Option<Oid>,
    /// Rule that fired at HEAD
    pub rule: MainlineRule,
    /// Increment applied last, `None` when an operand was adopted at the end
    pub increment: Option<VersionField>,
    pub description: String,
}

#[derive(Debug, Clone)]
struct PendingOperator {
    increment: VersionField,
    label: String,
    source: Oid,
}

/// Accumulated walk state
#[derive(Debug)]
struct Accumulator {
    current: SemanticVersion,
    source: Option<Oid>,
    pending: Option<PendingOperator>,
    alternatives: Vec<(SemanticVersion, Oid)>,
}

impl Accumulator {
    fn new() -> Self {
        Accumulator {
            current: SemanticVersion::new(0, 0, 0),
            source: None,
            pending: None,
            alternatives: Vec::new(),
        }
    }

    /// Apply the deferred operator. The version it produces is counted from
    /// the commit that operator was observed on.
    fn flush(&mut self) {
        if let Some(op) = self.pending.take() {
            self.current = apply_operator(&self.current, op.increment, &op.label);
            self.source = Some(op.source);
        }
    }

    fn push(&mut self, operation: Operation) {
        match operation {
            Operation::Operand { version, source } => {
                self.current = version;
                self.source = Some(source);
                self.pending = None;
            }
            Operation::Operator {
                increment,
                label,
                source,
            } => {
                self.flush();
                self.pending = Some(PendingOperator {
                    increment,
                    label,
                    source,
                });
            }
            Operation::Alternative { version, source } => {
                self.alternatives.push((version, source));
            }
        }
    }
}

/// Derive the next version: a matching pre-release only bumps its number,
/// a label on a stable version with no increment starts the next patch.
pub fn apply_operator(current: &SemanticVersion, increment: VersionField, label: &str) -> SemanticVersion {
    let label = label.trim();
    if !label.is_empty() && current.has_label(label) {
        return current.increment(VersionField::None, Some(label));
    }
    match increment {
        VersionField::None if current.is_stable() && !label.is_empty() => {
            current.increment(VersionField::Patch, Some(label))
        }
        VersionField::None => current.increment(VersionField::None, None),
        field => current.increment(field, Some(label)),
    }
}

/// Walks a [MainlineGraph] applying the rules
pub struct MainlineCalculator<'a> {
    pub graph: &'a MainlineGraph,
    pub tags: &'a [VersionTag],
    pub markers: &'a IncrementMarkers,
    pub message_mode: CommitMessageIncrementMode,
    pub tag_prefix: &'a Regex,
}

impl MainlineCalculator<'_> {
    pub fn calculate(&self, cancellation: &CancellationToken) -> Result<MainlineResult> {
        let ctx = RuleContext {
            graph: self.graph,
            tags: self.tags,
            markers: self.markers,
            message_mode: self.message_mode,
            tag_prefix: self.tag_prefix,
        };

        let mut acc = Accumulator::new();
        let mut last_rule = MainlineRule::PlainCommit;

        for &iteration_idx in &self.graph.walk {
            let iteration = &self.graph.iterations[iteration_idx];
            for commit in &iteration.commits {
                cancellation.check()?;
                let rule = MainlineRule::first_match(iteration, commit, &ctx);
                let operations = rule.apply(iteration, commit, &ctx);
                tracing::debug!(
                    commit = %crate::git::short_sha(commit.id),
                    branch = %commit.branch_name,
                    rule = %rule,
                    operations = operations.len(),
                    "Mainline step"
                );
                for operation in operations {
                    acc.push(operation);
                }
                last_rule = rule;
            }
        }

        let increment = acc.pending.as_ref().map(|p| p.increment);
        if let Some(op) = acc.pending.take() {
            acc.current = apply_operator(&acc.current, op.increment, &op.label);
        }

        let mut version = acc.current;
        let mut source = acc.source;
        let mut description = format!("Mainline walk ending in {}", last_rule);
        if let Some((alt, alt_source)) = acc.alternatives.into_iter().max_by(|a, b| a.0.cmp(&b.0)) {
            if alt > version {
                tracing::debug!(alternative = %alt, "Merged release version wins");
                version = alt;
                source = Some(alt_source);
                description.push_str(" (merged release branch version)");
            }
        }

        Ok(MainlineResult {
            version,
            source,
            rule: last_rule,
            increment,
            description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(text: &str) -> SemanticVersion {
        SemanticVersion::parse(text, None).unwrap()
    }

    #[test]
    fn test_apply_operator_same_label_bumps_number() {
        assert_eq!(
            apply_operator(&v("1.1.0-alpha.1"), VersionField::Minor, "alpha").to_string(),
            "1.1.0-alpha.2"
        );
    }

    #[test]
    fn test_apply_operator_new_label_resets() {
        assert_eq!(
            apply_operator(&v("1.1.0-alpha.3"), VersionField::Minor, "beta").to_string(),
            "1.2.0-beta.1"
        );
        assert_eq!(
            apply_operator(&v("1.0.0"), VersionField::Patch, "").to_string(),
            "1.0.1"
        );
    }

    #[test]
    fn test_apply_operator_no_increment_with_label() {
        assert_eq!(
            apply_operator(&v("2.0.0"), VersionField::None, "rc").to_string(),
            "2.0.1-rc.1"
        );
        assert_eq!(
            apply_operator(&v("2.0.0"), VersionField::None, "").to_string(),
            "2.0.0"
        );
    }

    #[test]
    fn test_accumulator_counts_from_previous_operator() {
        let a = Oid::from_bytes(&[1; 20]).unwrap();
        let b = Oid::from_bytes(&[2; 20]).unwrap();
        let m = Oid::from_bytes(&[3; 20]).unwrap();

        let mut acc = Accumulator::new();
        acc.push(Operation::Operand {
            version: v("1.0.0"),
            source: a,
        });
        acc.push(Operation::Operator {
            increment: VersionField::Patch,
            label: String::new(),
            source: b,
        });
        acc.push(Operation::Operator {
            increment: VersionField::Minor,
            label: String::new(),
            source: m,
        });

        assert_eq!(acc.current.to_string(), "1.0.1");
        assert_eq!(acc.source, Some(b));
        assert_eq!(acc.pending.as_ref().map(|p| p.increment), Some(VersionField::Minor));
    }

    #[test]
    fn test_operand_clears_pending() {
        let a = Oid::from_bytes(&[1; 20]).unwrap();
        let b = Oid::from_bytes(&[2; 20]).unwrap();
        let mut acc = Accumulator::new();
        acc.push(Operation::Operator {
            increment: VersionField::Major,
            label: String::new(),
            source: a,
        });
        acc.push(Operation::Operand {
            version: v("3.0.0"),
            source: b,
        });
        assert!(acc.pending.is_none());
        assert_eq!(acc.current, v("3.0.0"));
    }
}
