// SPDX-License-Identifier: MIT OR Apache-2.0
//! Structural checks over a state machine graph.

use crate::graph::Graph;
use crate::node::{NodeId, NodeKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Kind of structural problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Non-entry state with no incoming transition
    Unreachable,
    /// Non-terminal state with no outgoing transition
    DeadEnd,
}

/// One problem found by [`validate`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// What is wrong
    pub kind: IssueKind,
    /// Offending node
    pub node: NodeId,
    /// Its label at validation time
    pub label: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            IssueKind::Unreachable => write!(f, "State '{}' is unreachable", self.label),
            IssueKind::DeadEnd => write!(f, "State '{}' is a dead end", self.label),
        }
    }
}

/// Outcome of a validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Issues, unreachable states first, each group in node order
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// No issues were found
    pub fn passed(&self) -> bool {
        self.issues.is_empty()
    }

    /// Human-readable issue lines
    pub fn messages(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }

    /// Issues of one kind
    pub fn of_kind(&self, kind: IssueKind) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |issue| issue.kind == kind)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.passed() {
            return f.write_str("FSM is valid");
        }
        write!(f, "Found {} issue(s): {}", self.issues.len(), self.messages().join("; "))
    }
}

/// Check for unreachable states and dead ends.
///
/// Pure function of the graph; running it twice gives the same report.
pub fn validate(graph: &Graph) -> ValidationReport {
    let targets: HashSet<&NodeId> = graph.edges().map(|e| &e.target).collect();
    let sources: HashSet<&NodeId> = graph.edges().map(|e| &e.source).collect();

    let unreachable = graph
        .nodes()
        .filter(|n| n.kind != NodeKind::Input && !targets.contains(&n.id))
        .map(|n| ValidationIssue {
            kind: IssueKind::Unreachable,
            node: n.id.clone(),
            label: n.label.clone(),
        });

    let dead_ends = graph
        .nodes()
        .filter(|n| n.kind != NodeKind::Output && !sources.contains(&n.id))
        .map(|n| ValidationIssue {
            kind: IssueKind::DeadEnd,
            node: n.id.clone(),
            label: n.label.clone(),
        });

    ValidationReport {
        issues: unreachable.chain(dead_ends).collect(),
    }
}
