// SPDX-License-Identifier: MIT OR Apache-2.0
//! Context snapshots mirrored to an external agent.
//!
//! The mirror only ever needs the newest diagram, so publication goes through
//! a `tokio::sync::watch` channel: each publish overwrites the previous value
//! and slow receivers skip straight to the latest one.

use fsm_editor_graph::{Graph, NodeId};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// A node as the agent sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextNode {
    /// Node id
    pub id: String,
    /// Display label
    pub label: String,
    /// Kind name
    pub node_type: String,
    /// Graph x
    pub x: f32,
    /// Graph y
    pub y: f32,
    /// Entry code, if any
    pub entry_action: Option<String>,
}

/// An edge as the agent sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEdge {
    /// Edge id
    pub id: String,
    /// Source node id
    pub source: String,
    /// Target node id
    pub target: String,
    /// Transition label, if any
    pub label: Option<String>,
}

/// Informational picture of the diagram pushed on every change
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextSnapshot {
    /// All nodes in order
    pub nodes: Vec<ContextNode>,
    /// All edges in order
    pub edges: Vec<ContextEdge>,
    /// Selected node id
    pub selected_node: Option<String>,
    /// Store revision this snapshot was taken at
    #[serde(skip)]
    pub revision: u64,
}

impl ContextSnapshot {
    /// Build a snapshot of the graph and selection
    pub fn capture(graph: &Graph, selection: Option<&NodeId>, revision: u64) -> Self {
        Self {
            nodes: graph
                .nodes()
                .map(|n| ContextNode {
                    id: n.id.to_string(),
                    label: n.label.clone(),
                    node_type: n.kind.as_str().to_string(),
                    x: n.x,
                    y: n.y,
                    entry_action: n.entry_action.clone(),
                })
                .collect(),
            edges: graph
                .edges()
                .map(|e| ContextEdge {
                    id: e.id.to_string(),
                    source: e.source.to_string(),
                    target: e.target.to_string(),
                    label: e.label.clone(),
                })
                .collect(),
            selected_node: selection.map(ToString::to_string),
            revision,
        }
    }
}

/// Latest-wins publisher of [`ContextSnapshot`]s
#[derive(Debug)]
pub struct ContextSync {
    sender: watch::Sender<ContextSnapshot>,
}

impl ContextSync {
    /// Create a publisher holding an initial snapshot
    pub fn new(initial: ContextSnapshot) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    /// Replace the current snapshot. Never blocks, never queues.
    pub fn publish(&self, snapshot: ContextSnapshot) {
        self.sender.send_replace(snapshot);
    }

    /// Subscribe to snapshot changes
    pub fn subscribe(&self) -> watch::Receiver<ContextSnapshot> {
        self.sender.subscribe()
    }

    /// Copy of the current snapshot
    pub fn latest(&self) -> ContextSnapshot {
        self.sender.borrow().clone()
    }

    /// Number of live receivers
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ContextSync {
    fn default() -> Self {
        Self::new(ContextSnapshot::default())
    }
}
