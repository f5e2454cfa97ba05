// SPDX-License-Identifier: MIT OR Apache-2.0
//! Snapshot-based undo/redo history.
//!
//! Each entry is a full, independent copy of the (nodes, edges) pair. The
//! cursor points at the entry matching the live graph; undo and redo move it
//! and hand back a fresh clone for the caller to write into the store.

use fsm_editor_graph::{Edge, Graph, GraphParts, Node};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Maximum undo history depth
pub const MAX_HISTORY: usize = 50;

/// Full copy of the graph at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Nodes in order
    pub nodes: Vec<Node>,
    /// Edges in order
    pub edges: Vec<Edge>,
    /// What produced this state
    pub description: String,
    /// Seconds since the epoch when captured
    pub timestamp: u64,
}

impl GraphSnapshot {
    /// Deep-copy a graph
    pub fn capture(graph: &Graph, description: impl Into<String>) -> Self {
        let GraphParts { nodes, edges } = graph.to_parts();
        Self {
            nodes,
            edges,
            description: description.into(),
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        }
    }

    /// Same (nodes, edges) content as `graph`
    pub fn matches(&self, graph: &Graph) -> bool {
        let parts = graph.to_parts();
        parts.nodes == self.nodes && parts.edges == self.edges
    }
}

/// History statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryStats {
    /// Entries before the cursor
    pub undo_count: usize,
    /// Entries after the cursor
    pub redo_count: usize,
    /// Total entries
    pub len: usize,
    /// Maximum history depth
    pub max_depth: usize,
}

/// Undo/redo history manager
#[derive(Debug)]
pub struct History {
    entries: Vec<GraphSnapshot>,
    /// Index of the entry matching the live graph; -1 only when empty
    cursor: isize,
    max_depth: usize,
    replaying: bool,
}

impl History {
    /// Create an empty history manager
    pub fn new() -> Self {
        Self::with_max_depth(MAX_HISTORY)
    }

    /// Create with custom maximum depth
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: -1,
            max_depth: max_depth.max(1),
            replaying: false,
        }
    }

    /// Create with one initial entry
    pub fn with_initial(snapshot: GraphSnapshot) -> Self {
        let mut history = Self::new();
        history.reset(snapshot);
        history
    }

    /// Drop everything and start over from one entry
    pub fn reset(&mut self, snapshot: GraphSnapshot) {
        self.entries.clear();
        self.entries.push(snapshot);
        self.cursor = 0;
        self.replaying = false;
    }

    /// Record a new state.
    ///
    /// Ignored while an undo/redo is being applied. Discards the redo branch
    /// and evicts the oldest entry once the cap is exceeded.
    pub fn push(&mut self, snapshot: GraphSnapshot) {
        if self.replaying {
            tracing::trace!("History push ignored during replay");
            return;
        }

        self.entries.truncate((self.cursor + 1) as usize);
        self.entries.push(snapshot);

        while self.entries.len() > self.max_depth {
            self.entries.remove(0);
        }
        self.cursor = self.entries.len() as isize - 1;
    }

    /// Step back one entry, returning a copy to restore
    pub fn undo(&mut self) -> Option<GraphSnapshot> {
        if self.cursor <= 0 {
            return None;
        }
        self.cursor -= 1;
        self.current().cloned()
    }

    /// Step forward one entry, returning a copy to restore
    pub fn redo(&mut self) -> Option<GraphSnapshot> {
        if self.cursor >= self.entries.len() as isize - 1 {
            return None;
        }
        self.cursor += 1;
        self.current().cloned()
    }

    /// Hold the replay guard while a restored snapshot is written back.
    /// Pushes made until [`History::end_replay`] are dropped.
    pub fn begin_replay(&mut self) {
        self.replaying = true;
    }

    /// Release the replay guard
    pub fn end_replay(&mut self) {
        self.replaying = false;
    }

    /// Whether a replay is in progress
    pub fn is_replaying(&self) -> bool {
        self.replaying
    }

    /// Entry under the cursor
    pub fn current(&self) -> Option<&GraphSnapshot> {
        usize::try_from(self.cursor).ok().and_then(|i| self.entries.get(i))
    }

    /// Entry at `index`
    pub fn get(&self, index: usize) -> Option<&GraphSnapshot> {
        self.entries.get(index)
    }

    /// Cursor position, `-1` when empty
    pub fn cursor(&self) -> isize {
        self.cursor
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len() as isize - 1
    }

    /// Description of the change an undo would revert
    pub fn undo_description(&self) -> Option<&str> {
        if !self.can_undo() {
            return None;
        }
        self.current().map(|s| s.description.as_str())
    }

    /// Description of the change a redo would re-apply
    pub fn redo_description(&self) -> Option<&str> {
        if !self.can_redo() {
            return None;
        }
        self.entries
            .get((self.cursor + 1) as usize)
            .map(|s| s.description.as_str())
    }

    /// Get history statistics
    pub fn stats(&self) -> HistoryStats {
        let len = self.entries.len();
        let undo_count = self.cursor.max(0) as usize;
        HistoryStats {
            undo_count,
            redo_count: len.saturating_sub(undo_count + 1),
            len,
            max_depth: self.max_depth,
        }
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
