// SPDX-License-Identifier: MIT OR Apache-2.0
//! The single writable source of truth: graph, selection, and change listeners.
//!
//! Every write goes through a batch ([`GraphStore::mutate`] and friends).
//! Listeners run once per batch, after the selection has been pruned, so
//! derived views never observe a selection pointing at a deleted node.

use crate::edge::Edge;
use crate::graph::Graph;
use crate::node::{Node, NodeId};

/// Handle returned by [`GraphStore::on_graph_changed`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// View handed to listeners after each batch
#[derive(Debug, Clone, Copy)]
pub struct GraphChanged<'a> {
    /// The graph after the batch
    pub graph: &'a Graph,
    /// The selection after the batch
    pub selection: Option<&'a NodeId>,
    /// Monotonic change counter
    pub revision: u64,
}

type Listener = Box<dyn FnMut(GraphChanged<'_>) + Send>;

/// Graph store with reactive change notification
pub struct GraphStore {
    graph: Graph,
    selection: Option<NodeId>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
    revision: u64,
}

impl std::fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphStore")
            .field("graph", &self.graph)
            .field("selection", &self.selection)
            .field("listeners", &self.listeners.len())
            .field("revision", &self.revision)
            .finish()
    }
}

impl GraphStore {
    /// Create a store around an existing graph
    pub fn new(graph: Graph) -> Self {
        Self {
            graph,
            selection: None,
            listeners: Vec::new(),
            next_listener: 1,
            revision: 0,
        }
    }

    /// Read-only access to the graph
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Get a node by ID
    pub fn get_node(&self, node_id: &NodeId) -> Option<&Node> {
        self.graph.node(node_id)
    }

    /// Currently selected node
    pub fn selection(&self) -> Option<&NodeId> {
        self.selection.as_ref()
    }

    /// Number of completed batches
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Select a node. Unknown ids are ignored.
    pub fn select(&mut self, node_id: &NodeId) {
        if !self.graph.contains_node(node_id) {
            tracing::warn!("Cannot select missing node {node_id}");
            return;
        }
        if self.selection.as_ref() == Some(node_id) {
            return;
        }
        self.selection = Some(node_id.clone());
        self.notify();
    }

    /// Clear the selection
    pub fn deselect(&mut self) {
        if self.selection.take().is_some() {
            self.notify();
        }
    }

    /// Run one batch of writes against the graph, then notify listeners once.
    pub fn mutate<R>(&mut self, f: impl FnOnce(&mut Graph) -> R) -> R {
        let result = f(&mut self.graph);
        self.prune_selection();
        self.notify();
        result
    }

    /// Replace both collections in one batch. Returns the edges dropped for
    /// naming a node that is not in `nodes`.
    pub fn replace_all(&mut self, nodes: Vec<Node>, edges: Vec<Edge>) -> Vec<Edge> {
        self.mutate(|graph| graph.replace_all(nodes, edges))
    }

    /// Replace the node collection in one batch
    pub fn set_nodes(&mut self, nodes: Vec<Node>) {
        self.mutate(|graph| graph.set_nodes(nodes));
    }

    /// Replace the edge collection in one batch
    pub fn set_edges(&mut self, edges: Vec<Edge>) {
        self.mutate(|graph| graph.set_edges(edges));
    }

    /// Register a listener invoked after every batch
    pub fn on_graph_changed(
        &mut self,
        listener: impl FnMut(GraphChanged<'_>) + Send + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Unregister a listener. Returns `false` if it was not registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    fn prune_selection(&mut self) {
        let stale = self
            .selection
            .as_ref()
            .is_some_and(|id| !self.graph.contains_node(id));
        if stale {
            self.selection = None;
        }
    }

    fn notify(&mut self) {
        self.revision += 1;
        let change = GraphChanged {
            graph: &self.graph,
            selection: self.selection.as_ref(),
            revision: self.revision,
        };
        for (_, listener) in &mut self.listeners {
            listener(change);
        }
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new(Graph::seed())
    }
}
