// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure containing states and transitions.

use crate::edge::{Edge, EdgeId};
use crate::node::{Node, NodeId, NodeKind};
use egui::Pos2;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Plain (nodes, edges) pair used for snapshots and serialization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphParts {
    /// Nodes in insertion order
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Edges in insertion order
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// A state machine graph
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "GraphParts", into = "GraphParts")]
pub struct Graph {
    /// Nodes in the graph
    nodes: IndexMap<NodeId, Node>,
    /// Edges between nodes
    edges: IndexMap<EdgeId, Edge>,
    /// Next suffix handed out when resolving id conflicts
    next_suffix: u64,
}

impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        self.nodes.iter().eq(other.nodes.iter()) && self.edges.iter().eq(other.edges.iter())
    }
}

impl From<GraphParts> for Graph {
    fn from(parts: GraphParts) -> Self {
        let mut graph = Graph::new();
        graph.replace_all(parts.nodes, parts.edges);
        graph
    }
}

impl From<Graph> for GraphParts {
    fn from(graph: Graph) -> Self {
        graph.to_parts()
    }
}

impl Graph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self {
            nodes: IndexMap::new(),
            edges: IndexMap::new(),
            next_suffix: 1,
        }
    }

    /// The example machine every editor session starts with:
    /// `START -> INIT -> RUNNING -> END`.
    pub fn seed() -> Self {
        let nodes = vec![
            Node::new("start", "START", NodeKind::Input).with_position(250.0, 50.0),
            Node::new("init", "INIT", NodeKind::Process).with_position(250.0, 170.0),
            Node::new("running", "RUNNING", NodeKind::Process).with_position(250.0, 290.0),
            Node::new("end", "END", NodeKind::Output).with_position(250.0, 410.0),
        ];
        let edges = vec![
            Edge::new("start", "init").with_id("e_start_init"),
            Edge::new("init", "running").with_id("e_init_running"),
            Edge::new("running", "end").with_id("e_running_end"),
        ];
        let mut graph = Self::new();
        graph.replace_all(nodes, edges);
        graph
    }

    /// Add a node. Fails instead of overwriting an existing id.
    pub fn add_node(&mut self, node: Node) -> Result<NodeId, GraphError> {
        if self.nodes.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        let id = node.id.clone();
        self.nodes.insert(id.clone(), node);
        Ok(id)
    }

    /// Remove a node and every edge touching it
    pub fn remove_node(&mut self, node_id: &NodeId) -> Option<Node> {
        let node = self.nodes.shift_remove(node_id)?;
        self.edges.retain(|_, e| !e.involves_node(node_id));
        Some(node)
    }

    /// Get a node by ID
    pub fn node(&self, node_id: &NodeId) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    /// Get a mutable node by ID
    pub fn node_mut(&mut self, node_id: &NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(node_id)
    }

    /// Check whether a node exists
    pub fn contains_node(&self, node_id: &NodeId) -> bool {
        self.nodes.contains_key(node_id)
    }

    /// Get all nodes
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get all node IDs
    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Add an edge. Both endpoints must already exist.
    pub fn connect(&mut self, edge: Edge) -> Result<EdgeId, GraphError> {
        for endpoint in [&edge.source, &edge.target] {
            if !self.nodes.contains_key(endpoint) {
                return Err(GraphError::DanglingEndpoint(endpoint.clone()));
            }
        }
        if self.edges.contains_key(&edge.id) {
            return Err(GraphError::DuplicateEdge(edge.id));
        }
        let id = edge.id.clone();
        self.edges.insert(id.clone(), edge);
        Ok(id)
    }

    /// Remove an edge
    pub fn disconnect(&mut self, edge_id: &EdgeId) -> Option<Edge> {
        self.edges.shift_remove(edge_id)
    }

    /// Get an edge by ID
    pub fn edge(&self, edge_id: &EdgeId) -> Option<&Edge> {
        self.edges.get(edge_id)
    }

    /// Get a mutable edge by ID
    pub fn edge_mut(&mut self, edge_id: &EdgeId) -> Option<&mut Edge> {
        self.edges.get_mut(edge_id)
    }

    /// Check whether an edge exists
    pub fn contains_edge(&self, edge_id: &EdgeId) -> bool {
        self.edges.contains_key(edge_id)
    }

    /// Get all edges
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Get the number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edges leaving a node
    pub fn outgoing<'a>(&'a self, node_id: &'a NodeId) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.values().filter(move |e| e.source == *node_id)
    }

    /// Edges entering a node
    pub fn incoming<'a>(&'a self, node_id: &'a NodeId) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.values().filter(move |e| e.target == *node_id)
    }

    /// Topmost node whose box contains `pos` (graph space)
    pub fn node_at(&self, pos: Pos2) -> Option<&NodeId> {
        self.nodes
            .values()
            .rev()
            .find(|node| node.rect().contains(pos))
            .map(|node| &node.id)
    }

    /// Replace both collections wholesale.
    ///
    /// Later duplicates of a node id are renamed rather than dropped; edges
    /// naming that id stay attached to the first node that carried it. Edges
    /// whose endpoints are not among `nodes` are dropped and returned.
    pub fn replace_all(&mut self, nodes: Vec<Node>, edges: Vec<Edge>) -> Vec<Edge> {
        self.set_nodes(nodes);
        self.set_edges(edges);
        self.prune_dangling_edges()
    }

    /// Remove every edge whose source or target is missing
    pub fn prune_dangling_edges(&mut self) -> Vec<Edge> {
        let dangling: Vec<EdgeId> = self
            .edges
            .values()
            .filter(|e| !self.nodes.contains_key(&e.source) || !self.nodes.contains_key(&e.target))
            .map(|e| e.id.clone())
            .collect();

        dangling
            .iter()
            .filter_map(|id| self.edges.shift_remove(id))
            .inspect(|edge| {
                tracing::warn!(
                    "Dropped edge {} ({} -> {}): endpoint missing",
                    edge.id,
                    edge.source,
                    edge.target
                );
            })
            .collect()
    }

    /// Replace the node collection. Edges are left as they are.
    pub fn set_nodes(&mut self, nodes: Vec<Node>) {
        self.nodes.clear();
        for mut node in nodes {
            if self.nodes.contains_key(&node.id) {
                let renamed = self.unique_node_id(Some(node.id.clone()));
                tracing::warn!("Duplicate node id {} renamed to {}", node.id, renamed);
                node.id = renamed;
            }
            self.nodes.insert(node.id.clone(), node);
        }
    }

    /// Replace the edge collection without endpoint validation
    pub fn set_edges(&mut self, edges: Vec<Edge>) {
        self.edges.clear();
        for mut edge in edges {
            if self.edges.contains_key(&edge.id) {
                let renamed = self.unique_edge_id(Some(edge.id.clone()));
                tracing::warn!("Duplicate edge id {} renamed to {}", edge.id, renamed);
                edge.id = renamed;
            }
            self.edges.insert(edge.id.clone(), edge);
        }
    }

    /// Copy out both collections in order
    pub fn to_parts(&self) -> GraphParts {
        GraphParts {
            nodes: self.nodes.values().cloned().collect(),
            edges: self.edges.values().cloned().collect(),
        }
    }

    /// Resolve a node id that is free in this graph.
    ///
    /// `None` synthesizes a fresh id; a taken id gets a `_<n>` suffix from a
    /// counter that only ever grows.
    pub fn unique_node_id(&mut self, preferred: Option<NodeId>) -> NodeId {
        let base = match preferred {
            Some(id) if !id.0.trim().is_empty() => id,
            _ => NodeId::new(),
        };
        let mut candidate = base.clone();
        while self.nodes.contains_key(&candidate) {
            candidate = NodeId(format!("{}_{}", base, self.take_suffix()));
        }
        candidate
    }

    /// Resolve an edge id that is free in this graph
    pub fn unique_edge_id(&mut self, preferred: Option<EdgeId>) -> EdgeId {
        let base = match preferred {
            Some(id) if !id.0.trim().is_empty() => id,
            _ => EdgeId::new(),
        };
        let mut candidate = base.clone();
        while self.edges.contains_key(&candidate) {
            candidate = EdgeId(format!("{}_{}", base, self.take_suffix()));
        }
        candidate
    }

    fn take_suffix(&mut self) -> u64 {
        let suffix = self.next_suffix.max(1);
        self.next_suffix = suffix + 1;
        suffix
    }
}

/// Error when mutating the graph
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// Edge endpoint does not exist
    #[error("Node not found: {0}")]
    DanglingEndpoint(NodeId),

    /// Node id already taken
    #[error("Node already exists: {0}")]
    DuplicateNode(NodeId),

    /// Edge id already taken
    #[error("Edge already exists: {0}")]
    DuplicateEdge(EdgeId),
}
