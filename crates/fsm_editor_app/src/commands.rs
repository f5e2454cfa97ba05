// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tool actions: the closed set of graph mutations external agents may issue.
//!
//! An envelope is a JSON object `{ "action": "<tag>", ...fields }`. Every
//! envelope, well-formed or not, produces an [`ActionResult`].

use fsm_editor_graph::{validate, Edge, EdgeId, Graph, GraphError, Node, NodeId, NodeKind, NodePatch};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tags accepted in the `action` field
pub const KNOWN_ACTIONS: [&str; 6] = [
    "add_node",
    "remove_node",
    "update_node",
    "add_edge",
    "remove_edge",
    "validate_fsm",
];

/// Error type for envelope decoding and action application
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Tag outside the closed set
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    /// Known tag, bad fields
    #[error("Malformed {action} action: {reason}")]
    Malformed {
        /// The tag
        action: String,
        /// What was wrong
        reason: String,
    },

    /// Graph rejected the change
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Uniform outcome of one tool action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    /// Whether the action did what was asked
    pub success: bool,
    /// Human-readable summary
    pub message: String,
    /// Validation issues (only for `validate_fsm`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
    /// Whether the graph was modified
    #[serde(skip)]
    pub changed: bool,
}

impl ActionResult {
    /// Successful action that modified the graph
    pub fn changed(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            issues: Vec::new(),
            changed: true,
        }
    }

    /// Successful action with no modification
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            issues: Vec::new(),
            changed: false,
        }
    }

    /// Rejected action; the graph is untouched
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            issues: Vec::new(),
            changed: false,
        }
    }
}

impl From<CommandError> for ActionResult {
    fn from(error: CommandError) -> Self {
        Self::failure(error.to_string())
    }
}

/// A decoded tool action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ToolAction {
    /// Append a state
    AddNode {
        /// Requested id; synthesized when absent
        #[serde(default, alias = "node_id")]
        id: Option<String>,
        /// Display label; defaults to the id
        #[serde(default)]
        label: Option<String>,
        /// Kind name, e.g. `"process"`
        #[serde(default, alias = "type")]
        node_type: Option<String>,
        /// Graph x; derived from the node count when absent
        #[serde(default)]
        x: Option<f32>,
        /// Graph y; derived from the node count when absent
        #[serde(default)]
        y: Option<f32>,
        /// Entry code
        #[serde(default, alias = "entryAction")]
        entry_action: Option<String>,
    },
    /// Remove a state and its transitions
    RemoveNode {
        /// Node to remove
        #[serde(alias = "id")]
        node_id: String,
    },
    /// Merge fields into a state
    UpdateNode {
        /// Node to update
        #[serde(alias = "id")]
        node_id: String,
        /// New label
        #[serde(default)]
        label: Option<String>,
        /// New kind name
        #[serde(default, alias = "type")]
        node_type: Option<String>,
        /// New x
        #[serde(default)]
        x: Option<f32>,
        /// New y
        #[serde(default)]
        y: Option<f32>,
        /// New entry code
        #[serde(default, alias = "entryAction")]
        entry_action: Option<String>,
    },
    /// Append a transition
    AddEdge {
        /// Requested id; synthesized when absent
        #[serde(default, alias = "edge_id")]
        id: Option<String>,
        /// Source node
        source: String,
        /// Target node
        target: String,
        /// Transition label
        #[serde(default)]
        label: Option<String>,
    },
    /// Remove a transition
    RemoveEdge {
        /// Edge to remove
        #[serde(alias = "id")]
        edge_id: String,
    },
    /// Report unreachable states and dead ends
    ValidateFsm,
}

impl ToolAction {
    /// Decode an envelope, distinguishing unknown tags from bad fields
    pub fn from_envelope(envelope: &Value) -> Result<Self, CommandError> {
        let tag = envelope
            .get("action")
            .and_then(Value::as_str)
            .ok_or_else(|| CommandError::UnknownAction(describe_tag(envelope)))?;

        if !KNOWN_ACTIONS.contains(&tag) {
            return Err(CommandError::UnknownAction(tag.to_string()));
        }

        serde_json::from_value(envelope.clone()).map_err(|e| CommandError::Malformed {
            action: tag.to_string(),
            reason: e.to_string(),
        })
    }

    /// Wire tag of this action
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddNode { .. } => "add_node",
            Self::RemoveNode { .. } => "remove_node",
            Self::UpdateNode { .. } => "update_node",
            Self::AddEdge { .. } => "add_edge",
            Self::RemoveEdge { .. } => "remove_edge",
            Self::ValidateFsm => "validate_fsm",
        }
    }

    /// Whether applying this action can modify the graph
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Self::ValidateFsm)
    }

    /// Run a read-only action. Mutating actions are refused.
    pub fn inspect(&self, graph: &Graph) -> ActionResult {
        match self {
            Self::ValidateFsm => {
                let report = validate(graph);
                ActionResult {
                    issues: report.messages(),
                    ..ActionResult::ok(report.to_string())
                }
            }
            other => ActionResult::failure(format!("{} modifies the graph", other.name())),
        }
    }

    /// Apply the action to `graph`. On failure the graph is left untouched.
    pub fn apply(&self, graph: &mut Graph) -> ActionResult {
        match self {
            Self::AddNode {
                id,
                label,
                node_type,
                x,
                y,
                entry_action,
            } => {
                let kind = match parse_kind(node_type.as_deref()) {
                    Ok(kind) => kind.unwrap_or_default(),
                    Err(result) => return result,
                };
                let requested = id.clone().map(NodeId::from);
                let node_id = graph.unique_node_id(requested.clone());
                let (default_x, default_y) = default_position(graph.node_count());

                let node = Node {
                    label: label.clone().unwrap_or_else(|| node_id.to_string()),
                    id: node_id.clone(),
                    kind,
                    x: x.unwrap_or(default_x),
                    y: y.unwrap_or(default_y),
                    entry_action: entry_action.clone(),
                };
                let label = node.label.clone();
                if let Err(e) = graph.add_node(node) {
                    return CommandError::from(e).into();
                }

                match requested {
                    Some(requested) if requested != node_id => ActionResult::changed(format!(
                        "Added node '{label}' as {node_id} ({requested} was taken)"
                    )),
                    _ => ActionResult::changed(format!("Added node '{label}' ({node_id})")),
                }
            }

            Self::RemoveNode { node_id } => {
                let node_id = NodeId::from(node_id.as_str());
                let edges_before = graph.edge_count();
                match graph.remove_node(&node_id) {
                    Some(node) => {
                        let cascaded = edges_before - graph.edge_count();
                        ActionResult::changed(format!(
                            "Removed node '{}' and {cascaded} edge(s)",
                            node.label
                        ))
                    }
                    None => ActionResult::failure(format!("Node {node_id} not found")),
                }
            }

            Self::UpdateNode {
                node_id,
                label,
                node_type,
                x,
                y,
                entry_action,
            } => {
                let kind = match parse_kind(node_type.as_deref()) {
                    Ok(kind) => kind,
                    Err(result) => return result,
                };
                let patch = NodePatch {
                    label: label.clone(),
                    kind,
                    x: *x,
                    y: *y,
                    entry_action: entry_action.clone(),
                };
                let node_id = NodeId::from(node_id.as_str());
                let Some(node) = graph.node_mut(&node_id) else {
                    return ActionResult::failure(format!("Node {node_id} not found"));
                };
                if node.apply(&patch) {
                    ActionResult::changed(format!("Updated node {node_id}"))
                } else {
                    ActionResult::ok(format!("Node {node_id} unchanged"))
                }
            }

            Self::AddEdge {
                id,
                source,
                target,
                label,
            } => {
                for (role, endpoint) in [("source", source), ("target", target)] {
                    if !graph.contains_node(&NodeId::from(endpoint.as_str())) {
                        return ActionResult::failure(format!(
                            "Edge {role} node '{endpoint}' does not exist"
                        ));
                    }
                }
                let edge_id = graph.unique_edge_id(id.clone().map(EdgeId::from));
                let mut edge = Edge::new(source.as_str(), target.as_str()).with_id(edge_id);
                edge.label = label.clone();
                match graph.connect(edge) {
                    Ok(edge_id) => {
                        ActionResult::changed(format!("Added edge {source} -> {target} ({edge_id})"))
                    }
                    Err(e) => CommandError::from(e).into(),
                }
            }

            Self::RemoveEdge { edge_id } => {
                let edge_id = EdgeId::from(edge_id.as_str());
                match graph.disconnect(&edge_id) {
                    Some(edge) => ActionResult::changed(format!(
                        "Removed edge {} -> {}",
                        edge.source, edge.target
                    )),
                    None => ActionResult::failure(format!("Edge {edge_id} not found")),
                }
            }

            Self::ValidateFsm => self.inspect(graph),
        }
    }
}

/// Position for a node added without coordinates: a 4-wide grid
pub fn default_position(count: usize) -> (f32, f32) {
    let column = (count % 4) as f32;
    let row = (count / 4) as f32;
    (100.0 + column * 180.0, 100.0 + row * 120.0)
}

fn parse_kind(name: Option<&str>) -> Result<Option<NodeKind>, ActionResult> {
    match name {
        None => Ok(None),
        Some(name) => NodeKind::parse(name)
            .map(Some)
            .ok_or_else(|| ActionResult::failure(format!("Unknown node type: {name}"))),
    }
}

fn describe_tag(envelope: &Value) -> String {
    match envelope.get("action") {
        None => "<missing>".to_string(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    fn run(graph: &mut Graph, envelope: Value) -> ActionResult {
        match ToolAction::from_envelope(&envelope) {
            Ok(action) => action.apply(graph),
            Err(e) => e.into(),
        }
    }

    #[test]
    fn test_add_node_defaults() {
        let mut graph = Graph::seed();
        let result = run(&mut graph, json!({"action": "add_node", "label": "WAIT", "type": "delay"}));
        assert!(result.success, "{}", result.message);
        assert!(result.changed);

        let node = graph.nodes().last().unwrap();
        assert_eq!(node.label, "WAIT");
        assert_eq!(node.kind, NodeKind::Delay);
        assert_eq!((node.x, node.y), default_position(4));
        assert_eq!((node.x, node.y), (100.0, 220.0));
    }

    #[test]
    fn test_colliding_ids_stay_unique() {
        let mut graph = Graph::seed();
        for _ in 0..5 {
            let result = run(&mut graph, json!({"action": "add_node", "id": "start"}));
            assert!(result.success);
        }
        for _ in 0..5 {
            let result = run(
                &mut graph,
                json!({"action": "add_edge", "id": "e_start_init", "source": "start", "target": "end"}),
            );
            assert!(result.success);
        }

        let node_ids: HashSet<_> = graph.node_ids().collect();
        assert_eq!(node_ids.len(), graph.node_count());
        assert_eq!(graph.node_count(), 9);
        let edge_ids: HashSet<_> = graph.edges().map(|e| &e.id).collect();
        assert_eq!(edge_ids.len(), graph.edge_count());
        assert_eq!(graph.node(&NodeId::from("start")).unwrap().label, "START");
    }

    #[test]
    fn test_remove_node_cascades() {
        let mut graph = Graph::seed();
        let result = run(&mut graph, json!({"action": "remove_node", "node_id": "init"}));
        assert!(result.success);
        assert_eq!(result.message, "Removed node 'INIT' and 2 edge(s)");
        let init = NodeId::from("init");
        assert!(graph.edges().all(|e| e.source != init && e.target != init));
    }

    #[test]
    fn test_remove_missing_is_reported() {
        let mut graph = Graph::seed();
        let before = graph.clone();
        let result = run(&mut graph, json!({"action": "remove_node", "id": "ghost"}));
        assert!(!result.success);
        assert!(!result.changed);
        let result = run(&mut graph, json!({"action": "remove_edge", "edge_id": "ghost"}));
        assert!(!result.success);
        assert_eq!(graph, before);
    }

    #[test]
    fn test_update_merges() {
        let mut graph = Graph::seed();
        let result = run(
            &mut graph,
            json!({"action": "update_node", "node_id": "running", "entry_action": "motor_on();"}),
        );
        assert!(result.success);
        let node = graph.node(&NodeId::from("running")).unwrap();
        assert_eq!(node.label, "RUNNING");
        assert_eq!(node.kind, NodeKind::Process);
        assert_eq!(node.entry_action.as_deref(), Some("motor_on();"));

        let missing = run(&mut graph, json!({"action": "update_node", "node_id": "nope", "label": "x"}));
        assert!(!missing.success);
    }

    #[test]
    fn test_update_accepts_wire_aliases() {
        let mut graph = Graph::seed();
        let result = run(
            &mut graph,
            json!({"action": "update_node", "id": "init", "type": "decision", "entryAction": "check();"}),
        );
        assert!(result.success, "{}", result.message);
        let node = graph.node(&NodeId::from("init")).unwrap();
        assert_eq!(node.kind, NodeKind::Decision);
        assert_eq!(node.entry_action.as_deref(), Some("check();"));
        assert_eq!(node.label, "INIT");
    }

    #[test]
    fn test_add_edge_rejects_dangling_target() {
        let mut graph = Graph::seed();
        let before: Vec<_> = graph.edges().cloned().collect();
        let result = run(
            &mut graph,
            json!({"action": "add_edge", "source": "start", "target": "ghost"}),
        );
        assert!(!result.success);
        assert!(result.message.contains("ghost"));
        let after: Vec<_> = graph.edges().cloned().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_unknown_action() {
        let mut graph = Graph::seed();
        let result = run(&mut graph, json!({"action": "explode"}));
        assert!(!result.success);
        assert_eq!(result.message, "Unknown action: explode");

        let missing = run(&mut graph, json!({"label": "no tag"}));
        assert!(!missing.success);
        assert!(missing.message.starts_with("Unknown action"));
    }

    #[test]
    fn test_malformed_known_action() {
        let err = ToolAction::from_envelope(&json!({"action": "add_edge", "source": "start"})).unwrap_err();
        assert!(matches!(err, CommandError::Malformed { .. }));
    }

    #[test]
    fn test_bad_node_type_rejected() {
        let mut graph = Graph::seed();
        let result = run(&mut graph, json!({"action": "add_node", "type": "spaceship"}));
        assert!(!result.success);
        assert_eq!(graph.node_count(), 4);
    }

    #[test]
    fn test_validate_reports_without_mutation() {
        let mut graph = Graph::seed();
        run(&mut graph, json!({"action": "remove_edge", "edge_id": "e_init_running"}));
        let before = graph.clone();

        let first = run(&mut graph, json!({"action": "validate_fsm"}));
        let second = run(&mut graph, json!({"action": "validate_fsm"}));
        assert!(first.success);
        assert!(!first.changed);
        assert_eq!(first.issues.len(), 2);
        assert_eq!(first, second);
        assert_eq!(graph, before);
    }

    #[test]
    fn test_result_wire_shape() {
        let value = serde_json::to_value(ActionResult::failure("nope")).unwrap();
        assert_eq!(value, json!({"success": false, "message": "nope"}));
    }
}
