// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor state management.
//!
//! [`EditorState`] funnels every entry point through the graph store: direct
//! edits from the canvas, tool actions from an agent, undo/redo, and project
//! loads. Each committed change records one history entry and one console
//! line; store listeners (including the context mirror) fire once per batch.

use crate::commands::{ActionResult, ToolAction};
use crate::config::EditorConfig;
use crate::console::{ConsoleLog, Severity};
use crate::context::{ContextSnapshot, ContextSync};
use crate::history::{GraphSnapshot, History};
use crate::project::ProjectSnapshot;
use fsm_editor_graph::ui::{CanvasOptions, CanvasOutput};
use fsm_editor_graph::viewport::{snap_to_grid, ZOOM_STEP};
use fsm_editor_graph::{
    Edge, EdgeId, Graph, GraphChanged, GraphError, GraphStore, Interaction, InteractionEvent,
    ListenerId, Node, NodeId, NodeKind, NodePatch, PointerButton, Pos2, ValidationReport, Viewport,
};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;

/// Editor state behind a lock, for hosts that touch it from several threads
pub type SharedEditor = Arc<Mutex<EditorState>>;

/// The editor core
pub struct EditorState {
    store: GraphStore,
    history: History,
    viewport: Viewport,
    interaction: Interaction,
    console: ConsoleLog,
    context: Arc<ContextSync>,
    config: EditorConfig,
    /// Project name
    pub project_name: String,
    /// Target microcontroller, carried through save/load untouched
    pub mcu: String,
    /// Output language, carried through save/load untouched
    pub language: String,
}

impl std::fmt::Debug for EditorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorState")
            .field("project_name", &self.project_name)
            .field("store", &self.store)
            .field("history", &self.history.stats())
            .field("viewport", &self.viewport)
            .finish_non_exhaustive()
    }
}

impl EditorState {
    /// Create an editor on the seed example
    pub fn new(config: EditorConfig) -> Self {
        let graph = Graph::seed();
        let mut history = History::with_max_depth(config.max_history);
        history.reset(GraphSnapshot::capture(&graph, "Initial state"));

        let context = Arc::new(ContextSync::new(ContextSnapshot::capture(&graph, None, 0)));
        let mut store = GraphStore::new(graph);
        let mirror = Arc::clone(&context);
        store.on_graph_changed(move |change| {
            mirror.publish(ContextSnapshot::capture(change.graph, change.selection, change.revision));
        });

        let mut console = ConsoleLog::with_capacity(config.console_capacity);
        console.info("editor", "Editor ready");

        Self {
            store,
            history,
            viewport: Viewport::new(),
            interaction: Interaction::new(),
            console,
            context,
            config,
            project_name: crate::project::DEFAULT_PROJECT_NAME.to_string(),
            mcu: String::new(),
            language: String::new(),
        }
    }

    /// Wrap in a lock for multi-threaded hosts
    pub fn into_shared(self) -> SharedEditor {
        Arc::new(Mutex::new(self))
    }

    /// Read-only graph
    pub fn graph(&self) -> &Graph {
        self.store.graph()
    }

    /// Read-only store
    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    /// Get a node by ID
    pub fn get_node(&self, node_id: &NodeId) -> Option<&Node> {
        self.store.get_node(node_id)
    }

    /// Currently selected node
    pub fn selection(&self) -> Option<&NodeId> {
        self.store.selection()
    }

    /// Undo history
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Current viewport
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Current pointer interaction
    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    /// Console log
    pub fn console(&self) -> &ConsoleLog {
        &self.console
    }

    /// Mutable console log, for the host to clear or poll tracing into
    pub fn console_mut(&mut self) -> &mut ConsoleLog {
        &mut self.console
    }

    /// Session configuration
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Subscribe to context snapshots (latest wins)
    pub fn subscribe_context(&self) -> watch::Receiver<ContextSnapshot> {
        self.context.subscribe()
    }

    /// Newest context snapshot
    pub fn context_snapshot(&self) -> ContextSnapshot {
        self.context.latest()
    }

    /// Register a listener called once per committed batch
    pub fn on_graph_changed(
        &mut self,
        listener: impl FnMut(GraphChanged<'_>) + Send + 'static,
    ) -> ListenerId {
        self.store.on_graph_changed(listener)
    }

    /// Unregister a listener
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.store.remove_listener(id)
    }

    fn record(&mut self, description: impl Into<String>) {
        let description = description.into();
        tracing::debug!("Recording history entry: {description}");
        self.history
            .push(GraphSnapshot::capture(self.store.graph(), description));
    }

    // ---- Selection ----

    /// Select a node
    pub fn select(&mut self, node_id: &NodeId) {
        self.store.select(node_id);
    }

    /// Clear the selection
    pub fn deselect(&mut self) {
        self.store.deselect();
    }

    // ---- Direct edits ----

    /// Add a state. A taken `id` is made unique; `None` position uses the
    /// next free grid slot.
    pub fn add_node(
        &mut self,
        id: Option<NodeId>,
        label: impl Into<String>,
        kind: NodeKind,
        position: Option<Pos2>,
    ) -> Result<NodeId, GraphError> {
        let label = label.into();
        let result = self.store.mutate(|graph| {
            let node_id = graph.unique_node_id(id);
            let (x, y) = position
                .map(|p| (p.x, p.y))
                .unwrap_or_else(|| crate::commands::default_position(graph.node_count()));
            graph.add_node(Node::new(node_id, label.clone(), kind).with_position(x, y))
        });
        match &result {
            Ok(_) => {
                self.record(format!("Add node {label}"));
                self.console.success("editor", format!("Added state '{label}'"));
            }
            Err(e) => {
                tracing::warn!("Add node failed: {e}");
                self.console.error("editor", e.to_string());
            }
        }
        result
    }

    /// Merge fields into a node. Returns `false` if nothing changed.
    pub fn update_node(&mut self, node_id: &NodeId, patch: &NodePatch) -> bool {
        if !self.store.graph().contains_node(node_id) {
            self.report_missing("Node", node_id);
            return false;
        }
        let changed = self.store.mutate(|graph| {
            graph
                .node_mut(node_id)
                .is_some_and(|node| node.apply(patch))
        });
        if changed {
            self.record(format!("Edit node {node_id}"));
        }
        changed
    }

    /// Move a node to a graph position as one undoable step
    pub fn move_node(&mut self, node_id: &NodeId, position: Pos2) -> bool {
        if !self.store.graph().contains_node(node_id) {
            self.report_missing("Node", node_id);
            return false;
        }
        let moved = self.store.mutate(|graph| match graph.node_mut(node_id) {
            Some(node) if node.position() != position => {
                node.x = position.x;
                node.y = position.y;
                true
            }
            _ => false,
        });
        if moved {
            self.record(format!("Move node {node_id}"));
        }
        moved
    }

    /// Remove a node and its edges
    pub fn remove_node(&mut self, node_id: &NodeId) -> bool {
        let removed = self.store.mutate(|graph| graph.remove_node(node_id));
        match removed {
            Some(node) => {
                self.record(format!("Delete node {}", node.label));
                self.console.info("editor", format!("Deleted state '{}'", node.label));
                true
            }
            None => {
                self.report_missing("Node", node_id);
                false
            }
        }
    }

    /// Remove the selected node, if any
    pub fn delete_selected(&mut self) -> bool {
        match self.store.selection().cloned() {
            Some(node_id) => self.remove_node(&node_id),
            None => false,
        }
    }

    /// Add a transition between existing states
    pub fn connect(
        &mut self,
        source: &NodeId,
        target: &NodeId,
        label: Option<String>,
    ) -> Result<EdgeId, GraphError> {
        let result = self.store.mutate(|graph| {
            let id = graph.unique_edge_id(None);
            let mut edge = Edge::new(source.clone(), target.clone()).with_id(id);
            edge.label = label;
            graph.connect(edge)
        });
        match &result {
            Ok(_) => {
                self.record(format!("Connect {source} -> {target}"));
                self.console.success("editor", format!("Connected {source} -> {target}"));
            }
            Err(e) => self.console.error("editor", e.to_string()),
        }
        result
    }

    /// Remove a transition
    pub fn remove_edge(&mut self, edge_id: &EdgeId) -> bool {
        if !self.store.graph().contains_edge(edge_id) {
            self.report_missing("Edge", edge_id);
            return false;
        }
        self.store.mutate(|graph| graph.disconnect(edge_id));
        self.record(format!("Delete edge {edge_id}"));
        true
    }

    /// Replace the whole diagram as one undoable step (e.g. a generated machine).
    /// Transitions naming a missing state are dropped with a warning.
    pub fn replace_graph(&mut self, nodes: Vec<Node>, edges: Vec<Edge>, description: &str) {
        let dropped = self.store.replace_all(nodes, edges);
        self.report_dropped("editor", &dropped);
        self.record(description);
        self.console.info("editor", description);
    }

    fn report_missing(&mut self, what: &str, id: impl std::fmt::Display) {
        tracing::warn!("{what} {id} not found");
        self.console.warning("editor", format!("{what} {id} not found"));
    }

    fn report_dropped(&mut self, source: &str, dropped: &[Edge]) {
        for edge in dropped {
            self.console.warning(
                source,
                format!(
                    "Dropped transition {} ({} -> {}): state missing",
                    edge.id, edge.source, edge.target
                ),
            );
        }
    }

    // ---- Tool actions ----

    /// Decode and apply one tool action envelope
    pub fn apply_tool_action(&mut self, envelope: &Value) -> ActionResult {
        match ToolAction::from_envelope(envelope) {
            Ok(action) => self.apply_action(&action),
            Err(e) => {
                tracing::warn!("Rejected tool action: {e}");
                self.console.warning("agent", e.to_string());
                ActionResult::from(e)
            }
        }
    }

    /// Apply envelopes in order, one result each
    pub fn apply_batch(&mut self, envelopes: &[Value]) -> Vec<ActionResult> {
        envelopes
            .iter()
            .map(|envelope| self.apply_tool_action(envelope))
            .collect()
    }

    /// Apply a decoded action
    pub fn apply_action(&mut self, action: &ToolAction) -> ActionResult {
        let result = if action.is_mutating() {
            let result = self.store.mutate(|graph| action.apply(graph));
            if result.changed {
                self.record(format!("{}: {}", action.name(), result.message));
            }
            result
        } else {
            action.inspect(self.store.graph())
        };

        let severity = match (result.success, result.changed) {
            (false, _) => Severity::Warning,
            (true, true) => Severity::Success,
            (true, false) if result.issues.is_empty() => Severity::Info,
            (true, false) => Severity::Warning,
        };
        if result.success {
            tracing::debug!("{} applied: {}", action.name(), result.message);
        } else {
            tracing::warn!("{} failed: {}", action.name(), result.message);
        }
        self.console.log(severity, "agent", result.message.clone());
        for issue in &result.issues {
            self.console.warning("validator", issue.clone());
        }
        result
    }

    /// Validate the current graph
    pub fn validate(&self) -> ValidationReport {
        fsm_editor_graph::validate(self.store.graph())
    }

    // ---- History ----

    /// Step back one entry. Returns `false` at the oldest entry.
    pub fn undo(&mut self) -> bool {
        self.end_interaction();
        let Some(snapshot) = self.history.undo() else {
            return false;
        };
        self.restore(snapshot);
        tracing::info!("Undo (cursor {})", self.history.cursor());
        true
    }

    /// Step forward one entry. Returns `false` at the newest entry.
    pub fn redo(&mut self) -> bool {
        self.end_interaction();
        let Some(snapshot) = self.history.redo() else {
            return false;
        };
        self.restore(snapshot);
        tracing::info!("Redo (cursor {})", self.history.cursor());
        true
    }

    fn restore(&mut self, snapshot: GraphSnapshot) {
        self.history.begin_replay();
        self.store.replace_all(snapshot.nodes, snapshot.edges);
        self.history.end_replay();
    }

    /// Finish any drag or pan so its result is committed before the graph
    /// is swapped out underneath it
    fn end_interaction(&mut self) {
        let event = self.interaction.pointer_leave(&mut self.viewport);
        self.handle_event(event);
    }

    // ---- Project boundary ----

    /// Load a project: replaces the graph and resets selection, view and history
    pub fn load_project(&mut self, project: ProjectSnapshot) {
        let ProjectSnapshot {
            name,
            nodes,
            edges,
            mcu,
            language,
        } = project;

        self.end_interaction();
        self.store.deselect();
        let dropped = self.store.replace_all(nodes, edges);
        self.report_dropped("project", &dropped);
        self.viewport.fit_view();
        self.history
            .reset(GraphSnapshot::capture(self.store.graph(), "Load project"));

        tracing::info!("Loaded project '{name}'");
        self.console.info(
            "project",
            format!(
                "Loaded '{name}' ({} states, {} transitions)",
                self.store.graph().node_count(),
                self.store.graph().edge_count()
            ),
        );
        self.project_name = name;
        self.mcu = mcu;
        self.language = language;
    }

    /// Current diagram as a project snapshot
    pub fn project_snapshot(&self) -> ProjectSnapshot {
        ProjectSnapshot::from_graph(self.project_name.clone(), self.store.graph())
            .with_target(self.mcu.clone(), self.language.clone())
    }

    // ---- Viewport & pointer ----

    /// Wheel tick over the canvas
    pub fn wheel(&mut self, scroll_y: f32) {
        self.viewport.wheel(scroll_y);
    }

    /// Zoom-in button
    pub fn zoom_in(&mut self) {
        self.viewport.zoom_by(ZOOM_STEP);
    }

    /// Zoom-out button
    pub fn zoom_out(&mut self) {
        self.viewport.zoom_by(-ZOOM_STEP);
    }

    /// Reset the view to zoom 1, pan 0
    pub fn fit_view(&mut self) {
        self.viewport.fit_view();
    }

    /// Pointer pressed at a canvas-local screen position
    pub fn pointer_down(&mut self, button: PointerButton, shift: bool, pointer: Pos2) {
        let hit = self
            .store
            .graph()
            .node_at(self.viewport.screen_to_graph(pointer))
            .and_then(|id| self.store.get_node(id))
            .map(|node| (node.id.clone(), node.position()));
        let event = self
            .interaction
            .pointer_down(&mut self.viewport, button, shift, pointer, hit);
        self.handle_event(event);
    }

    /// Pointer moved
    pub fn pointer_move(&mut self, pointer: Pos2) {
        let event = self.interaction.pointer_move(&mut self.viewport, pointer);
        self.handle_event(event);
    }

    /// Pointer released
    pub fn pointer_up(&mut self) {
        let event = self.interaction.pointer_up(&mut self.viewport);
        self.handle_event(event);
    }

    /// Pointer left the canvas
    pub fn pointer_leave(&mut self) {
        let event = self.interaction.pointer_leave(&mut self.viewport);
        self.handle_event(event);
    }

    /// Draw the canvas and apply what the user did on it
    pub fn show_canvas(&mut self, ui: &mut egui::Ui, options: &CanvasOptions) -> CanvasOutput {
        let output = fsm_editor_graph::ui::show(
            ui,
            self.store.graph(),
            self.store.selection(),
            &mut self.viewport,
            &mut self.interaction,
            options,
        );
        for event in output.events.iter().cloned() {
            self.handle_event(event);
        }
        output
    }

    fn handle_event(&mut self, event: InteractionEvent) {
        match event {
            InteractionEvent::DragStarted(node_id) => self.store.select(&node_id),
            InteractionEvent::BackgroundClicked => self.store.deselect(),
            InteractionEvent::NodeMoved(node_id, pos) => {
                let moved = self.store.graph().node(&node_id).is_some_and(|n| n.position() != pos);
                if moved {
                    self.store.mutate(|graph| {
                        if let Some(node) = graph.node_mut(&node_id) {
                            node.x = pos.x;
                            node.y = pos.y;
                        }
                    });
                }
            }
            InteractionEvent::DragEnded { node, from } => {
                if self.config.snap_to_grid {
                    let grid = self.config.grid_size;
                    self.store.mutate(|graph| {
                        if let Some(n) = graph.node_mut(&node) {
                            let snapped = snap_to_grid(n.position(), grid);
                            n.x = snapped.x;
                            n.y = snapped.y;
                        }
                    });
                }
                let moved = self.store.graph().node(&node).is_some_and(|n| n.position() != from);
                if moved {
                    self.record(format!("Move node {node}"));
                }
            }
            InteractionEvent::None | InteractionEvent::PanStarted | InteractionEvent::PanEnded => {}
        }
    }
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fsm_editor_graph::{validate, IssueKind, InteractionMode};
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn test_scenario_linear_machine_is_valid() {
        let mut editor = EditorState::default();
        let result = editor.apply_tool_action(&json!({"action": "validate_fsm"}));
        assert!(result.success);
        assert!(result.issues.is_empty());
        assert!(editor.validate().passed());
    }

    #[test]
    fn test_scenario_broken_chain() {
        let mut editor = EditorState::default();
        let removed = editor.apply_tool_action(&json!({"action": "remove_edge", "edge_id": "e_init_running"}));
        assert!(removed.success);

        let report = editor.validate();
        let unreachable: Vec<_> = report.of_kind(IssueKind::Unreachable).map(|i| i.node.as_str()).collect();
        let dead_ends: Vec<_> = report.of_kind(IssueKind::DeadEnd).map(|i| i.node.as_str()).collect();
        assert_eq!(unreachable, ["running"]);
        assert_eq!(dead_ends, ["init"]);
    }

    #[test]
    fn test_scenario_dangling_edge_rejected() {
        let mut editor = EditorState::default();
        let before: Vec<_> = editor.graph().edges().cloned().collect();
        let history_len = editor.history().len();

        let result = editor.apply_tool_action(&json!({"action": "add_edge", "source": "start", "target": "missing"}));

        assert!(!result.success);
        assert_eq!(editor.graph().edges().cloned().collect::<Vec<_>>(), before);
        assert_eq!(editor.history().len(), history_len);
        assert_eq!(editor.console().last().unwrap().severity, Severity::Warning);
    }

    #[test]
    fn test_scenario_three_adds_three_undos() {
        let mut editor = EditorState::default();
        let seed = editor.graph().clone();

        for label in ["A", "B", "C"] {
            let result = editor.apply_tool_action(&json!({"action": "add_node", "label": label}));
            assert!(result.success);
        }
        assert_eq!(editor.graph().node_count(), 7);

        assert!(editor.undo());
        assert!(editor.undo());
        assert!(editor.undo());
        assert_eq!(*editor.graph(), seed);
        assert!(!editor.undo());
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut editor = EditorState::default();
        editor.add_node(None, "EXTRA", NodeKind::Decision, Some(Pos2::new(5.0, 5.0))).unwrap();
        let edited = editor.graph().clone();

        assert!(editor.undo());
        assert!(editor.redo());
        assert_eq!(*editor.graph(), edited);
        assert!(!editor.redo());
    }

    #[test]
    fn test_live_graph_not_aliased_to_history() {
        let mut editor = EditorState::default();
        editor.add_node(Some(NodeId::from("x")), "X", NodeKind::Process, None).unwrap();
        editor.undo();

        let stored = editor.history().current().unwrap().clone();
        editor.store.mutate(|graph| {
            graph.node_mut(&NodeId::from("start")).unwrap().label = "CHANGED".into();
        });

        assert_eq!(editor.history().current().unwrap(), &stored);
        assert_eq!(stored.nodes[0].label, "START");
    }

    #[test]
    fn test_new_edit_after_undo_drops_redo() {
        let mut editor = EditorState::default();
        editor.add_node(None, "A", NodeKind::Process, None).unwrap();
        editor.undo();
        assert!(editor.history().can_redo());
        editor.add_node(None, "B", NodeKind::Process, None).unwrap();
        assert!(!editor.history().can_redo());
    }

    #[test]
    fn test_history_cap_through_editor() {
        let mut editor = EditorState::default();
        for n in 0..60 {
            editor.add_node(None, format!("N{n}"), NodeKind::Process, None).unwrap();
        }
        assert_eq!(editor.history().len(), 50);
        assert_eq!(editor.history().cursor(), 49);
    }

    #[test]
    fn test_unique_ids_under_collisions() {
        let mut editor = EditorState::default();
        for _ in 0..10 {
            editor.apply_tool_action(&json!({"action": "add_node", "id": "init"}));
            editor.apply_tool_action(&json!({"action": "add_edge", "id": "e_start_init", "source": "start", "target": "init"}));
        }
        let graph = editor.graph();
        let nodes: HashSet<_> = graph.node_ids().collect();
        let edges: HashSet<_> = graph.edges().map(|e| &e.id).collect();
        assert_eq!(nodes.len(), graph.node_count());
        assert_eq!(edges.len(), graph.edge_count());
        assert_eq!(graph.edge_count(), 13);
    }

    #[test]
    fn test_move_node_is_undoable() {
        let mut editor = EditorState::default();
        let end = NodeId::from("end");
        assert!(editor.move_node(&end, Pos2::new(400.0, 410.0)));
        assert!(!editor.move_node(&end, Pos2::new(400.0, 410.0)));
        assert!(!editor.move_node(&NodeId::from("ghost"), Pos2::ZERO));
        assert_eq!(editor.get_node(&end).unwrap().x, 400.0);

        editor.undo();
        assert_eq!(editor.get_node(&end).unwrap().x, 250.0);
    }

    #[test]
    fn test_update_node_merges() {
        let mut editor = EditorState::default();
        let init = NodeId::from("init");
        let patch = NodePatch {
            label: Some("BOOT".into()),
            ..NodePatch::default()
        };
        assert!(editor.update_node(&init, &patch));
        let node = editor.get_node(&init).unwrap();
        assert_eq!(node.label, "BOOT");
        assert_eq!(node.kind, NodeKind::Process);
        assert!(editor.history().can_undo());
    }

    #[test]
    fn test_connect_rejects_missing_endpoint() {
        let mut editor = EditorState::default();
        let err = editor
            .connect(&NodeId::from("end"), &NodeId::from("ghost"), None)
            .unwrap_err();
        assert!(matches!(err, GraphError::DanglingEndpoint(_)));
        assert_eq!(editor.graph().edge_count(), 3);

        let id = editor
            .connect(&NodeId::from("end"), &NodeId::from("start"), Some("reset".into()))
            .unwrap();
        assert!(editor.remove_edge(&id));
        assert!(!editor.remove_edge(&id));
    }

    #[test]
    fn test_undo_mid_drag_reverts_only_the_drag() {
        let mut editor = EditorState::default();
        editor.add_node(Some(NodeId::from("x")), "X", NodeKind::Process, None).unwrap();
        let after_add = editor.graph().clone();

        editor.pointer_down(PointerButton::Primary, false, Pos2::new(260.0, 60.0));
        editor.pointer_move(Pos2::new(300.0, 60.0));
        assert!(editor.undo());

        assert_eq!(*editor.graph(), after_add);
        assert!(editor.graph().contains_node(&NodeId::from("x")));
        assert_eq!(*editor.interaction().mode(), InteractionMode::Idle);

        assert!(editor.redo());
        let start = editor.get_node(&NodeId::from("start")).unwrap();
        assert_eq!((start.x, start.y), (290.0, 50.0));
    }

    #[test]
    fn test_missing_ids_in_direct_edits_are_logged() {
        let mut editor = EditorState::default();
        let ghost = NodeId::from("ghost");
        let warnings = editor.console().count(Severity::Warning);
        let revision = editor.store().revision();

        let patch = NodePatch {
            label: Some("BOO".into()),
            ..NodePatch::default()
        };
        assert!(!editor.update_node(&ghost, &patch));
        assert!(!editor.move_node(&ghost, Pos2::ZERO));
        assert!(!editor.remove_edge(&EdgeId::from("ghost")));

        assert_eq!(editor.console().count(Severity::Warning), warnings + 3);
        assert_eq!(editor.console().last().unwrap().message, "Edge ghost not found");
        assert_eq!(editor.store().revision(), revision);
        assert!(!editor.history().can_undo());
    }

    #[test]
    fn test_add_node_reports_id() {
        let mut editor = EditorState::default();
        let id = editor
            .add_node(Some(NodeId::from("start")), "AGAIN", NodeKind::Input, None)
            .unwrap();
        assert_ne!(id, NodeId::from("start"));
        assert_eq!(editor.get_node(&id).unwrap().label, "AGAIN");
        assert_eq!(editor.console().last().unwrap().severity, Severity::Success);
    }

    #[test]
    fn test_load_drops_dangling_edges() {
        let mut editor = EditorState::default();
        let mut project = ProjectSnapshot::from_graph("Broken", &Graph::new());
        project.nodes.push(Node::new("a", "A", NodeKind::Process));
        project.edges.push(Edge::new("ghost", "a").with_id("in"));
        project.edges.push(Edge::new("a", "ghost2").with_id("out"));
        let warnings = editor.console().count(Severity::Warning);

        editor.load_project(project);

        assert_eq!(editor.graph().edge_count(), 0);
        assert_eq!(editor.console().count(Severity::Warning), warnings + 2);
        let report = editor.validate();
        assert_eq!(report.of_kind(IssueKind::Unreachable).count(), 1);
        assert_eq!(report.of_kind(IssueKind::DeadEnd).count(), 1);
    }

    #[test]
    fn test_replace_graph_with_duplicate_ids() {
        let mut editor = EditorState::default();
        editor.replace_graph(
            vec![
                Node::new("idle", "IDLE", NodeKind::Input),
                Node::new("idle", "IDLE 2", NodeKind::Process),
                Node::new("done", "DONE", NodeKind::Output),
            ],
            vec![
                Edge::new("idle", "done").with_id("go"),
                Edge::new("idle", "nowhere").with_id("lost"),
            ],
            "Generated machine",
        );

        let graph = editor.graph();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edge(&EdgeId::from("go")).unwrap().source, NodeId::from("idle"));
        assert_eq!(graph.node(&NodeId::from("idle")).unwrap().label, "IDLE");

        assert!(editor.undo());
        assert_eq!(*editor.graph(), Graph::seed());
    }

    #[test]
    fn test_delete_selected_clears_selection() {
        let mut editor = EditorState::default();
        let init = NodeId::from("init");
        editor.select(&init);
        assert!(editor.delete_selected());
        assert_eq!(editor.selection(), None);
        assert!(editor.graph().edges().all(|e| !e.involves_node(&init)));
    }

    #[test]
    fn test_undo_clears_stale_selection() {
        let mut editor = EditorState::default();
        let id = editor.add_node(Some(NodeId::from("temp")), "TEMP", NodeKind::Delay, None).unwrap();
        editor.select(&id);
        editor.undo();
        assert_eq!(editor.selection(), None);
    }

    #[test]
    fn test_drag_records_one_entry() {
        let mut editor = EditorState::default();
        let before = editor.history().len();

        // START sits at (250, 50); grab it 10px inside.
        editor.pointer_down(PointerButton::Primary, false, Pos2::new(260.0, 60.0));
        assert_eq!(editor.selection(), Some(&NodeId::from("start")));
        for step in 1..=5 {
            editor.pointer_move(Pos2::new(260.0 + step as f32 * 10.0, 60.0));
        }
        editor.pointer_up();

        let start = editor.get_node(&NodeId::from("start")).unwrap();
        assert_eq!((start.x, start.y), (300.0, 50.0));
        assert_eq!(editor.history().len(), before + 1);

        assert!(editor.undo());
        let start = editor.get_node(&NodeId::from("start")).unwrap();
        assert_eq!((start.x, start.y), (250.0, 50.0));
    }

    #[test]
    fn test_click_without_move_records_nothing() {
        let mut editor = EditorState::default();
        let before = editor.history().len();
        editor.pointer_down(PointerButton::Primary, false, Pos2::new(260.0, 60.0));
        editor.pointer_up();
        assert_eq!(editor.history().len(), before);

        editor.pointer_down(PointerButton::Primary, false, Pos2::new(5.0, 5.0));
        assert_eq!(editor.selection(), None);
    }

    #[test]
    fn test_snap_on_release() {
        let mut editor = EditorState::new(EditorConfig {
            snap_to_grid: true,
            ..EditorConfig::default()
        });
        editor.pointer_down(PointerButton::Primary, false, Pos2::new(260.0, 60.0));
        editor.pointer_move(Pos2::new(267.0, 73.0));
        editor.pointer_up();
        let start = editor.get_node(&NodeId::from("start")).unwrap();
        assert_eq!((start.x, start.y), (260.0, 60.0));
    }

    #[test]
    fn test_pan_and_leave() {
        let mut editor = EditorState::default();
        editor.pointer_down(PointerButton::Middle, false, Pos2::new(100.0, 100.0));
        editor.pointer_move(Pos2::new(150.0, 80.0));
        assert_eq!(editor.viewport().pan, fsm_editor_graph::Vec2::new(50.0, -20.0));
        editor.pointer_leave();
        assert_eq!(*editor.interaction().mode(), InteractionMode::Idle);

        editor.pointer_move(Pos2::new(0.0, 0.0));
        assert_eq!(editor.viewport().pan, fsm_editor_graph::Vec2::new(50.0, -20.0));
    }

    #[test]
    fn test_zoom_buttons_clamp() {
        let mut editor = EditorState::default();
        for _ in 0..50 {
            editor.zoom_in();
        }
        assert_eq!(editor.viewport().zoom(), fsm_editor_graph::viewport::MAX_ZOOM);
        for _ in 0..50 {
            editor.wheel(-1.0);
        }
        assert_eq!(editor.viewport().zoom(), fsm_editor_graph::viewport::MIN_ZOOM);
        editor.fit_view();
        assert_eq!(editor.viewport().zoom(), 1.0);
    }

    #[test]
    fn test_load_project_resets_state() {
        let mut editor = EditorState::default();
        editor.add_node(None, "A", NodeKind::Process, None).unwrap();
        editor.select(&NodeId::from("start"));
        editor.zoom_in();

        let mut project = ProjectSnapshot::from_graph("Door", &Graph::new()).with_target("esp32", "rust");
        project.nodes.push(Node::new("closed", "CLOSED", NodeKind::Input));
        editor.load_project(project);

        assert_eq!(editor.selection(), None);
        assert_eq!(editor.viewport().zoom(), 1.0);
        assert_eq!(editor.history().len(), 1);
        assert!(!editor.history().can_undo());
        assert_eq!(editor.graph().node_count(), 1);
        assert_eq!(editor.project_snapshot().mcu, "esp32");
        assert_eq!(editor.project_name, "Door");
    }

    #[test]
    fn test_context_follows_changes() {
        let mut editor = EditorState::default();
        let mut rx = editor.subscribe_context();

        editor.apply_tool_action(&json!({"action": "remove_node", "node_id": "end"}));
        editor.select(&NodeId::from("running"));

        assert!(rx.has_changed().unwrap());
        let snapshot = rx.borrow_and_update().clone();
        assert_eq!(snapshot.nodes.len(), 3);
        assert_eq!(snapshot.edges.len(), 2);
        assert_eq!(snapshot.selected_node.as_deref(), Some("running"));
    }

    #[test]
    fn test_listener_once_per_action() {
        let mut editor = EditorState::default();
        let calls = Arc::new(Mutex::new(0u32));
        let counter = Arc::clone(&calls);
        editor.on_graph_changed(move |_| *counter.lock() += 1);

        editor.apply_tool_action(&json!({"action": "remove_node", "node_id": "init"}));
        assert_eq!(*calls.lock(), 1);
    }

    #[test]
    fn test_batch_results() {
        let mut editor = EditorState::default();
        let results = editor.apply_batch(&[
            json!({"action": "add_node", "id": "wait", "label": "WAIT", "type": "delay"}),
            json!({"action": "add_edge", "source": "running", "target": "wait", "label": "timeout"}),
            json!({"action": "frobnicate"}),
            json!({"action": "validate_fsm"}),
        ]);
        let outcomes: Vec<_> = results.iter().map(|r| r.success).collect();
        assert_eq!(outcomes, [true, true, false, true]);
        assert_eq!(results[2].message, "Unknown action: frobnicate");
        assert_eq!(results[3].issues, vec!["State 'WAIT' is a dead end".to_string()]);
        assert_eq!(validate(editor.graph()).issues.len(), 1);
    }

    #[test]
    fn test_shared_editor_across_threads() {
        let shared = EditorState::default().into_shared();
        let handles: Vec<_> = (0..4)
            .map(|n| {
                let editor = Arc::clone(&shared);
                std::thread::spawn(move || {
                    let mut editor = editor.lock();
                    editor.apply_tool_action(&json!({"action": "add_node", "id": format!("t{n}")}))
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap().success);
        }
        assert_eq!(shared.lock().graph().node_count(), 8);
    }
}
