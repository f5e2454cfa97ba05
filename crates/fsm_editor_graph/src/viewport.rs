// SPDX-License-Identifier: MIT OR Apache-2.0
//! Screen/graph coordinate transform and pointer interaction state.

use crate::node::NodeId;
use egui::{Pos2, Vec2};

/// Smallest allowed zoom factor
pub const MIN_ZOOM: f32 = 0.25;
/// Largest allowed zoom factor
pub const MAX_ZOOM: f32 = 3.0;
/// Wheel factor per tick when zooming in
pub const WHEEL_ZOOM_IN: f32 = 1.1;
/// Wheel factor per tick when zooming out
pub const WHEEL_ZOOM_OUT: f32 = 0.9;
/// Additive step of the zoom buttons
pub const ZOOM_STEP: f32 = 0.1;
/// Grid spacing used for snapping
pub const GRID_SPACING: f32 = 20.0;

/// Pan offset and zoom factor.
///
/// `screen = graph * zoom + pan`, so `graph = (screen - pan) / zoom`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Zoom factor, always within `[MIN_ZOOM, MAX_ZOOM]`
    zoom: f32,
    /// Pan offset in screen units
    pub pan: Vec2,
    /// Pointer minus pan, recorded when a pan starts
    pan_start: Option<Vec2>,
}

impl Viewport {
    /// Home view: zoom 1, no pan
    pub fn new() -> Self {
        Self {
            zoom: 1.0,
            pan: Vec2::ZERO,
            pan_start: None,
        }
    }

    /// Current zoom factor
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Set the zoom directly (clamped)
    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = clamp_zoom(zoom);
    }

    /// Multiplicative zoom, used by the mouse wheel
    pub fn zoom_at(&mut self, delta: f32) {
        self.zoom = clamp_zoom(self.zoom * delta);
    }

    /// Additive zoom, used by the +/- buttons
    pub fn zoom_by(&mut self, delta: f32) {
        self.zoom = clamp_zoom(self.zoom + delta);
    }

    /// One wheel tick; positive scroll zooms in
    pub fn wheel(&mut self, scroll_y: f32) {
        if scroll_y > 0.0 {
            self.zoom_at(WHEEL_ZOOM_IN);
        } else if scroll_y < 0.0 {
            self.zoom_at(WHEEL_ZOOM_OUT);
        }
    }

    /// Begin a pan gesture at `pointer`
    pub fn start_pan(&mut self, pointer: Pos2) {
        self.pan_start = Some(pointer.to_vec2() - self.pan);
    }

    /// Continue a pan gesture. No-op when no pan is active.
    pub fn pan_to(&mut self, pointer: Pos2) {
        if let Some(start) = self.pan_start {
            self.pan = pointer.to_vec2() - start;
        }
    }

    /// Finish a pan gesture
    pub fn end_pan(&mut self) {
        self.pan_start = None;
    }

    /// Whether a pan gesture is in progress
    pub fn is_panning(&self) -> bool {
        self.pan_start.is_some()
    }

    /// Reset to the home view (zoom 1, pan 0).
    ///
    /// This does not fit the nodes' bounding box.
    pub fn fit_view(&mut self) {
        self.zoom = 1.0;
        self.pan = Vec2::ZERO;
    }

    /// Convert a screen position to graph space
    pub fn screen_to_graph(&self, screen: Pos2) -> Pos2 {
        ((screen.to_vec2() - self.pan) / self.zoom).to_pos2()
    }

    /// Convert a graph position to screen space
    pub fn graph_to_screen(&self, graph: Pos2) -> Pos2 {
        (graph.to_vec2() * self.zoom + self.pan).to_pos2()
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}

fn clamp_zoom(zoom: f32) -> f32 {
    if zoom.is_nan() {
        return 1.0;
    }
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

/// Snap a graph position to the grid
pub fn snap_to_grid(pos: Pos2, spacing: f32) -> Pos2 {
    if spacing <= 0.0 {
        return pos;
    }
    Pos2::new(
        (pos.x / spacing).round() * spacing,
        (pos.y / spacing).round() * spacing,
    )
}

/// Pointer buttons the canvas reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    /// Left button
    Primary,
    /// Wheel button
    Middle,
    /// Right button
    Secondary,
}

/// Transient interaction mode of the canvas
#[derive(Debug, Clone, Default, PartialEq)]
pub enum InteractionMode {
    /// Nothing in progress
    #[default]
    Idle,
    /// Panning the view
    Panning,
    /// Dragging one node
    DraggingNode {
        /// Node being dragged
        node: NodeId,
        /// Pointer minus node origin, graph space
        offset: Vec2,
        /// Node origin when the drag started
        origin: Pos2,
    },
}

/// What a pointer event did
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionEvent {
    /// Nothing of interest
    None,
    /// A node was pressed; it should become the selection
    DragStarted(NodeId),
    /// Empty canvas was clicked
    BackgroundClicked,
    /// The view started panning
    PanStarted,
    /// The dragged node should move to this graph position
    NodeMoved(NodeId, Pos2),
    /// A node drag ended
    DragEnded {
        /// Node that was dragged
        node: NodeId,
        /// Where the drag started
        from: Pos2,
    },
    /// A pan ended
    PanEnded,
}

/// Pointer state machine for drag and pan
#[derive(Debug, Clone, Default)]
pub struct Interaction {
    mode: InteractionMode,
}

impl Interaction {
    /// Create an idle interaction
    pub fn new() -> Self {
        Self::default()
    }

    /// Current mode
    pub fn mode(&self) -> &InteractionMode {
        &self.mode
    }

    /// Pointer pressed at `pointer` (screen space).
    ///
    /// `hit` is the node under the pointer with its current origin, if any.
    pub fn pointer_down(
        &mut self,
        viewport: &mut Viewport,
        button: PointerButton,
        shift: bool,
        pointer: Pos2,
        hit: Option<(NodeId, Pos2)>,
    ) -> InteractionEvent {
        if matches!(self.mode, InteractionMode::DraggingNode { .. }) {
            return InteractionEvent::None;
        }

        let wants_pan = button == PointerButton::Middle || (button == PointerButton::Primary && shift);
        if wants_pan {
            viewport.start_pan(pointer);
            self.mode = InteractionMode::Panning;
            return InteractionEvent::PanStarted;
        }

        if button != PointerButton::Primary {
            return InteractionEvent::None;
        }

        match hit {
            Some((node, origin)) => {
                let offset = viewport.screen_to_graph(pointer) - origin;
                self.mode = InteractionMode::DraggingNode {
                    node: node.clone(),
                    offset,
                    origin,
                };
                InteractionEvent::DragStarted(node)
            }
            None => InteractionEvent::BackgroundClicked,
        }
    }

    /// Pointer moved to `pointer` (screen space)
    pub fn pointer_move(&mut self, viewport: &mut Viewport, pointer: Pos2) -> InteractionEvent {
        match &self.mode {
            InteractionMode::DraggingNode { node, offset, .. } => {
                let pos = viewport.screen_to_graph(pointer) - *offset;
                InteractionEvent::NodeMoved(node.clone(), pos)
            }
            InteractionMode::Panning => {
                viewport.pan_to(pointer);
                InteractionEvent::None
            }
            InteractionMode::Idle => InteractionEvent::None,
        }
    }

    /// Pointer released. Always returns to idle.
    pub fn pointer_up(&mut self, viewport: &mut Viewport) -> InteractionEvent {
        viewport.end_pan();
        match std::mem::take(&mut self.mode) {
            InteractionMode::DraggingNode { node, origin, .. } => InteractionEvent::DragEnded {
                node,
                from: origin,
            },
            InteractionMode::Panning => InteractionEvent::PanEnded,
            InteractionMode::Idle => InteractionEvent::None,
        }
    }

    /// Pointer left the canvas; treated exactly like a release
    pub fn pointer_leave(&mut self, viewport: &mut Viewport) -> InteractionEvent {
        self.pointer_up(viewport)
    }
}
