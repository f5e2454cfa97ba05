// SPDX-License-Identifier: MIT OR Apache-2.0
//! egui canvas for the state diagram.
//!
//! The canvas never writes to the graph. It paints the current graph through
//! the [`Viewport`] and [`crate::router`], feeds raw pointer input into the
//! [`Interaction`] state machine, and hands the resulting events back to the
//! caller, which applies them through its store and history.

use crate::graph::Graph;
use crate::node::{Node, NodeId};
use crate::router::route;
use crate::viewport::{Interaction, InteractionEvent, PointerButton, Viewport, GRID_SPACING};
use egui::{Align2, Color32, FontId, Pos2, Rect, Stroke, Vec2};

/// Bezier flattening resolution
const EDGE_SEGMENTS: usize = 32;
const EDGE_THICKNESS: f32 = 2.0;
const NODE_ROUNDING: f32 = 6.0;
const ARROW_SIZE: f32 = 8.0;

/// Display toggles for the canvas
#[derive(Debug, Clone)]
pub struct CanvasOptions {
    /// Draw the background grid
    pub show_grid: bool,
    /// Draw edge labels
    pub show_edge_labels: bool,
}

impl Default for CanvasOptions {
    fn default() -> Self {
        Self {
            show_grid: true,
            show_edge_labels: true,
        }
    }
}

/// Everything the canvas observed this frame
#[derive(Debug, Clone, Default)]
pub struct CanvasOutput {
    /// Interaction events, in the order they happened
    pub events: Vec<InteractionEvent>,
    /// Node under the pointer
    pub hovered: Option<NodeId>,
}

/// Render the diagram and process pointer input
pub fn show(
    ui: &mut egui::Ui,
    graph: &Graph,
    selection: Option<&NodeId>,
    viewport: &mut Viewport,
    interaction: &mut Interaction,
    options: &CanvasOptions,
) -> CanvasOutput {
    let rect = ui.available_rect_before_wrap();
    let response = ui.allocate_rect(rect, egui::Sense::click_and_drag());
    let painter = ui.painter_at(rect);
    let mut output = CanvasOutput::default();

    handle_input(ui, &response, rect, graph, viewport, interaction, &mut output);

    painter.rect_filled(rect, 0.0, Color32::from_rgb(28, 28, 32));
    if options.show_grid {
        draw_grid(&painter, rect, viewport);
    }
    draw_edges(&painter, rect, graph, viewport, options);
    for node in graph.nodes() {
        let selected = selection == Some(&node.id);
        let hovered = output.hovered.as_ref() == Some(&node.id);
        draw_node(&painter, rect, node, viewport, selected, hovered);
    }

    output
}

fn to_screen(viewport: &Viewport, rect: Rect, pos: Pos2) -> Pos2 {
    viewport.graph_to_screen(pos) + rect.min.to_vec2()
}

fn handle_input(
    ui: &egui::Ui,
    response: &egui::Response,
    rect: Rect,
    graph: &Graph,
    viewport: &mut Viewport,
    interaction: &mut Interaction,
    output: &mut CanvasOutput,
) {
    let (hover, shift, scroll, pressed, released) = ui.input(|i| {
        let pressed = if i.pointer.button_pressed(egui::PointerButton::Middle) {
            Some(PointerButton::Middle)
        } else if i.pointer.button_pressed(egui::PointerButton::Primary) {
            Some(PointerButton::Primary)
        } else if i.pointer.button_pressed(egui::PointerButton::Secondary) {
            Some(PointerButton::Secondary)
        } else {
            None
        };
        (
            i.pointer.hover_pos(),
            i.modifiers.shift,
            i.raw_scroll_delta.y,
            pressed,
            i.pointer.any_released(),
        )
    });

    let inside = hover.filter(|pos| rect.contains(*pos));
    let Some(pointer) = inside else {
        // Leaving the canvas ends any drag or pan.
        let event = interaction.pointer_leave(viewport);
        if event != InteractionEvent::None {
            output.events.push(event);
        }
        return;
    };
    let local = pointer - rect.min.to_vec2();

    output.hovered = graph.node_at(viewport.screen_to_graph(local)).cloned();

    if response.hovered() && scroll != 0.0 {
        viewport.wheel(scroll);
    }

    if let Some(button) = pressed {
        let hit = output
            .hovered
            .as_ref()
            .and_then(|id| graph.node(id))
            .map(|node| (node.id.clone(), node.position()));
        output
            .events
            .push(interaction.pointer_down(viewport, button, shift, local, hit));
    }

    let moved = interaction.pointer_move(viewport, local);
    if moved != InteractionEvent::None {
        output.events.push(moved);
    }

    if released {
        output.events.push(interaction.pointer_up(viewport));
    }

    output.events.retain(|event| *event != InteractionEvent::None);
}

fn draw_grid(painter: &egui::Painter, rect: Rect, viewport: &Viewport) {
    let spacing = GRID_SPACING * viewport.zoom();
    if spacing < 4.0 {
        return;
    }
    let color = Color32::from_rgba_unmultiplied(70, 70, 70, 110);

    let mut x = rect.left() + viewport.pan.x.rem_euclid(spacing);
    while x < rect.right() {
        painter.line_segment(
            [Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())],
            Stroke::new(1.0, color),
        );
        x += spacing;
    }

    let mut y = rect.top() + viewport.pan.y.rem_euclid(spacing);
    while y < rect.bottom() {
        painter.line_segment(
            [Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)],
            Stroke::new(1.0, color),
        );
        y += spacing;
    }
}

fn draw_edges(
    painter: &egui::Painter,
    rect: Rect,
    graph: &Graph,
    viewport: &Viewport,
    options: &CanvasOptions,
) {
    let color = Color32::from_rgb(170, 170, 190);
    let stroke = Stroke::new(EDGE_THICKNESS * viewport.zoom(), color);

    for edge in graph.edges() {
        let path = route(graph.node(&edge.source), graph.node(&edge.target));
        if path.is_empty() {
            continue;
        }

        let points: Vec<Pos2> = path
            .sample(EDGE_SEGMENTS)
            .into_iter()
            .map(|p| to_screen(viewport, rect, p))
            .collect();
        for pair in points.windows(2) {
            painter.line_segment([pair[0], pair[1]], stroke);
        }
        if let Some(tip) = points.last() {
            draw_arrow_head(painter, *tip, viewport.zoom(), color);
        }

        if let (true, Some(label), Some(anchor)) =
            (options.show_edge_labels, edge.label.as_deref(), path.label_anchor())
        {
            painter.text(
                to_screen(viewport, rect, anchor),
                Align2::CENTER_CENTER,
                label,
                FontId::proportional(11.0 * viewport.zoom()),
                Color32::from_rgb(220, 220, 160),
            );
        }
    }
}

fn draw_arrow_head(painter: &egui::Painter, tip: Pos2, zoom: f32, color: Color32) {
    let size = ARROW_SIZE * zoom;
    let left = tip + Vec2::new(-size / 2.0, -size);
    let right = tip + Vec2::new(size / 2.0, -size);
    painter.add(egui::Shape::convex_polygon(vec![tip, left, right], color, Stroke::NONE));
}

fn draw_node(
    painter: &egui::Painter,
    rect: Rect,
    node: &Node,
    viewport: &Viewport,
    selected: bool,
    hovered: bool,
) {
    let bounds = node.rect();
    let screen = Rect::from_min_max(
        to_screen(viewport, rect, bounds.min),
        to_screen(viewport, rect, bounds.max),
    );
    let [r, g, b] = node.kind.color();
    let rounding = NODE_ROUNDING * viewport.zoom();

    painter.rect_filled(screen, rounding, Color32::from_rgb(r, g, b));

    let outline = if selected {
        Stroke::new(2.5, Color32::from_rgb(255, 200, 60))
    } else if hovered {
        Stroke::new(1.5, Color32::WHITE)
    } else {
        Stroke::new(1.0, Color32::from_gray(20))
    };
    painter.rect_stroke(screen, rounding, outline);

    painter.text(
        screen.center(),
        Align2::CENTER_CENTER,
        &node.label,
        FontId::proportional(14.0 * viewport.zoom()),
        Color32::WHITE,
    );
    painter.text(
        screen.right_top() + Vec2::new(-4.0, 3.0) * viewport.zoom(),
        Align2::RIGHT_TOP,
        node.kind.as_str(),
        FontId::monospace(9.0 * viewport.zoom()),
        Color32::from_white_alpha(160),
    );
}
