// SPDX-License-Identifier: MIT OR Apache-2.0
//! State machine graph framework for the FSM editor.
//!
//! This crate holds everything that is a pure function of the diagram or of
//! transient view state:
//! - States (nodes) and transitions (edges)
//! - The graph store with selection and change listeners
//! - Viewport transform and pointer interaction
//! - Edge routing
//! - Structural validation
//!
//! ## Architecture
//!
//! [`GraphStore`] is the only writable state. Routing and viewport math are
//! recomputed from it on demand and keep nothing of their own; the egui
//! canvas in [`ui`] reports pointer events back instead of writing.

pub mod node;
pub mod edge;
pub mod graph;
pub mod store;
pub mod viewport;
pub mod router;
pub mod validation;
pub mod ui;

pub use edge::{Edge, EdgeId};
pub use graph::{Graph, GraphError, GraphParts};
pub use node::{Node, NodeId, NodeKind, NodePatch, NODE_HEIGHT, NODE_WIDTH};
pub use router::{route, route_edges, EdgePath};
pub use store::{GraphChanged, GraphStore, ListenerId};
pub use validation::{validate, IssueKind, ValidationIssue, ValidationReport};
pub use viewport::{Interaction, InteractionEvent, InteractionMode, PointerButton, Viewport};

/// Re-exported so hosts can pass pointer positions without depending on egui directly
pub use egui::{Pos2, Vec2};
