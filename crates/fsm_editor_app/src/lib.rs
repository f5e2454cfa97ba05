// SPDX-License-Identifier: MIT OR Apache-2.0
//! FSM Editor - editing core for state machine diagrams
//!
//! Everything a host shell needs to drive the diagram editor:
//! - Snapshot undo/redo with a bounded history
//! - Tool actions decoded from agent JSON envelopes
//! - Console log fed by editor events and tracing
//! - Latest-wins context mirror for an external agent
//! - Project snapshots in JSON or RON
//!
//! ## Architecture
//!
//! [`EditorState`] owns the [`fsm_editor_graph::GraphStore`] and is the only
//! way in: canvas drags, tool actions, undo/redo and project loads all pass
//! through it. The host owns windows, files and the network; it hands text
//! and pointer events in and reads snapshots back out.

pub mod commands;
pub mod config;
pub mod console;
pub mod context;
pub mod history;
pub mod project;
pub mod state;

pub use commands::{ActionResult, CommandError, ToolAction};
pub use config::EditorConfig;
pub use console::{init_tracing, ConsoleLog, LogEntry, Severity};
pub use context::{ContextSnapshot, ContextSync};
pub use history::{GraphSnapshot, History, MAX_HISTORY};
pub use project::{ProjectError, ProjectSnapshot};
pub use state::{EditorState, SharedEditor};
