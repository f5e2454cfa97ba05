// SPDX-License-Identifier: MIT OR Apache-2.0
//! Project snapshots exchanged with the persistence layer.
//!
//! The editor never touches the file system. The host reads or writes the
//! text; this module only converts between text and [`ProjectSnapshot`].

use fsm_editor_graph::{Edge, Graph, Node};
use serde::{Deserialize, Serialize};

/// Name used when a project has none
pub const DEFAULT_PROJECT_NAME: &str = "Untitled FSM";

/// Errors converting project text
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    /// JSON could not be parsed or produced
    #[error("Invalid project JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// RON could not be parsed
    #[error("Invalid project RON: {0}")]
    RonParse(#[from] ron::error::SpannedError),

    /// RON could not be produced
    #[error("Could not write project RON: {0}")]
    Ron(#[from] ron::Error),
}

/// A saved diagram with the target settings chosen alongside it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    /// Project name
    #[serde(default = "default_name")]
    pub name: String,
    /// States
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Transitions
    #[serde(default)]
    pub edges: Vec<Edge>,
    /// Target microcontroller, opaque to the editor
    #[serde(default)]
    pub mcu: String,
    /// Output language, opaque to the editor
    #[serde(default)]
    pub language: String,
}

fn default_name() -> String {
    DEFAULT_PROJECT_NAME.to_string()
}

impl ProjectSnapshot {
    /// Capture the current graph under a name
    pub fn from_graph(name: impl Into<String>, graph: &Graph) -> Self {
        let parts = graph.to_parts();
        Self {
            name: name.into(),
            nodes: parts.nodes,
            edges: parts.edges,
            mcu: String::new(),
            language: String::new(),
        }
    }

    /// Set target settings
    pub fn with_target(mut self, mcu: impl Into<String>, language: impl Into<String>) -> Self {
        self.mcu = mcu.into();
        self.language = language.into();
        self
    }

    /// Parse from JSON
    pub fn from_json(text: &str) -> Result<Self, ProjectError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, ProjectError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from RON
    pub fn from_ron(text: &str) -> Result<Self, ProjectError> {
        Ok(ron::from_str(text)?)
    }

    /// Serialize to pretty RON
    pub fn to_ron(&self) -> Result<String, ProjectError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }
}

impl Default for ProjectSnapshot {
    fn default() -> Self {
        Self::from_graph(DEFAULT_PROJECT_NAME, &Graph::seed())
    }
}
