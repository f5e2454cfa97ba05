// SPDX-License-Identifier: MIT OR Apache-2.0
//! State (node) definitions for the FSM graph.

use egui::{Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Logical node width in graph space
pub const NODE_WIDTH: f32 = 140.0;
/// Logical node height in graph space
pub const NODE_HEIGHT: f32 = 50.0;

/// Unique identifier for a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        let uuid = Uuid::new_v4().simple().to_string();
        Self(format!("state_{}", &uuid[..8]))
    }

    /// Borrow the raw id
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Role tag of a state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Entry state
    Input,
    /// Ordinary processing state
    #[default]
    Process,
    /// Terminal state
    Output,
    /// Branching state
    Decision,
    /// Error handling state
    Error,
    /// Hardware access state
    Hardware,
    /// Timed wait
    Delay,
    /// Interrupt service state
    Interrupt,
}

impl NodeKind {
    /// All kinds in palette order
    pub const ALL: [NodeKind; 8] = [
        NodeKind::Input,
        NodeKind::Process,
        NodeKind::Output,
        NodeKind::Decision,
        NodeKind::Error,
        NodeKind::Hardware,
        NodeKind::Delay,
        NodeKind::Interrupt,
    ];

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Process => "process",
            Self::Output => "output",
            Self::Decision => "decision",
            Self::Error => "error",
            Self::Hardware => "hardware",
            Self::Delay => "delay",
            Self::Interrupt => "interrupt",
        }
    }

    /// Parse a wire name, ignoring case
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name))
    }

    /// Fill color used by the canvas
    pub fn color(&self) -> [u8; 3] {
        match self {
            Self::Input => [46, 160, 67],
            Self::Process => [56, 108, 176],
            Self::Output => [200, 120, 40],
            Self::Decision => [150, 90, 180],
            Self::Error => [200, 60, 60],
            Self::Hardware => [90, 140, 140],
            Self::Delay => [160, 150, 60],
            Self::Interrupt => [190, 70, 130],
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A state in the diagram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique id
    pub id: NodeId,
    /// Display label
    pub label: String,
    /// Role tag
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Top-left corner, graph space
    pub x: f32,
    /// Top-left corner, graph space
    pub y: f32,
    /// Code run on entering the state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_action: Option<String>,
}

impl Node {
    /// Create a node at the origin
    pub fn new(id: impl Into<NodeId>, label: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
            x: 0.0,
            y: 0.0,
            entry_action: None,
        }
    }

    /// Set the position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Set the entry action
    pub fn with_entry_action(mut self, code: impl Into<String>) -> Self {
        self.entry_action = Some(code.into());
        self
    }

    /// Top-left corner as a point
    pub fn position(&self) -> Pos2 {
        Pos2::new(self.x, self.y)
    }

    /// Bounding box in graph space
    pub fn rect(&self) -> Rect {
        Rect::from_min_size(self.position(), Vec2::new(NODE_WIDTH, NODE_HEIGHT))
    }

    /// Merge the fields set in `patch`, leaving the rest untouched.
    ///
    /// Returns `true` if anything changed.
    pub fn apply(&mut self, patch: &NodePatch) -> bool {
        let before = self.clone();
        if let Some(label) = &patch.label {
            self.label.clone_from(label);
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }
        if let Some(code) = &patch.entry_action {
            self.entry_action = Some(code.clone());
        }
        *self != before
    }
}

/// Partial node fields for merge updates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    /// New label
    pub label: Option<String>,
    /// New kind
    pub kind: Option<NodeKind>,
    /// New x
    pub x: Option<f32>,
    /// New y
    pub y: Option<f32>,
    /// New entry action
    pub entry_action: Option<String>,
}

impl NodePatch {
    /// Whether the patch sets no field at all
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse() {
        assert_eq!(NodeKind::parse("INPUT"), Some(NodeKind::Input));
        assert_eq!(NodeKind::parse(" delay "), Some(NodeKind::Delay));
        assert_eq!(NodeKind::parse("state"), None);
    }

    #[test]
    fn test_patch_merges_only_set_fields() {
        let mut node = Node::new("a", "A", NodeKind::Process)
            .with_position(10.0, 20.0)
            .with_entry_action("led_on();");

        let changed = node.apply(&NodePatch {
            label: Some("Renamed".into()),
            ..NodePatch::default()
        });

        assert!(changed);
        assert_eq!(node.label, "Renamed");
        assert_eq!(node.kind, NodeKind::Process);
        assert_eq!((node.x, node.y), (10.0, 20.0));
        assert_eq!(node.entry_action.as_deref(), Some("led_on();"));

        assert!(!node.apply(&NodePatch::default()));
    }

    #[test]
    fn test_serde_field_names() {
        let node = Node::new("n1", "Idle", NodeKind::Input).with_entry_action("init();");
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "input");
        assert_eq!(json["entryAction"], "init();");
        let back: Node = serde_json::from_value(json).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_generated_ids_differ() {
        assert_ne!(NodeId::new(), NodeId::new());
    }
}
