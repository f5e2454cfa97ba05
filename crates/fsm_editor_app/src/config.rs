// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor configuration.

use crate::console::DEFAULT_CAPACITY;
use crate::history::MAX_HISTORY;
use fsm_editor_graph::viewport::GRID_SPACING;
use serde::{Deserialize, Serialize};

/// Tunables for one editor session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Undo depth
    pub max_history: usize,
    /// Snap dragged nodes to the grid on release
    pub snap_to_grid: bool,
    /// Grid spacing in graph units
    pub grid_size: f32,
    /// Console entries kept
    pub console_capacity: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_history: MAX_HISTORY,
            snap_to_grid: false,
            grid_size: GRID_SPACING,
            console_capacity: DEFAULT_CAPACITY,
        }
    }
}

impl EditorConfig {
    /// Parse from RON; missing fields take their defaults
    pub fn from_ron(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }

    /// Serialize to pretty RON
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EditorConfig::default();
        assert_eq!(config.max_history, 50);
        assert!(!config.snap_to_grid);
    }

    #[test]
    fn test_partial_ron() {
        let config = EditorConfig::from_ron("(snap_to_grid: true)").unwrap();
        assert!(config.snap_to_grid);
        assert_eq!(config.max_history, MAX_HISTORY);
        assert_eq!(config.grid_size, GRID_SPACING);
    }

    #[test]
    fn test_serialization() {
        let config = EditorConfig {
            max_history: 10,
            ..EditorConfig::default()
        };
        let ron_str = config.to_ron().unwrap();
        assert_eq!(EditorConfig::from_ron(&ron_str).unwrap(), config);
    }
}
