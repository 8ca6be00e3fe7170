// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor configuration.
//!
//! Stored as RON next to the executable. A missing file means defaults.

use crate::error::Result;
use crate::history::DEFAULT_MAX_DEPTH;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = "glvl_editor.ron";

/// Grid used when placement snap is toggled on
pub const PLACEMENT_SNAP_GRID: f32 = 0.5;

/// Terrain streaming settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Whether to run the streaming worker at all
    pub enabled: bool,
    /// Blocks closer than this (to their bounding sphere) are streamed in
    pub radius: f32,
    /// How long the worker sleeps waiting for a new camera position (ms)
    pub poll_interval_ms: u64,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            radius: 500.0,
            poll_interval_ms: 50,
        }
    }
}

/// Editor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum entries per history stack
    pub history_depth: usize,
    /// Frames during which scene clicks are ignored after a mode switch
    pub click_debounce_frames: u32,
    /// Placement grid snap; 0 disables it
    pub placement_snap: f32,
    /// Rotation snap step in degrees
    pub rotation_snap_degrees: f32,
    /// Whether rotation snap starts enabled
    pub rotation_snap: bool,
    /// Gizmo aligned to world axes
    pub world_transform: bool,
    /// Multi-selections rotate each node in place
    pub local_rotation: bool,
    /// Camera fly speed (units per second)
    pub camera_speed: f32,
    /// Far clip distance at startup
    pub far_clip: f32,
    /// Restart ghost playback at the end of the recording
    pub ghost_loop: bool,
    /// Terrain streaming
    pub streaming: StreamingConfig,
    /// Object library used for the palette
    pub object_library_path: Option<PathBuf>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_depth: DEFAULT_MAX_DEPTH,
            click_debounce_frames: 2,
            placement_snap: 0.0,
            rotation_snap_degrees: 15.0,
            rotation_snap: false,
            world_transform: false,
            local_rotation: false,
            camera_speed: 50.0,
            far_clip: 10000.0,
            ghost_loop: false,
            streaming: StreamingConfig::default(),
            object_library_path: None,
        }
    }
}

impl EditorConfig {
    /// Load from a RON file; a missing file yields defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No configuration at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = ron::from_str(&content)?;
        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save to a RON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let ron_str = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        std::fs::write(path, ron_str)?;
        tracing::info!("Saved configuration to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EditorConfig::default();
        assert_eq!(config.history_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.placement_snap, 0.0);
        assert!(config.streaming.enabled);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EditorConfig::load(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config, EditorConfig::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "(history_depth: 8, local_rotation: true)").unwrap();

        let config = EditorConfig::load(&path).unwrap();
        assert_eq!(config.history_depth, 8);
        assert!(config.local_rotation);
        assert_eq!(config.rotation_snap_degrees, 15.0);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let config = EditorConfig {
            ghost_loop: true,
            object_library_path: Some(PathBuf::from("database/objects.ron")),
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(EditorConfig::load(&path).unwrap(), config);
    }
}
