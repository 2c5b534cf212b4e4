//! Editor configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Storage key rewritten after every settled change.
pub const AUTOSAVE_KEY: &str = "design_autosave";

/// Storage key for the manually saved snapshot.
pub const BACKUP_KEY: &str = "design_backup";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Tunables of the editing surface.
///
/// Every field has a default, so a config file only needs the values it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Maximum number of undo snapshots kept.
    pub history_limit: usize,
    /// Offset applied to both axes by duplicate.
    pub duplicate_offset: f64,
    /// Smallest width/height a transform may commit.
    pub min_transform_size: f64,
    /// Rotation step used while snapping.
    pub rotation_snap_degrees: f64,
    /// Pointer hit tolerance in canvas units.
    pub hit_tolerance: f64,
    /// Horizontal placement range `[start, start + span)` for new shapes.
    pub placement_x: (f64, f64),
    /// Vertical placement range `[start, start + span)` for new shapes.
    pub placement_y: (f64, f64),
    /// Largest box an imported image is fitted into once its size is known.
    pub image_max_size: (f64, f64),
    pub autosave_key: String,
    pub backup_key: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: 100,
            duplicate_offset: 20.0,
            min_transform_size: 5.0,
            rotation_snap_degrees: 15.0,
            hit_tolerance: 4.0,
            placement_x: (150.0, 300.0),
            placement_y: (100.0, 250.0),
            image_max_size: (480.0, 360.0),
            autosave_key: AUTOSAVE_KEY.to_string(),
            backup_key: BACKUP_KEY.to_string(),
        }
    }
}

impl EditorConfig {
    /// Parse a config from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a config file, falling back to defaults when it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.history_limit, 100);
        assert_eq!(config.autosave_key, "design_autosave");
        assert_eq!(config.backup_key, "design_backup");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EditorConfig::from_json(r#"{"historyLimit": 10}"#).unwrap();
        assert_eq!(config.history_limit, 10);
        assert!((config.duplicate_offset - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            EditorConfig::from_json("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EditorConfig::load_or_default(&dir.path().join("missing.json")).unwrap();
        assert_eq!(config, EditorConfig::default());
    }
}
