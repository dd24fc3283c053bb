use dla_field::FieldSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failures reading or writing the app config
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access config file: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Complete driver configuration for export/import
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version field for future compatibility
    pub version: u32,
    /// Growth settings handed to the field
    pub field: FieldSettings,
    /// Number of agents, root included
    pub agent_count: usize,
    pub width: usize,
    pub height: usize,
    /// Ticks advanced per frame
    pub steps_per_frame: usize,
    /// Stop after this many ticks even if agents are still wandering
    #[serde(default)]
    pub max_ticks: Option<u64>,
}

impl AppConfig {
    /// Export config to a JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Import config from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            field: FieldSettings::default(),
            agent_count: 3000,
            width: 100,
            height: 100,
            steps_per_frame: 5,
            max_ticks: None,
        }
    }
}

/// Where completed fields are saved when no path is given
pub fn default_snapshot_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("dla-field").join("snapshot.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dla_field::{Color, NeighborhoodType, RootAnchor};
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = AppConfig {
            version: 1,
            field: FieldSettings {
                neighborhood: NeighborhoodType::VonNeumann,
                root_anchor: RootAnchor::BottomCenter,
                agent_color: Color::new(10, 20, 30, 40),
                seed: Some(1234),
            },
            agent_count: 500,
            width: 64,
            height: 48,
            steps_per_frame: 12,
            max_ticks: Some(90_000),
        };

        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.version, config.version);
        assert_eq!(parsed.field, config.field);
        assert_eq!(parsed.agent_count, 500);
        assert_eq!(parsed.width, 64);
        assert_eq!(parsed.height, 48);
        assert_eq!(parsed.steps_per_frame, 12);
        assert_eq!(parsed.max_ticks, Some(90_000));
    }

    #[test]
    fn test_config_file_save_and_load() {
        let config = AppConfig::default();

        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_path_buf();

        config.save_to_file(&path).unwrap();
        let loaded = AppConfig::load_from_file(&path).unwrap();

        assert_eq!(loaded.version, config.version);
        assert_eq!(loaded.agent_count, config.agent_count);
        assert_eq!(loaded.field, config.field);
    }

    #[test]
    fn test_missing_tick_limit_defaults_to_none() {
        let json = r#"{
            "version": 1,
            "field": {
                "neighborhood": "Moore",
                "root_anchor": "Center",
                "agent_color": { "r": 255, "g": 0, "b": 0, "a": 100 }
            },
            "agent_count": 10,
            "width": 10,
            "height": 10,
            "steps_per_frame": 1
        }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.max_ticks, None);
        assert_eq!(config.field.seed, None);
    }

    #[test]
    fn test_invalid_config_file() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), "not valid json").unwrap();

        let result = AppConfig::load_from_file(temp_file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_config_file() {
        let result = AppConfig::load_from_file(Path::new("/nonexistent/path/config.json"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
