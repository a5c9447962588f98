//! Configuration system
//!
//! Engine settings are plain serde structs. Any [`Config`] type can be read
//! from or written to a TOML or RON file, chosen by the file extension.

use std::path::{Path, PathBuf};

pub use serde::{Deserialize, Serialize};

use crate::persistence::CodecKind;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        match Format::of(path)? {
            Format::Toml => toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            Format::Ron => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match Format::of(path)? {
            Format::Toml => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
            }
            Format::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

enum Format {
    Toml,
    Ron,
}

impl Format {
    fn of(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Top level engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Create and load a scene named `default_scene_name` when the engine
    /// initializes without any managed scene
    pub create_default_scene: bool,

    /// Name of the scene created by `create_default_scene`
    pub default_scene_name: String,

    /// Logging backend settings
    pub logging: LoggingConfig,

    /// Snapshot codec and save file settings
    pub persistence: PersistenceConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            create_default_scene: true,
            default_scene_name: "default".to_string(),
            logging: LoggingConfig::default(),
            persistence: PersistenceConfig::default(),
        }
    }
}

impl Config for EngineConfig {}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `env_logger` filter, overridden by `RUST_LOG`
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/// Save file configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Directory save files are written to
    pub save_directory: PathBuf,

    /// Extension of save files
    pub file_extension: String,

    /// Marker inserted before the extension of the Global scene's save file
    pub global_marker: String,

    /// Encoding used for snapshots
    pub codec: CodecKind,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            save_directory: PathBuf::from("saves"),
            file_extension: "sav".to_string(),
            global_marker: "glb".to_string(),
            codec: CodecKind::Binary,
        }
    }
}

impl PersistenceConfig {
    /// Path of the scene save file for a slot name
    pub fn scene_file(&self, name: &str) -> PathBuf {
        self.save_directory
            .join(format!("{name}.{}", self.file_extension))
    }

    /// Path of the Global scene save file for a slot name
    pub fn global_file(&self, name: &str) -> PathBuf {
        self.save_directory
            .join(format!("{name}.{}.{}", self.global_marker, self.file_extension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_files_share_the_slot_name() {
        let config = PersistenceConfig {
            save_directory: PathBuf::from("slots"),
            ..PersistenceConfig::default()
        };
        assert_eq!(config.scene_file("level1"), PathBuf::from("slots/level1.sav"));
        assert_eq!(config.global_file("level1"), PathBuf::from("slots/level1.glb.sav"));
    }

    #[test]
    fn config_round_trips_through_toml_and_ron() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = EngineConfig::default();
        config.persistence.codec = CodecKind::Text;
        config.create_default_scene = false;

        for file in ["engine.toml", "engine.ron"] {
            let path = dir.path().join(file);
            config.save_to_file(&path).unwrap();
            let loaded = EngineConfig::load_from_file(&path).unwrap();
            assert_eq!(loaded, config);
        }
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "create_default_scene = false\n").unwrap();

        let loaded = EngineConfig::load_from_file(&path).unwrap();
        assert!(!loaded.create_default_scene);
        assert_eq!(loaded.persistence, PersistenceConfig::default());
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = EngineConfig::default().save_to_file("engine.json").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }
}
