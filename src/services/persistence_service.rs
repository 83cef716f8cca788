// src/services/persistence_service.rs
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::persistence::ThumbpaneConfig;

const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug)]
pub enum PersistenceServiceError {
    IoError(std::io::Error),
    SerializationError(String),
}

impl std::fmt::Display for PersistenceServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistenceServiceError::IoError(err) => write!(f, "Persistence IO error: {}", err),
            PersistenceServiceError::SerializationError(msg) => {
                write!(f, "Serialization error: {}", msg)
            }
        }
    }
}

impl std::error::Error for PersistenceServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistenceServiceError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PersistenceServiceError {
    fn from(err: std::io::Error) -> Self {
        PersistenceServiceError::IoError(err)
    }
}

/// Reads and writes `config.json` inside a config directory.
#[derive(Debug)]
pub struct PersistenceService {
    config_dir: PathBuf,
}

impl PersistenceService {
    pub fn new(config_dir: PathBuf) -> io::Result<Self> {
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }
        Ok(Self { config_dir })
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }

    /// Loads the stored config. A missing or unreadable file gives the default.
    pub fn load_config(&self) -> ThumbpaneConfig {
        let config_path = self.config_path();
        if !config_path.exists() {
            log::debug!(
                "PersistenceService: No config at {}, using defaults.",
                config_path.display()
            );
            return ThumbpaneConfig::default();
        }

        match fs::read_to_string(&config_path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                log::warn!(
                    "PersistenceService: Failed to parse {}: {}. Using defaults.",
                    config_path.display(),
                    e
                );
                ThumbpaneConfig::default()
            }),
            Err(e) => {
                log::warn!(
                    "PersistenceService: Failed to read {}: {}. Using defaults.",
                    config_path.display(),
                    e
                );
                ThumbpaneConfig::default()
            }
        }
    }

    pub fn save_config(&self, config: &ThumbpaneConfig) -> Result<(), PersistenceServiceError> {
        let json = serde_json::to_string_pretty(config).map_err(|e| {
            PersistenceServiceError::SerializationError(format!("Failed to serialize config: {}", e))
        })?;
        write_atomically(&self.config_path(), json.as_bytes())?;
        Ok(())
    }
}

// Write to a sibling temp file first so a crash never leaves half a config.
fn write_atomically(path: &Path, contents: &[u8]) -> io::Result<()> {
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, contents)?;
    fs::rename(&tmp_path, path)
}
