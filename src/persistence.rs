// src/persistence.rs

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::thumbnail::ThumbnailSize;

/// Decoded hits kept in memory by default.
pub const DEFAULT_MEMORY_CACHE_CAPACITY: usize = 64;

/// Everything the resolver needs to know about its environment. Built by the
/// caller; the engine itself never looks at the process environment.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ThumbpaneConfig {
    /// Root of the shared thumbnail cache (the directory holding `normal/`).
    pub cache_root: PathBuf,
    pub thumbnail_size: ThumbnailSize,
    /// Image shown while no cached thumbnail exists. `None` uses the built-in one.
    pub placeholder_path: Option<PathBuf>,
    /// Number of decoded hits kept in memory; 0 turns the memory cache off.
    pub memory_cache_capacity: usize,
}

impl ThumbpaneConfig {
    pub fn with_cache_root(cache_root: impl Into<PathBuf>) -> Self {
        Self {
            cache_root: cache_root.into(),
            ..Self::default()
        }
    }
}

impl Default for ThumbpaneConfig {
    fn default() -> Self {
        Self {
            cache_root: default_cache_root(),
            thumbnail_size: ThumbnailSize::Normal,
            placeholder_path: None,
            memory_cache_capacity: DEFAULT_MEMORY_CACHE_CAPACITY,
        }
    }
}

/// Locates the user's shared thumbnail cache.
///
/// Prefers `<cache dir>/thumbnails`, then the legacy `~/.thumbnails`, then a
/// directory relative to the working directory.
pub fn default_cache_root() -> PathBuf {
    dirs::cache_dir()
        .map(|cache| cache.join("thumbnails"))
        .or_else(|| dirs::home_dir().map(|home| home.join(".thumbnails")))
        .unwrap_or_else(|| PathBuf::from(".thumbnails"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let config: ThumbpaneConfig =
            serde_json::from_str(r#"{ "cache_root": "/srv/thumbs", "thumbnail_size": "large" }"#)
                .expect("partial config should parse");
        assert_eq!(config.cache_root, PathBuf::from("/srv/thumbs"));
        assert_eq!(config.thumbnail_size, ThumbnailSize::Large);
        assert_eq!(config.placeholder_path, None);
        assert_eq!(config.memory_cache_capacity, DEFAULT_MEMORY_CACHE_CAPACITY);
    }

    #[test]
    fn test_with_cache_root_keeps_other_defaults() {
        let config = ThumbpaneConfig::with_cache_root("/tmp/thumbs");
        assert_eq!(config.cache_root, PathBuf::from("/tmp/thumbs"));
        assert_eq!(config.thumbnail_size, ThumbnailSize::Normal);
    }

    #[test]
    fn test_default_cache_root_ends_in_thumbnails_dir() {
        let root = default_cache_root();
        let name = root.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name == "thumbnails" || name == ".thumbnails", "unexpected root {:?}", root);
    }
}
