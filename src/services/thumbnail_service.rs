// src/services/thumbnail_service.rs

use std::fmt;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use image::{ImageError, Rgba, RgbaImage};
use lru::LruCache;
use rayon::prelude::*;

use crate::persistence::ThumbpaneConfig;
use crate::thumbnail::{CachePath, ThumbnailSize, cache_path_for};

/// Edge length of the built-in placeholder.
const BUILTIN_PLACEHOLDER_EDGE: u32 = 128;
const BUILTIN_PLACEHOLDER_CELL: u32 = 16;

/// Decoded thumbnail pixels. Cloning shares the same immutable buffer.
#[derive(Clone)]
pub struct ThumbnailImage {
    pixels: Arc<RgbaImage>,
}

impl ThumbnailImage {
    pub fn new(pixels: RgbaImage) -> Self {
        Self {
            pixels: Arc::new(pixels),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// True when both handles point at the same decoded buffer.
    pub fn same_image(&self, other: &ThumbnailImage) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }
}

impl fmt::Debug for ThumbnailImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThumbnailImage")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

/// Whether a lookup found a cached thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStatus {
    Hit,
    Miss,
}

/// Where the placeholder shown on a miss comes from.
#[derive(Debug, Clone)]
pub enum PlaceholderSource {
    File(PathBuf),
    /// Encoded image bytes in any format the `image` crate can sniff.
    Encoded(Vec<u8>),
    Builtin,
}

impl PlaceholderSource {
    pub fn from_config(config: &ThumbpaneConfig) -> Self {
        match &config.placeholder_path {
            Some(path) => PlaceholderSource::File(path.clone()),
            None => PlaceholderSource::Builtin,
        }
    }

    fn load(&self) -> Result<ThumbnailImage, ThumbnailServiceError> {
        match self {
            PlaceholderSource::File(path) => image::open(path)
                .map(|img| ThumbnailImage::new(img.to_rgba8()))
                .map_err(|e| {
                    ThumbnailServiceError::PlaceholderLoad(path.clone(), SerializableImageError::from(&e))
                }),
            PlaceholderSource::Encoded(bytes) => image::load_from_memory(bytes)
                .map(|img| ThumbnailImage::new(img.to_rgba8()))
                .map_err(|e| ThumbnailServiceError::PlaceholderDecode(SerializableImageError::from(&e))),
            PlaceholderSource::Builtin => Ok(builtin_placeholder()),
        }
    }
}

fn builtin_placeholder() -> ThumbnailImage {
    let pixels = RgbaImage::from_fn(BUILTIN_PLACEHOLDER_EDGE, BUILTIN_PLACEHOLDER_EDGE, |x, y| {
        if (x / BUILTIN_PLACEHOLDER_CELL + y / BUILTIN_PLACEHOLDER_CELL) % 2 == 0 {
            Rgba([96, 96, 96, 255])
        } else {
            Rgba([160, 160, 160, 255])
        }
    });
    ThumbnailImage::new(pixels)
}

/// Image error flattened to its message so it can be cloned and compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializableImageError {
    pub message: String,
}

impl fmt::Display for SerializableImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<&ImageError> for SerializableImageError {
    fn from(err: &ImageError) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThumbnailServiceError {
    /// The configured placeholder file could not be opened or decoded.
    PlaceholderLoad(PathBuf, SerializableImageError),
    /// In-memory placeholder bytes could not be decoded.
    PlaceholderDecode(SerializableImageError),
    InvalidConfig(String),
}

impl fmt::Display for ThumbnailServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThumbnailServiceError::PlaceholderLoad(path, err) => {
                write!(f, "Failed to load placeholder image {}: {}", path.display(), err)
            }
            ThumbnailServiceError::PlaceholderDecode(err) => {
                write!(f, "Failed to decode placeholder image: {}", err)
            }
            ThumbnailServiceError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ThumbnailServiceError {}

/// Size and modification time of a cache file, used to tell whether a
/// remembered decode still matches what is on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
}

impl FileStamp {
    fn read(path: &Path) -> Option<Self> {
        let metadata = fs::metadata(path).ok()?;
        Some(Self {
            modified: metadata.modified().ok(),
            len: metadata.len(),
        })
    }
}

/// Opens and decodes the file at a cache path.
pub fn load_cached_thumbnail(cache_path: &Path) -> Result<ThumbnailImage, ImageError> {
    image::open(cache_path).map(|img| ThumbnailImage::new(img.to_rgba8()))
}

/// Looks up cached thumbnails for source files and falls back to the
/// placeholder when none is available.
pub struct ThumbnailResolver {
    cache_root: PathBuf,
    size: ThumbnailSize,
    placeholder: ThumbnailImage,
    // Hits only, stamped with the file they were decoded from. Every lookup
    // re-stats the cache path, so deleted or replaced files are noticed.
    memory_cache: Option<LruCache<CachePath, (FileStamp, ThumbnailImage)>>,
}

impl ThumbnailResolver {
    /// Builds a resolver with the placeholder named by the config.
    pub fn new(config: &ThumbpaneConfig) -> Result<Self, ThumbnailServiceError> {
        Self::with_placeholder(config, PlaceholderSource::from_config(config))
    }

    /// Builds a resolver with an explicit placeholder. A placeholder that
    /// cannot be loaded is fatal.
    pub fn with_placeholder(
        config: &ThumbpaneConfig,
        placeholder: PlaceholderSource,
    ) -> Result<Self, ThumbnailServiceError> {
        if config.cache_root.as_os_str().is_empty() {
            return Err(ThumbnailServiceError::InvalidConfig(
                "cache_root must not be empty".to_string(),
            ));
        }

        let placeholder = placeholder.load().map_err(|e| {
            log::error!("ThumbnailService: {}", e);
            e
        })?;

        log::debug!(
            "ThumbnailService: Resolving from {} ({}), placeholder {}x{}",
            config.cache_root.display(),
            config.thumbnail_size,
            placeholder.width(),
            placeholder.height()
        );

        Ok(Self {
            cache_root: config.cache_root.clone(),
            size: config.thumbnail_size,
            placeholder,
            memory_cache: NonZeroUsize::new(config.memory_cache_capacity).map(LruCache::new),
        })
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    pub fn size(&self) -> ThumbnailSize {
        self.size
    }

    pub fn placeholder(&self) -> &ThumbnailImage {
        &self.placeholder
    }

    /// Where the cached thumbnail for `source` would live.
    pub fn cache_path(&self, source: &Path) -> CachePath {
        cache_path_for(source, &self.cache_root, self.size)
    }

    /// Returns the cached thumbnail for `source`, or the placeholder on a miss.
    pub fn resolve(&mut self, source: &Path) -> (ThumbnailImage, ResolutionStatus) {
        warn_if_degenerate(source);
        let cache_path = self.cache_path(source);
        if let Some(image) = self.lookup_memory(&cache_path) {
            return (image, ResolutionStatus::Hit);
        }
        let loaded = load_cached_thumbnail(cache_path.as_path());
        self.complete(source, cache_path, loaded)
    }

    /// Resolves a batch, decoding cache files in parallel. Results come back
    /// in input order.
    pub fn resolve_many(&mut self, sources: &[PathBuf]) -> Vec<(ThumbnailImage, ResolutionStatus)> {
        let cache_paths: Vec<CachePath> = sources
            .iter()
            .map(|source| {
                warn_if_degenerate(source);
                self.cache_path(source)
            })
            .collect();
        let from_memory: Vec<Option<ThumbnailImage>> =
            cache_paths.iter().map(|path| self.lookup_memory(path)).collect();

        let from_disk: Vec<Option<Result<ThumbnailImage, ImageError>>> = cache_paths
            .par_iter()
            .zip(from_memory.par_iter())
            .map(|(path, cached)| match cached {
                Some(_) => None,
                None => Some(load_cached_thumbnail(path.as_path())),
            })
            .collect();

        sources
            .iter()
            .zip(cache_paths)
            .zip(from_memory.into_iter().zip(from_disk))
            .map(|((source, cache_path), (cached, loaded))| match (cached, loaded) {
                (Some(image), _) => (image, ResolutionStatus::Hit),
                (None, Some(loaded)) => self.complete(source, cache_path, loaded),
                // Every entry is either in memory or was probed on disk.
                (None, None) => (self.placeholder.clone(), ResolutionStatus::Miss),
            })
            .collect()
    }

    /// Drops the remembered decode for `source`, if any.
    pub fn forget(&mut self, source: &Path) {
        let cache_path = self.cache_path(source);
        if let Some(cache) = self.memory_cache.as_mut() {
            cache.pop(&cache_path);
        }
    }

    pub fn clear_memory_cache(&mut self) {
        if let Some(cache) = self.memory_cache.as_mut() {
            cache.clear();
        }
    }

    fn lookup_memory(&mut self, cache_path: &CachePath) -> Option<ThumbnailImage> {
        let cache = self.memory_cache.as_mut()?;
        let Some(on_disk) = FileStamp::read(cache_path.as_path()) else {
            // Gone from disk: the decode is stale and the lookup is a miss.
            cache.pop(cache_path);
            return None;
        };
        match cache.get(cache_path) {
            Some((stamp, image)) if *stamp == on_disk => Some(image.clone()),
            _ => None,
        }
    }

    fn complete(
        &mut self,
        source: &Path,
        cache_path: CachePath,
        loaded: Result<ThumbnailImage, ImageError>,
    ) -> (ThumbnailImage, ResolutionStatus) {
        match loaded {
            Ok(image) => {
                log::debug!(
                    "ThumbnailService: Hit for {} at {}",
                    source.display(),
                    cache_path.as_path().display()
                );
                if let Some(cache) = self.memory_cache.as_mut() {
                    match FileStamp::read(cache_path.as_path()) {
                        Some(stamp) => {
                            cache.put(cache_path, (stamp, image.clone()));
                        }
                        None => {
                            cache.pop(&cache_path);
                        }
                    }
                }
                (image, ResolutionStatus::Hit)
            }
            Err(e) => {
                // Missing, unreadable and corrupt files are all plain misses.
                log::debug!(
                    "ThumbnailService: Miss for {} at {}: {}",
                    source.display(),
                    cache_path.as_path().display(),
                    e
                );
                if let Some(cache) = self.memory_cache.as_mut() {
                    cache.pop(&cache_path);
                }
                (self.placeholder.clone(), ResolutionStatus::Miss)
            }
        }
    }
}

impl fmt::Debug for ThumbnailResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThumbnailResolver")
            .field("cache_root", &self.cache_root)
            .field("size", &self.size)
            .field("placeholder", &self.placeholder)
            .field(
                "memory_cache_len",
                &self.memory_cache.as_ref().map_or(0, |cache| cache.len()),
            )
            .finish()
    }
}

fn warn_if_degenerate(source: &Path) {
    if source.as_os_str().is_empty() {
        log::warn!("ThumbnailService: Resolving an empty path; it canonicalizes to a bare file:// URI");
    }
}
