//! Thumbnail lookup against the shared, MD5-named PNG cache, plus the
//! ordered catalog a thumbnail pane displays.
//!
//! A source path becomes a `file://` URI ([`uri`]), the URI's MD5 names the
//! cache file ([`thumbnail`]), and [`ThumbnailResolver`] loads it or hands
//! back a placeholder. [`ImageCatalog`] keeps the results in order, tracks
//! the selection and asks a [`GenerationRequester`] for missing thumbnails.

pub mod persistence;
pub mod services;
pub mod thumbnail;
pub mod uri;

#[cfg(test)]
mod tests_common;

pub use persistence::{ThumbpaneConfig, default_cache_root};
pub use services::catalog_service::{CatalogEntry, CatalogError, EntryHandle, ImageCatalog};
pub use services::generation_queue::{GenerationQueue, GenerationRequester, ThumbnailGenerationJob};
pub use services::persistence_service::{PersistenceService, PersistenceServiceError};
pub use services::thumbnail_service::{
    PlaceholderSource, ResolutionStatus, ThumbnailImage, ThumbnailResolver, ThumbnailServiceError,
};
pub use thumbnail::{CacheDigest, CachePath, ThumbnailSize, digest, resolve_path, resolve_sized_path};
pub use uri::{CanonicalUri, canonicalize, canonicalize_bytes};
