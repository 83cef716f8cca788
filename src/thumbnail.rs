// src/thumbnail.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use strum_macros::{Display, EnumIter, EnumString};

use crate::uri::CanonicalUri;

/// Extension of every file in the shared thumbnail cache.
pub const THUMBNAIL_EXTENSION: &str = "png";

/// Number of hex characters in a cache digest (two per MD5 output byte).
pub const DIGEST_HEX_LEN: usize = 32;

/// Size buckets of the shared thumbnail cache. Each maps to a subdirectory
/// of the cache root.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
pub enum ThumbnailSize {
    #[default]
    #[strum(serialize = "normal")]
    #[serde(rename = "normal")]
    Normal,
    #[strum(serialize = "large")]
    #[serde(rename = "large")]
    Large,
    #[strum(serialize = "x-large")]
    #[serde(rename = "x-large")]
    XLarge,
    #[strum(serialize = "xx-large")]
    #[serde(rename = "xx-large")]
    XXLarge,
}

impl ThumbnailSize {
    /// Nominal maximum edge length in pixels.
    pub fn max_edge(&self) -> u32 {
        match self {
            ThumbnailSize::Normal => 128,
            ThumbnailSize::Large => 256,
            ThumbnailSize::XLarge => 512,
            ThumbnailSize::XXLarge => 1024,
        }
    }
}

/// Lowercase hex MD5 of a canonical URI. Owned, so it outlives the call
/// that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheDigest(String);

impl CacheDigest {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hashes the canonical URI into the cache file stem.
///
/// MD5 is fixed by the shared cache naming convention; it is not used for
/// anything security related.
pub fn digest(uri: &CanonicalUri) -> CacheDigest {
    CacheDigest(format!("{:x}", md5::compute(uri.as_bytes())))
}

/// Candidate location of a cached thumbnail. The file may or may not exist.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CachePath(PathBuf);

impl CachePath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

impl AsRef<Path> for CachePath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

/// Returns `<cache_root>/normal/<digest>.png`.
pub fn resolve_path(cache_root: &Path, digest: &CacheDigest) -> CachePath {
    resolve_sized_path(cache_root, ThumbnailSize::Normal, digest)
}

/// Returns `<cache_root>/<size>/<digest>.png`.
pub fn resolve_sized_path(cache_root: &Path, size: ThumbnailSize, digest: &CacheDigest) -> CachePath {
    CachePath(
        cache_root
            .join(size.to_string())
            .join(format!("{}.{}", digest, THUMBNAIL_EXTENSION)),
    )
}

/// Full chain from a source path to its cache location.
pub fn cache_path_for(source: &Path, cache_root: &Path, size: ThumbnailSize) -> CachePath {
    let uri = crate::uri::canonicalize(source);
    resolve_sized_path(cache_root, size, &digest(&uri))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uri::{canonicalize, canonicalize_bytes};
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_digest_matches_shared_cache_reference() {
        // Reference pair published with the shared thumbnail cache convention.
        let uri = canonicalize(Path::new("/home/jens/photos/me.png"));
        assert_eq!(digest(&uri).as_str(), "c6ee772d9e49320e97ec29a7eb5b1697");
    }

    #[test]
    fn test_digest_of_escaped_uri() {
        let uri = canonicalize(Path::new("/home/al/My Pic.jpg"));
        assert_eq!(digest(&uri).as_str(), "1b9e0ac3f1b5ca1b3701c3da215bd341");
    }

    #[test]
    fn test_digest_is_fixed_length_lowercase_hex() {
        let inputs: [&[u8]; 4] = [b"", b"/", b"/tmp/a b", b"/\xff\xfe\x00"];
        for raw in inputs {
            let value = digest(&canonicalize_bytes(raw));
            assert_eq!(value.as_str().len(), DIGEST_HEX_LEN);
            assert!(
                value
                    .as_str()
                    .chars()
                    .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)),
                "unexpected digest {}",
                value
            );
        }
        assert_eq!(
            digest(&canonicalize_bytes(b"")).as_str(),
            "8fac1f8e1858745191f2db8612565d3d"
        );
    }

    #[test]
    fn test_digest_outlives_its_input() {
        let value = {
            let uri = canonicalize(Path::new("/tmp/short-lived.png"));
            digest(&uri)
        };
        assert_eq!(value, digest(&canonicalize(Path::new("/tmp/short-lived.png"))));
    }

    #[test]
    fn test_resolve_path_shape() {
        let uri = canonicalize(Path::new("/home/jens/photos/me.png"));
        let path = resolve_path(Path::new("/home/jens/.cache/thumbnails"), &digest(&uri));
        assert_eq!(
            path.as_path(),
            Path::new("/home/jens/.cache/thumbnails/normal/c6ee772d9e49320e97ec29a7eb5b1697.png")
        );
    }

    #[test]
    fn test_resolve_sized_path_uses_size_directory() {
        let value = digest(&canonicalize(Path::new("/a.png")));
        for size in ThumbnailSize::iter() {
            let path = resolve_sized_path(Path::new("/cache"), size, &value);
            let parent = path.as_path().parent().unwrap();
            assert_eq!(parent.file_name().unwrap().to_string_lossy(), size.to_string());
        }
    }

    #[test]
    fn test_cache_path_is_pure_function_of_root_and_source() {
        let root = Path::new("/cache");
        let source = Path::new("/photos/x y.jpg");
        let first = cache_path_for(source, root, ThumbnailSize::Normal);
        let _unrelated = cache_path_for(Path::new("/photos/other.jpg"), root, ThumbnailSize::Large);
        let second = cache_path_for(source, root, ThumbnailSize::Normal);
        assert_eq!(first, second);
    }

    #[test]
    fn test_thumbnail_size_names_round_trip() {
        assert_eq!(ThumbnailSize::XLarge.to_string(), "x-large");
        assert_eq!(ThumbnailSize::from_str("xx-large").unwrap(), ThumbnailSize::XXLarge);
        assert_eq!(ThumbnailSize::default(), ThumbnailSize::Normal);
        assert_eq!(ThumbnailSize::Large.max_edge(), 256);
    }
}
