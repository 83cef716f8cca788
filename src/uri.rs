// src/uri.rs

use std::fmt;
use std::path::Path;

/// Scheme prefix shared by every canonical URI.
pub const FILE_URI_PREFIX: &str = "file://";

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// A `file://` URI whose path part is percent-encoded byte by byte.
///
/// Only `[A-Za-z0-9._/-]` pass through unchanged, every other byte becomes a
/// lowercase `%xx` escape. The value is always plain ASCII.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalUri(String);

impl CanonicalUri {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// The encoded path part, without the scheme prefix.
    pub fn encoded_path(&self) -> &str {
        &self.0[FILE_URI_PREFIX.len()..]
    }
}

impl fmt::Display for CanonicalUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalUri {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'-' | b'_' | b'/')
}

/// Builds the canonical URI for a filesystem path.
///
/// The path's own encoded bytes are used, so non-UTF-8 file names hash the
/// same way other tools sharing the cache see them.
pub fn canonicalize(path: &Path) -> CanonicalUri {
    canonicalize_bytes(path.as_os_str().as_encoded_bytes())
}

/// Percent-encodes `raw` and prefixes it with `file://`. Total: an empty
/// input yields the bare prefix.
pub fn canonicalize_bytes(raw: &[u8]) -> CanonicalUri {
    // Worst case every byte expands to a three byte escape.
    let mut encoded = String::with_capacity(FILE_URI_PREFIX.len() + raw.len() * 3);
    encoded.push_str(FILE_URI_PREFIX);

    for &byte in raw {
        if is_unreserved(byte) {
            encoded.push(byte as char);
        } else {
            encoded.push('%');
            encoded.push(HEX_DIGITS[(byte >> 4) as usize] as char);
            encoded.push(HEX_DIGITS[(byte & 0x0f) as usize] as char);
        }
    }

    CanonicalUri(encoded)
}
