// Shared test utilities: temp cache roots, dummy images and a recording
// generation hook.

use image::{ImageBuffer, ImageFormat, Rgba};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use crate::services::generation_queue::GenerationRequester;
use crate::thumbnail::{ThumbnailSize, cache_path_for};

/// Records every generation request it receives. Clones share the record.
#[derive(Debug, Clone, Default)]
pub struct RecordingGenerationRequester {
    requested: Arc<Mutex<Vec<PathBuf>>>,
}

impl RecordingGenerationRequester {
    pub fn requested(&self) -> Vec<PathBuf> {
        self.requested.lock().unwrap().clone()
    }
}

impl GenerationRequester for RecordingGenerationRequester {
    fn request_generation(&self, path: &Path) {
        self.requested.lock().unwrap().push(path.to_path_buf());
    }
}

// Test environment for resolver and catalog tests
#[derive(Debug)]
pub struct ThumbnailTestEnvironment {
    // Held so the directory lives as long as the environment.
    pub temp_dir: TempDir,
    pub source_dir: PathBuf,
    pub cache_root: PathBuf,
}

impl ThumbnailTestEnvironment {
    pub fn source_path(&self, filename: &str) -> PathBuf {
        self.source_dir.join(filename)
    }
}

pub fn setup_thumbnail_test_env() -> ThumbnailTestEnvironment {
    let temp_dir = TempDir::new().expect("Failed to create temp_dir for thumbnail test");
    let source_dir = temp_dir.path().join("source_files");
    fs::create_dir_all(&source_dir).expect("Failed to create source_dir for thumbnail test env");
    // The cache root starts empty; size directories appear on first write.
    let cache_root = temp_dir.path().join("thumbnails");
    fs::create_dir_all(&cache_root).expect("Failed to create cache_root for thumbnail test env");
    ThumbnailTestEnvironment {
        temp_dir,
        source_dir,
        cache_root,
    }
}

/// Writes a checkerboard PNG of the given size to `dir/filename`.
pub fn create_dummy_image_file(dir: &Path, filename: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(filename);
    save_checkerboard(&path, width, height);
    path
}

/// Places a thumbnail for `source` exactly where the shared cache layout
/// expects it and returns that path.
pub fn write_cached_thumbnail(
    cache_root: &Path,
    size: ThumbnailSize,
    source: &Path,
    width: u32,
    height: u32,
) -> PathBuf {
    let cache_path = cache_path_for(source, cache_root, size).into_path_buf();
    if let Some(parent) = cache_path.parent() {
        fs::create_dir_all(parent).expect("Failed to create thumbnail size directory");
    }
    save_checkerboard(&cache_path, width, height);
    cache_path
}

fn save_checkerboard(path: &Path, width: u32, height: u32) {
    let img = ImageBuffer::<Rgba<u8>, Vec<u8>>::from_fn(width, height, |x, y| {
        if (x + y) % 2 == 0 {
            Rgba([0, 0, 0, 255])
        } else {
            Rgba([255, 255, 255, 255])
        }
    });
    img.save_with_format(path, ImageFormat::Png)
        .expect("Failed to save dummy image in tests_common");
}
