// src/services/generation_queue.rs

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};

use chrono::{DateTime, Utc};

use crate::thumbnail::{CachePath, ThumbnailSize, cache_path_for};

/// Receives requests to produce a missing thumbnail. Implementations must
/// return promptly; the actual work happens elsewhere.
pub trait GenerationRequester: Send {
    fn request_generation(&self, path: &Path);
}

impl<F> GenerationRequester for F
where
    F: Fn(&Path) + Send,
{
    fn request_generation(&self, path: &Path) {
        self(path)
    }
}

/// A request for a thumbnail worker: render `source_path` into `cache_path`.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailGenerationJob {
    pub source_path: PathBuf,
    pub cache_path: PathBuf,
    pub size: ThumbnailSize,
    pub requested_at: DateTime<Utc>,
}

/// Forwards generation requests as jobs over a channel to whatever worker
/// owns the receiving end.
#[derive(Debug, Clone)]
pub struct GenerationQueue {
    tx: Sender<ThumbnailGenerationJob>,
    cache_root: PathBuf,
    size: ThumbnailSize,
}

impl GenerationQueue {
    pub fn new(
        tx: Sender<ThumbnailGenerationJob>,
        cache_root: impl Into<PathBuf>,
        size: ThumbnailSize,
    ) -> Self {
        Self {
            tx,
            cache_root: cache_root.into(),
            size,
        }
    }

    /// Creates a queue together with the receiver a worker should drain.
    pub fn channel(
        cache_root: impl Into<PathBuf>,
        size: ThumbnailSize,
    ) -> (Self, Receiver<ThumbnailGenerationJob>) {
        let (tx, rx) = mpsc::channel();
        (Self::new(tx, cache_root, size), rx)
    }

    fn job_for(&self, path: &Path) -> ThumbnailGenerationJob {
        let cache_path: CachePath = cache_path_for(path, &self.cache_root, self.size);
        ThumbnailGenerationJob {
            source_path: path.to_path_buf(),
            cache_path: cache_path.into_path_buf(),
            size: self.size,
            requested_at: Utc::now(),
        }
    }
}

impl GenerationRequester for GenerationQueue {
    fn request_generation(&self, path: &Path) {
        let job = self.job_for(path);
        log::debug!(
            "GenerationQueue: Queueing {} -> {}",
            job.source_path.display(),
            job.cache_path.display()
        );
        // Unbounded channel: send never blocks. A gone worker only means the
        // thumbnail stays a placeholder.
        if let Err(e) = self.tx.send(job) {
            log::error!(
                "GenerationQueue: Failed to queue thumbnail job for {}: worker is gone ({})",
                path.display(),
                e
            );
        }
    }
}
