use std::path::{self, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc::Receiver;

use log::LevelFilter;
use thumbpane::{
    GenerationQueue, ImageCatalog, PersistenceService, ResolutionStatus, ThumbnailGenerationJob,
    ThumbnailResolver,
};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .filter_module("thumbpane", LevelFilter::Debug)
        .init();

    let filenames: Vec<PathBuf> = std::env::args_os()
        .skip(1)
        .map(PathBuf::from)
        .map(|arg| path::absolute(&arg).unwrap_or(arg))
        .collect();
    if filenames.is_empty() {
        eprintln!("usage: thumbpane FILE...");
        return ExitCode::FAILURE;
    }

    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("thumbpane");
    let config = match PersistenceService::new(config_dir) {
        Ok(service) => service.load_config(),
        Err(e) => {
            log::warn!("Could not open config directory: {}. Using defaults.", e);
            Default::default()
        }
    };

    let resolver = match ThumbnailResolver::new(&config) {
        Ok(resolver) => resolver,
        Err(e) => {
            log::error!("Cannot start without a placeholder image: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let (queue, jobs) = GenerationQueue::channel(&config.cache_root, config.thumbnail_size);
    let worker = std::thread::Builder::new()
        .name("thumbnail-jobs".into())
        .spawn(move || drain_generation_jobs(jobs));
    let worker = match worker {
        Ok(handle) => Some(handle),
        Err(e) => {
            log::error!("Failed to start generation job thread: {}", e);
            None
        }
    };

    let mut catalog = ImageCatalog::new(resolver, Box::new(queue));
    catalog.set_selection_listener(|filename| {
        log::info!("Selection changed: {}", filename.display());
    });

    catalog.add_images(&filenames);

    for (handle, entry) in catalog.entries() {
        let status = match entry.status() {
            ResolutionStatus::Hit => "HIT ",
            ResolutionStatus::Miss => "MISS",
        };
        let (width, height) = entry.thumbnail().dimensions();
        println!(
            "{:>3} {} {:>4}x{:<4} {}",
            handle.index(),
            status,
            width,
            height,
            entry.source_filename().display()
        );
    }

    // Dropping the catalog drops the queue's sender, which ends the worker loop.
    drop(catalog);
    if let Some(worker) = worker {
        if worker.join().is_err() {
            log::error!("Generation job thread panicked");
        }
    }
    ExitCode::SUCCESS
}

// Thumbnail rendering lives outside this tool; jobs are only reported.
fn drain_generation_jobs(jobs: Receiver<ThumbnailGenerationJob>) {
    let mut count = 0usize;
    for job in jobs {
        count += 1;
        log::info!(
            "Thumbnail wanted for {} ({} at {}), requested {}",
            job.source_path.display(),
            job.size,
            job.cache_path.display(),
            job.requested_at.format("%H:%M:%S%.3f")
        );
    }
    log::debug!("Generation job thread finished after {} jobs", count);
}
