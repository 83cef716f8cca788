// src/services/catalog_service.rs

use std::fmt;
use std::path::{Path, PathBuf};

use crate::services::generation_queue::GenerationRequester;
use crate::services::thumbnail_service::{ResolutionStatus, ThumbnailImage, ThumbnailResolver};

/// Identifies one entry of an [`ImageCatalog`]. Handles issued before a
/// `reset` no longer resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryHandle {
    index: usize,
    epoch: u64,
}

impl EntryHandle {
    /// Position of the entry in display order.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// One source file and the thumbnail resolved for it. Never modified after
/// it is appended.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    source_filename: PathBuf,
    thumbnail: ThumbnailImage,
    status: ResolutionStatus,
}

impl CatalogEntry {
    pub fn source_filename(&self) -> &Path {
        &self.source_filename
    }

    pub fn thumbnail(&self) -> &ThumbnailImage {
        &self.thumbnail
    }

    pub fn status(&self) -> ResolutionStatus {
        self.status
    }

    pub fn is_placeholder(&self) -> bool {
        self.status == ResolutionStatus::Miss
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    UnknownHandle(EntryHandle),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::UnknownHandle(handle) => {
                write!(f, "No catalog entry for handle at index {}", handle.index)
            }
        }
    }
}

impl std::error::Error for CatalogError {}

type SelectionListener = Box<dyn FnMut(&Path) + Send>;

/// Ordered, append-only list of resolved thumbnails with a single selection.
///
/// Every append selects the new entry. The registered listener hears about
/// each change of selection, synchronously, on the calling thread.
pub struct ImageCatalog {
    resolver: ThumbnailResolver,
    generation: Box<dyn GenerationRequester>,
    entries: Vec<CatalogEntry>,
    selected: Option<usize>,
    epoch: u64,
    on_selection_changed: Option<SelectionListener>,
}

impl ImageCatalog {
    pub fn new(resolver: ThumbnailResolver, generation: Box<dyn GenerationRequester>) -> Self {
        Self {
            resolver,
            generation,
            entries: Vec::new(),
            selected: None,
            epoch: 0,
            on_selection_changed: None,
        }
    }

    /// Registers the one selection subscriber, replacing any previous one.
    pub fn set_selection_listener<F>(&mut self, listener: F)
    where
        F: FnMut(&Path) + Send + 'static,
    {
        self.on_selection_changed = Some(Box::new(listener));
    }

    pub fn clear_selection_listener(&mut self) {
        self.on_selection_changed = None;
    }

    /// Resolves the thumbnail for `filename`, appends it and selects it.
    /// A cache miss requests generation exactly once.
    pub fn add_image(&mut self, filename: impl AsRef<Path>) -> EntryHandle {
        let filename = filename.as_ref();
        let (thumbnail, status) = self.resolver.resolve(filename);
        let handle = self.append(filename.to_path_buf(), thumbnail, status);
        self.change_selection(handle.index);
        handle
    }

    /// Appends a batch in order. Cache files are probed in parallel, then
    /// entries go in one by one as `add_image` would. Only the last entry
    /// ends up selected, announced with a single event.
    pub fn add_images(&mut self, filenames: &[PathBuf]) -> Vec<EntryHandle> {
        if filenames.is_empty() {
            return Vec::new();
        }

        let resolved = self.resolver.resolve_many(filenames);
        let handles: Vec<EntryHandle> = filenames
            .iter()
            .zip(resolved)
            .map(|(filename, (thumbnail, status))| self.append(filename.clone(), thumbnail, status))
            .collect();

        if let Some(last) = handles.last() {
            self.change_selection(last.index);
        }
        handles
    }

    /// Selects the entry behind `handle`. Selecting the current entry again
    /// does nothing and emits nothing.
    pub fn select(&mut self, handle: EntryHandle) -> Result<(), CatalogError> {
        if !self.is_live(handle) {
            log::warn!(
                "ImageCatalog: Ignoring selection of stale or unknown handle (index {})",
                handle.index
            );
            return Err(CatalogError::UnknownHandle(handle));
        }
        self.change_selection(handle.index);
        Ok(())
    }

    /// Drops every entry and the selection. Outstanding handles become stale.
    pub fn reset(&mut self) {
        log::debug!("ImageCatalog: Reset, dropping {} entries", self.entries.len());
        self.entries.clear();
        self.selected = None;
        self.epoch += 1;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in display order.
    pub fn entries(&self) -> impl Iterator<Item = (EntryHandle, &CatalogEntry)> {
        let epoch = self.epoch;
        self.entries
            .iter()
            .enumerate()
            .map(move |(index, entry)| (EntryHandle { index, epoch }, entry))
    }

    pub fn get(&self, handle: EntryHandle) -> Option<&CatalogEntry> {
        if self.is_live(handle) {
            self.entries.get(handle.index)
        } else {
            None
        }
    }

    pub fn selected(&self) -> Option<(EntryHandle, &CatalogEntry)> {
        let index = self.selected?;
        let entry = self.entries.get(index)?;
        Some((
            EntryHandle {
                index,
                epoch: self.epoch,
            },
            entry,
        ))
    }

    /// Source files still showing the placeholder, in display order.
    pub fn placeholder_entries(&self) -> impl Iterator<Item = &Path> {
        self.entries
            .iter()
            .filter(|entry| entry.is_placeholder())
            .map(|entry| entry.source_filename())
    }

    pub fn resolver(&self) -> &ThumbnailResolver {
        &self.resolver
    }

    fn is_live(&self, handle: EntryHandle) -> bool {
        handle.epoch == self.epoch && handle.index < self.entries.len()
    }

    fn append(
        &mut self,
        source_filename: PathBuf,
        thumbnail: ThumbnailImage,
        status: ResolutionStatus,
    ) -> EntryHandle {
        if status == ResolutionStatus::Miss {
            log::debug!(
                "ImageCatalog: Requesting thumbnail generation for {}",
                source_filename.display()
            );
            self.generation.request_generation(&source_filename);
        }

        self.entries.push(CatalogEntry {
            source_filename,
            thumbnail,
            status,
        });
        EntryHandle {
            index: self.entries.len() - 1,
            epoch: self.epoch,
        }
    }

    fn change_selection(&mut self, index: usize) {
        if self.selected == Some(index) {
            return;
        }
        self.selected = Some(index);

        let filename = &self.entries[index].source_filename;
        log::debug!("ImageCatalog: Selected {} (index {})", filename.display(), index);
        if let Some(listener) = self.on_selection_changed.as_mut() {
            listener(filename);
        }
    }
}

impl fmt::Debug for ImageCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageCatalog")
            .field("resolver", &self.resolver)
            .field("entries", &self.entries)
            .field("selected", &self.selected)
            .field("epoch", &self.epoch)
            .field("has_selection_listener", &self.on_selection_changed.is_some())
            .finish()
    }
}
