use log::debug;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::config::SessionConfig;
use crate::error::{ArchiveError, Result};
use crate::io::LocalFileReader;
use crate::zip::ZipSession;

use super::buffer::EntryBytes;
use super::catalog::{Entry, list_entries};
use super::media::{find_media, is_container};
use super::registry::{HandleId, HandleRegistry};

/// What an open handle holds; gone once the handle is closed.
pub(crate) struct OpenArchive {
    session: Arc<ZipSession<LocalFileReader>>,
    entries: Arc<[Entry]>,
}

/// Shared between a handle and its weak registry entry.
pub(crate) type HandleSlot = Mutex<Option<OpenArchive>>;

/// One open container and the catalog captured when it was opened.
///
/// The catalog is never refreshed. Closing (explicitly, by dropping the
/// handle, or through the session's `close_all`) releases the container;
/// every later operation fails with [`ArchiveError::HandleClosed`].
pub struct ArchiveHandle {
    id: HandleId,
    source_path: PathBuf,
    slot: Arc<HandleSlot>,
    registry: Weak<HandleRegistry>,
    max_entry_size: u64,
}

impl ArchiveHandle {
    pub(crate) async fn open(
        path: &Path,
        config: &SessionConfig,
        registry: &Arc<HandleRegistry>,
    ) -> Result<Self> {
        if !is_container(&path.to_string_lossy()) {
            return Err(ArchiveError::NotAContainer(path.to_path_buf()));
        }

        let reader = Arc::new(LocalFileReader::new(path)?);
        let session = ZipSession::open(reader).await?;
        let entries = list_entries(&session, config.unreadable)?;

        let slot = Arc::new(Mutex::new(Some(OpenArchive {
            session: Arc::new(session),
            entries: entries.into(),
        })));
        let id = registry.register(&slot);
        debug!("opened {} as handle {}", path.display(), id);

        Ok(Self {
            id,
            source_path: path.to_path_buf(),
            slot,
            registry: Arc::downgrade(registry),
            max_entry_size: config.max_entry_size,
        })
    }

    fn slot(&self) -> MutexGuard<'_, Option<OpenArchive>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn session(&self) -> Result<Arc<ZipSession<LocalFileReader>>> {
        self.slot()
            .as_ref()
            .map(|open| open.session.clone())
            .ok_or(ArchiveError::HandleClosed)
    }

    pub fn id(&self) -> HandleId {
        self.id
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn is_open(&self) -> bool {
        self.slot().is_some()
    }

    /// The catalog, in the container's physical order.
    pub fn entries(&self) -> Result<Arc<[Entry]>> {
        self.slot()
            .as_ref()
            .map(|open| open.entries.clone())
            .ok_or(ArchiveError::HandleClosed)
    }

    /// Is there a non-directory entry named exactly `name`?
    pub fn exists(&self, name: &str) -> bool {
        self.entries()
            .map(|entries| entries.iter().any(|e| e.name() == name && !e.is_directory()))
            .unwrap_or(false)
    }

    /// Name of the first catalog entry with a wanted extension.
    ///
    /// `None` means the default media list.
    pub fn find_media<S: AsRef<str>>(&self, wanted: Option<&[S]>) -> Result<String> {
        let entries = self.entries()?;
        find_media(&entries, wanted)
            .map(|entry| entry.name().to_string())
            .ok_or_else(|| ArchiveError::NoMedia(self.source_path.clone()))
    }

    /// Read the whole of entry `name` into memory.
    ///
    /// The lookup goes through the container, not the catalog, so entries
    /// the catalog skipped can still be read if their metadata parses.
    pub async fn extract_to_buffer(&self, name: &str) -> Result<EntryBytes> {
        if name.is_empty() {
            return Err(ArchiveError::EmptyName);
        }
        let session = self.session()?;

        let entry = session.locate(name)?;
        if entry.is_directory() {
            return Err(ArchiveError::EntryNotFound(name.to_string()));
        }
        if entry.uncompressed_size > self.max_entry_size {
            return Err(ArchiveError::TooLarge {
                name: name.to_string(),
                size: entry.uncompressed_size,
                limit: self.max_entry_size,
            });
        }

        let reader = session.open_entry(&entry).await?;
        let bytes =
            EntryBytes::read_exact_from(name, entry.uncompressed_size, entry.crc32, reader)?;
        debug!("extracted '{}' ({} bytes) from handle {}", name, bytes.len(), self.id);
        Ok(bytes)
    }

    /// Release the container and drop out of the registry.
    ///
    /// Closing an already closed handle does nothing.
    pub fn close(&self) {
        if self.slot().take().is_none() {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.unregister(self.id);
        }
        debug!("closed handle {}", self.id);
    }
}

impl Drop for ArchiveHandle {
    fn drop(&mut self) {
        self.close();
    }
}
