use log::debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::SessionConfig;
use crate::error::Result;

use super::handle::ArchiveHandle;
use super::registry::HandleRegistry;
use super::scratch::{ScratchDir, copy_path_into};

/// Owning context for everything this crate opens or writes.
///
/// Holds the configuration, the registry of live handles and the scratch
/// directory writer. Dropping the session closes whatever handles are
/// still open, like [`close_all`](Self::close_all); scratch files stay.
pub struct ArchiveSession {
    config: SessionConfig,
    registry: Arc<HandleRegistry>,
    scratch: ScratchDir,
}

impl ArchiveSession {
    pub fn new(config: SessionConfig) -> Self {
        let scratch = ScratchDir::new(config.scratch_dir.clone(), config.naming, config.existing);
        Self {
            config,
            registry: Arc::new(HandleRegistry::default()),
            scratch,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn scratch(&self) -> &ScratchDir {
        &self.scratch
    }

    /// Open a container and capture its catalog.
    pub async fn open(&self, path: impl AsRef<Path>) -> Result<ArchiveHandle> {
        ArchiveHandle::open(path.as_ref(), &self.config, &self.registry).await
    }

    /// Extract `name` from `handle` into a new file in the scratch directory.
    pub async fn extract_to_scratch(&self, handle: &ArchiveHandle, name: &str) -> Result<PathBuf> {
        let bytes = handle.extract_to_buffer(name).await?;
        self.scratch.write(&bytes).await
    }

    /// [`extract_to_scratch`](Self::extract_to_scratch), writing the
    /// NUL-terminated path into `out`.
    ///
    /// Every failure, including a too small `out`, is reported as `false`.
    pub async fn extract_to_scratch_into(
        &self,
        handle: &ArchiveHandle,
        name: &str,
        out: &mut [u8],
    ) -> bool {
        let result = self.extract_to_scratch(handle, name).await;
        report_into(result, out)
    }

    /// Open `path`, pick its media entry, extract it to the scratch
    /// directory and close the container again, whatever the outcome.
    pub async fn find_and_extract_to_scratch<S: AsRef<str> + Sync>(
        &self,
        path: impl AsRef<Path>,
        wanted: Option<&[S]>,
    ) -> Result<PathBuf> {
        let handle = self.open(path).await?;
        let result = async {
            let name = handle.find_media(wanted)?;
            self.extract_to_scratch(&handle, &name).await
        }
        .await;
        handle.close();
        result
    }

    /// [`find_and_extract_to_scratch`](Self::find_and_extract_to_scratch)
    /// with the result written into `out`, as in
    /// [`extract_to_scratch_into`](Self::extract_to_scratch_into).
    pub async fn find_and_extract_to_scratch_into<S: AsRef<str> + Sync>(
        &self,
        path: impl AsRef<Path>,
        wanted: Option<&[S]>,
        out: &mut [u8],
    ) -> bool {
        let result = self.find_and_extract_to_scratch(path, wanted).await;
        report_into(result, out)
    }

    /// Number of handles opened through this session and not yet closed.
    pub fn open_count(&self) -> usize {
        self.registry.len()
    }

    /// Close every handle still open. Safe to call repeatedly.
    pub fn close_all(&self) {
        self.registry.close_all();
    }
}

impl Default for ArchiveSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl Drop for ArchiveSession {
    fn drop(&mut self) {
        self.close_all();
    }
}

fn report_into(result: Result<PathBuf>, out: &mut [u8]) -> bool {
    match result.and_then(|path| copy_path_into(&path, out)) {
        Ok(_) => true,
        Err(e) => {
            debug!("boundary call failed: {}", e);
            false
        }
    }
}
