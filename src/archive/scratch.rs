use log::debug;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::config::{ExistingFilePolicy, ScratchNaming};
use crate::error::{ArchiveError, Result};

use super::buffer::EntryBytes;

/// Prefix of every file written to the scratch directory.
pub const SCRATCH_PREFIX: &str = "temp_";

/// Writes extracted entries as standalone files under one directory.
///
/// Names come from a counter owned by this writer, so two writers (or two
/// runs) only avoid each other when [`ScratchNaming::Unique`] mixes in
/// the per-writer token.
pub struct ScratchDir {
    root: PathBuf,
    naming: ScratchNaming,
    existing: ExistingFilePolicy,
    token: String,
    counter: AtomicU64,
}

impl ScratchDir {
    pub fn new(root: PathBuf, naming: ScratchNaming, existing: ExistingFilePolicy) -> Self {
        let mut token = uuid::Uuid::new_v4().simple().to_string();
        token.truncate(8);
        Self {
            root,
            naming,
            existing,
            token,
            counter: AtomicU64::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Per-writer token used by [`ScratchNaming::Unique`].
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Reserve the next scratch path for an entry named `entry_name`.
    pub fn next_path(&self, entry_name: &str) -> PathBuf {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let base = base_name(entry_name);
        let file_name = match self.naming {
            ScratchNaming::Counter => format!("{SCRATCH_PREFIX}{n}_{base}"),
            ScratchNaming::Unique => format!("{SCRATCH_PREFIX}{n}_{}_{base}", self.token),
        };
        self.root.join(file_name)
    }

    /// Persist `bytes` under a freshly generated name and return its path.
    pub async fn write(&self, bytes: &EntryBytes) -> Result<PathBuf> {
        if base_name(bytes.name()).is_empty() {
            return Err(ArchiveError::EntryNotFound(bytes.name().to_string()));
        }

        // create_dir_all already ignores an existing directory
        fs::create_dir_all(&self.root).await?;

        let path = self.next_path(bytes.name());
        let mut options = fs::OpenOptions::new();
        options.write(true);
        match self.existing {
            ExistingFilePolicy::Overwrite => options.create(true).truncate(true),
            ExistingFilePolicy::Fail => options.create_new(true),
        };

        let mut file = match options.open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(ArchiveError::ScratchExists(path));
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(bytes).await?;
        file.flush().await?;

        let written = file.metadata().await?.len();
        if written != bytes.len() as u64 {
            return Err(ArchiveError::ShortWrite {
                path,
                written,
                expected: bytes.len() as u64,
            });
        }

        debug!("wrote {} bytes of '{}' to {}", written, bytes.name(), path.display());
        Ok(path)
    }
}

/// Last `/`-separated component of an entry name.
pub fn base_name(entry_name: &str) -> &str {
    entry_name.rsplit('/').next().unwrap_or(entry_name)
}

/// Copy `path` plus a NUL terminator into a fixed-size caller buffer.
///
/// Returns the path length without the terminator. Nothing is written
/// when the buffer is too small.
pub fn copy_path_into(path: &Path, out: &mut [u8]) -> Result<usize> {
    let bytes = path.as_os_str().as_encoded_bytes();
    let needed = bytes.len() + 1;
    if needed > out.len() {
        return Err(ArchiveError::PathTooLong {
            path: path.to_path_buf(),
            needed,
            capacity: out.len(),
        });
    }
    out[..bytes.len()].copy_from_slice(bytes);
    out[bytes.len()] = 0;
    Ok(bytes.len())
}
