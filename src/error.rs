use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Everything that can go wrong while indexing or extracting a container.
///
/// The `_into` boundary functions on [`ArchiveSession`](crate::ArchiveSession)
/// collapse all of these into a plain `false`.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("not a ZIP container: '{0}'")]
    NotAContainer(PathBuf),

    #[error("invalid ZIP archive: {0}")]
    InvalidArchive(&'static str),

    #[error("archive handle is closed")]
    HandleClosed,

    #[error("entry name is empty")]
    EmptyName,

    #[error("entry not found: '{0}'")]
    EntryNotFound(String),

    #[error("metadata for entry '{name}' is unreadable: {reason}")]
    UnreadableEntry { name: String, reason: &'static str },

    #[error("entry '{name}' is not supported: {reason}")]
    Unsupported { name: String, reason: String },

    #[error("entry '{name}' declares {size} bytes, limit is {limit}")]
    TooLarge { name: String, size: u64, limit: u64 },

    #[error("entry '{name}' declares {expected} bytes but {actual} were read")]
    SizeMismatch {
        name: String,
        expected: u64,
        actual: u64,
    },

    #[error("entry '{name}' failed CRC check: expected {expected:08x}, got {actual:08x}")]
    CrcMismatch {
        name: String,
        expected: u32,
        actual: u32,
    },

    #[error("short write to '{path}': {written} of {expected} bytes")]
    ShortWrite {
        path: PathBuf,
        written: u64,
        expected: u64,
    },

    #[error("scratch file already exists: '{0}'")]
    ScratchExists(PathBuf),

    #[error("no media entry found in '{0}'")]
    NoMedia(PathBuf),

    #[error("path '{path}' needs {needed} bytes, buffer holds {capacity}")]
    PathTooLong {
        path: PathBuf,
        needed: usize,
        capacity: usize,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}
