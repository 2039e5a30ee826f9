use std::path::PathBuf;

/// Entries larger than this are refused before any allocation.
pub const DEFAULT_MAX_ENTRY_SIZE: u64 = 256 * 1024 * 1024;

/// Directory name used under the system temp dir when no scratch
/// directory is configured.
pub const DEFAULT_SCRATCH_DIR_NAME: &str = "romzip";

/// How scratch file names are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScratchNaming {
    /// `temp_<counter>_<base>`, the counter restarting with every session.
    Counter,
    /// `temp_<counter>_<token>_<base>` with a random per-session token.
    #[default]
    Unique,
}

/// What to do when the generated scratch path already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExistingFilePolicy {
    #[default]
    Overwrite,
    Fail,
}

/// What the catalog does with a record whose metadata cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnreadableEntryPolicy {
    /// Leave the record out and keep listing.
    #[default]
    Skip,
    /// Fail the whole open.
    Abort,
}

/// Settings shared by every handle opened through one session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub scratch_dir: PathBuf,
    pub naming: ScratchNaming,
    pub existing: ExistingFilePolicy,
    pub unreadable: UnreadableEntryPolicy,
    pub max_entry_size: u64,
}

impl SessionConfig {
    pub fn with_scratch_dir(scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
            ..Self::default()
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            scratch_dir: std::env::temp_dir().join(DEFAULT_SCRATCH_DIR_NAME),
            naming: ScratchNaming::default(),
            existing: ExistingFilePolicy::default(),
            unreadable: UnreadableEntryPolicy::default(),
            max_entry_size: DEFAULT_MAX_ENTRY_SIZE,
        }
    }
}
