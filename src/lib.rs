//! # romzip
//!
//! ZIP indexing and selective extraction for emulator front ends.
//!
//! Loaders usually want a plain file path to a disk, tape or cartridge
//! image. This crate opens a ZIP container, captures its catalog, picks the
//! entry whose extension a loader understands and materializes it either in
//! memory or as a standalone file in a scratch directory.
//!
//! ## Features
//!
//! - Catalog of every entry, in the container's physical order
//! - ROM selection from a caller-supplied or default extension list
//! - Exact-size, CRC-checked extraction; a truncated entry never yields bytes
//! - Scratch files with collision-resistant names
//! - ZIP64, STORED and DEFLATE support
//!
//! ## Example
//!
//! ```no_run
//! use romzip::{ArchiveSession, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let session = ArchiveSession::new(SessionConfig::with_scratch_dir("/tmp/roms"));
//!
//!     let handle = session.open("games/last_ninja.zip").await?;
//!     let name = handle.find_media::<&str>(None)?;
//!     let path = session.extract_to_scratch(&handle, &name).await?;
//!     handle.close();
//!
//!     println!("{} -> {}", name, path.display());
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod cli;
pub mod config;
pub mod error;
pub mod io;
pub mod zip;

pub use archive::{
    ArchiveHandle, ArchiveSession, DEFAULT_MEDIA_EXTENSIONS, Entry, EntryBytes, HandleId,
    is_container, is_media, is_wanted_media,
};
pub use cli::Cli;
pub use config::{ExistingFilePolicy, ScratchNaming, SessionConfig, UnreadableEntryPolicy};
pub use error::{ArchiveError, Result};
pub use io::{LocalFileReader, ReadAt};
