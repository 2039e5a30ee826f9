//! Container handles, catalogs and ROM extraction.
//!
//! An [`ArchiveSession`] opens [`ArchiveHandle`]s. Each handle captures its
//! [`Entry`] catalog once, can locate the media entry a loader wants, and
//! extracts entries either into memory ([`EntryBytes`]) or into the
//! session's scratch directory as ordinary files.

mod buffer;
mod catalog;
mod handle;
mod media;
mod registry;
mod scratch;
mod session;

pub use buffer::EntryBytes;
pub use catalog::{Entry, list_entries};
pub use handle::ArchiveHandle;
pub use media::{
    CONTAINER_EXTENSION, DEFAULT_MEDIA_EXTENSIONS, extension, find_media, is_container, is_media,
    is_wanted_media,
};
pub use registry::{HandleId, HandleRegistry};
pub use scratch::{SCRATCH_PREFIX, ScratchDir, base_name, copy_path_into};
pub use session::ArchiveSession;
