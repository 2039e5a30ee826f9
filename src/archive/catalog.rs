use log::{trace, warn};

use crate::config::UnreadableEntryPolicy;
use crate::error::Result;
use crate::io::ReadAt;
use crate::zip::ZipSession;

/// One record of a container, as captured when it was opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    name: String,
    uncompressed_size: u64,
    compressed_size: u64,
}

impl Entry {
    pub fn new(name: impl Into<String>, uncompressed_size: u64, compressed_size: u64) -> Self {
        Self {
            name: name.into(),
            uncompressed_size,
            compressed_size,
        }
    }

    /// Slash-separated path as stored in the container.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uncompressed_size(&self) -> u64 {
        self.uncompressed_size
    }

    pub fn compressed_size(&self) -> u64 {
        self.compressed_size
    }

    /// Directory markers are recognised by their trailing `/` only.
    pub fn is_directory(&self) -> bool {
        self.name.ends_with('/')
    }
}

/// Walk every record of `session` and capture it as an [`Entry`].
///
/// An empty or unreadable directory gives an empty catalog. Records whose
/// metadata cannot be parsed are skipped or abort the walk depending on
/// `policy`.
pub fn list_entries<R: ReadAt>(
    session: &ZipSession<R>,
    policy: UnreadableEntryPolicy,
) -> Result<Vec<Entry>> {
    let mut cursor = match session.first() {
        Ok(cursor) => cursor,
        Err(e) => {
            warn!("archive has no listable entries: {}", e);
            return Ok(Vec::new());
        }
    };

    let mut entries = Vec::new();
    loop {
        match cursor.entry() {
            Ok(record) => {
                trace!("catalog: {}", record.file_name);
                entries.push(Entry::new(
                    record.file_name,
                    record.uncompressed_size,
                    record.compressed_size,
                ));
            }
            Err(e) => match policy {
                UnreadableEntryPolicy::Skip => {
                    warn!("skipping record {}: {}", cursor.index(), e);
                }
                UnreadableEntryPolicy::Abort => return Err(e),
            },
        }

        if !cursor.advance() {
            break;
        }
    }

    Ok(entries)
}
