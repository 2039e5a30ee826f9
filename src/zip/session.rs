use flate2::read::DeflateDecoder;
use log::{debug, trace};
use std::io::{self, Cursor, Read};
use std::sync::Arc;

use crate::error::{ArchiveError, Result};
use crate::io::ReadAt;

use super::parser::{CentralDirectory, RecordCursor, ZipParser};
use super::structures::{CompressionMethod, ZipFileEntry};

/// An open ZIP container: the parser plus its in-memory Central Directory.
///
/// This is the codec capability the archive layer builds on: a first/next
/// record cursor, exact-name lookup, and a reader for one entry's
/// decompressed bytes.
pub struct ZipSession<R: ReadAt> {
    parser: ZipParser<R>,
    directory: CentralDirectory,
}

impl<R: ReadAt> ZipSession<R> {
    /// Open a session by locating and loading the Central Directory.
    pub async fn open(reader: Arc<R>) -> Result<Self> {
        let parser = ZipParser::new(reader);
        let directory = parser.read_central_directory().await?;
        debug!(
            "central directory loaded, {} records declared",
            directory.declared_entries()
        );
        Ok(Self { parser, directory })
    }

    /// Position a cursor at the first record.
    pub fn first(&self) -> Result<RecordCursor<'_>> {
        self.directory.first()
    }

    /// Find the first record whose stored name is exactly `name`.
    ///
    /// Walks the Central Directory itself, so records the catalog skipped
    /// can still be found; their metadata must parse for this to succeed.
    pub fn locate(&self, name: &str) -> Result<ZipFileEntry> {
        let not_found = || ArchiveError::EntryNotFound(name.to_string());
        let mut cursor = self.directory.first().map_err(|_| not_found())?;
        loop {
            if cursor.name() == name {
                trace!("located '{}' at record {}", name, cursor.index());
                return cursor.entry();
            }
            if !cursor.advance() {
                return Err(not_found());
            }
        }
    }

    /// Open a reader over the decompressed bytes of `entry`.
    ///
    /// The reader yields whatever the stored data decodes to; checking that
    /// against the declared size is up to the caller.
    pub async fn open_entry(&self, entry: &ZipFileEntry) -> Result<EntryReader> {
        if entry.is_encrypted() {
            return Err(ArchiveError::Unsupported {
                name: entry.file_name.clone(),
                reason: "encrypted entries are not supported".to_string(),
            });
        }
        if let CompressionMethod::Unknown(method) = entry.compression_method {
            return Err(ArchiveError::Unsupported {
                name: entry.file_name.clone(),
                reason: format!("compression method {method}"),
            });
        }

        let data_offset = self.parser.get_data_offset(entry).await?;

        // Never allocate past the end of the file, whatever the header claims.
        let available = self.parser.reader().size().saturating_sub(data_offset);
        let mut raw = vec![0u8; entry.compressed_size.min(available) as usize];
        let read = self.parser.reader().read_full_at(data_offset, &mut raw).await?;
        raw.truncate(read);

        Ok(match entry.compression_method {
            CompressionMethod::Deflate => {
                EntryReader::Deflate(DeflateDecoder::new(Cursor::new(raw)))
            }
            _ => EntryReader::Stored(Cursor::new(raw)),
        })
    }
}

/// Decompressing reader over one entry's data.
pub enum EntryReader {
    Stored(Cursor<Vec<u8>>),
    Deflate(DeflateDecoder<Cursor<Vec<u8>>>),
}

impl Read for EntryReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            EntryReader::Stored(inner) => inner.read(buf),
            EntryReader::Deflate(inner) => inner.read(buf),
        }
    }
}
