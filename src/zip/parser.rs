//! Low-level ZIP archive parser.
//!
//! This module handles the binary parsing of ZIP file structures,
//! reading from any source that implements the [`ReadAt`] trait.
//!
//! ## Parsing Strategy
//!
//! ZIP files are designed to be read from the end:
//! 1. Find the End of Central Directory (EOCD) at the file's end
//! 2. If ZIP64, read the ZIP64 EOCD for large file support
//! 3. Read the Central Directory in one go and keep it in memory
//! 4. Walk its records with a [`RecordCursor`]; metadata is parsed per
//!    record, so one damaged record does not hide the others

use byteorder::{LittleEndian, ReadBytesExt};
use log::trace;
use std::borrow::Cow;
use std::io::Cursor;
use std::sync::Arc;

use crate::error::{ArchiveError, Result};
use crate::io::ReadAt;

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: u64 = 65535;

const SENTINEL_32: u64 = 0xFFFFFFFF;

/// Low-level ZIP file parser.
///
/// Generic over the reader type so tests can feed it anything that
/// implements [`ReadAt`].
pub struct ZipParser<R: ReadAt> {
    /// The underlying data source
    reader: Arc<R>,
    /// Total size of the archive in bytes
    size: u64,
}

impl<R: ReadAt> ZipParser<R> {
    pub fn new(reader: Arc<R>) -> Self {
        let size = reader.size();
        Self { reader, size }
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// Handles both the simple case (no comment) and archives with
    /// comments by searching backwards for the signature.
    ///
    /// Returns the record together with its offset in the file.
    pub async fn find_eocd(&self) -> Result<(EndOfCentralDirectory, u64)> {
        // Common case first: no archive comment.
        if self.size >= EndOfCentralDirectory::SIZE as u64 {
            let offset = self.size - EndOfCentralDirectory::SIZE as u64;
            let mut buf = vec![0u8; EndOfCentralDirectory::SIZE];
            self.reader.read_full_at(offset, &mut buf).await?;

            if &buf[0..4] == EndOfCentralDirectory::SIGNATURE && &buf[20..22] == b"\x00\x00" {
                let eocd = EndOfCentralDirectory::from_bytes(&buf)?;
                return Ok((eocd, offset));
            }
        }

        // The EOCD sits earlier when the archive carries a comment.
        let search_size = (MAX_COMMENT_SIZE + EndOfCentralDirectory::SIZE as u64).min(self.size);
        let search_start = self.size - search_size;

        let mut buf = vec![0u8; search_size as usize];
        let read = self.reader.read_full_at(search_start, &mut buf).await?;
        buf.truncate(read);

        for i in (0..buf.len().saturating_sub(EndOfCentralDirectory::SIZE)).rev() {
            if &buf[i..i + 4] == EndOfCentralDirectory::SIGNATURE {
                // The comment length must account for every trailing byte.
                let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;

                if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
                    let eocd = EndOfCentralDirectory::from_bytes(
                        &buf[i..i + EndOfCentralDirectory::SIZE],
                    )?;
                    return Ok((eocd, search_start + i as u64));
                }
            }
        }

        Err(ArchiveError::InvalidArchive("end of central directory not found"))
    }

    /// Read the ZIP64 End of Central Directory record.
    ///
    /// Called when the regular EOCD carries 0xFFFF / 0xFFFFFFFF sentinels.
    pub async fn read_zip64_eocd(&self, eocd_offset: u64) -> Result<Zip64EOCD> {
        // The locator sits immediately before the regular EOCD
        let locator_offset = eocd_offset
            .checked_sub(Zip64EOCDLocator::SIZE as u64)
            .ok_or(ArchiveError::InvalidArchive("missing ZIP64 locator"))?;
        let mut locator_buf = vec![0u8; Zip64EOCDLocator::SIZE];
        self.reader
            .read_full_at(locator_offset, &mut locator_buf)
            .await?;

        let locator = Zip64EOCDLocator::from_bytes(&locator_buf)?;

        let mut eocd64_buf = vec![0u8; Zip64EOCD::MIN_SIZE];
        let read = self
            .reader
            .read_full_at(locator.eocd64_offset, &mut eocd64_buf)
            .await?;

        Zip64EOCD::from_bytes(&eocd64_buf[..read])
    }

    /// Load the whole Central Directory into memory.
    ///
    /// Fails when the end records are missing or point outside the file;
    /// individual records are only validated later, by the cursor.
    pub async fn read_central_directory(&self) -> Result<CentralDirectory> {
        let (eocd, eocd_offset) = self.find_eocd().await?;

        let (cd_offset, cd_size, total_entries) = if eocd.is_zip64() {
            let eocd64 = self.read_zip64_eocd(eocd_offset).await?;
            if eocd64.disk_number != eocd64.disk_with_cd {
                return Err(ArchiveError::InvalidArchive("multi-disk archives are not supported"));
            }
            (eocd64.cd_offset, eocd64.cd_size, eocd64.total_entries)
        } else {
            if eocd.is_multi_disk() {
                return Err(ArchiveError::InvalidArchive("multi-disk archives are not supported"));
            }
            (
                eocd.cd_offset as u64,
                eocd.cd_size as u64,
                eocd.total_entries as u64,
            )
        };

        if cd_offset
            .checked_add(cd_size)
            .is_none_or(|end| end > eocd_offset)
        {
            return Err(ArchiveError::InvalidArchive(
                "central directory lies outside the archive",
            ));
        }

        let mut data = vec![0u8; cd_size as usize];
        let read = self.reader.read_full_at(cd_offset, &mut data).await?;
        data.truncate(read);

        Ok(CentralDirectory {
            data,
            total_entries,
        })
    }

    /// Get the offset where an entry's compressed data begins.
    ///
    /// The Local File Header has its own name and extra field lengths,
    /// which may differ from the Central Directory record.
    pub async fn get_data_offset(&self, entry: &ZipFileEntry) -> Result<u64> {
        let mut lfh_buf = vec![0u8; LFH_SIZE];
        let read = self.reader.read_full_at(entry.lfh_offset, &mut lfh_buf).await?;

        if read < LFH_SIZE || &lfh_buf[0..4] != LFH_SIGNATURE {
            return Err(ArchiveError::InvalidArchive("bad local file header"));
        }

        let mut cursor = Cursor::new(&lfh_buf);
        cursor.set_position(26); // Offset to filename length field

        let file_name_length = cursor.read_u16::<LittleEndian>()? as u64;
        let extra_field_length = cursor.read_u16::<LittleEndian>()? as u64;

        Ok(entry.lfh_offset + LFH_SIZE as u64 + file_name_length + extra_field_length)
    }

    pub fn reader(&self) -> &Arc<R> {
        &self.reader
    }
}

/// The raw Central Directory of an open archive.
pub struct CentralDirectory {
    data: Vec<u8>,
    total_entries: u64,
}

impl CentralDirectory {
    /// Build a directory from bytes already in memory.
    pub fn from_bytes(data: Vec<u8>, total_entries: u64) -> Self {
        Self {
            data,
            total_entries,
        }
    }

    /// Number of records the end record claims.
    pub fn declared_entries(&self) -> u64 {
        self.total_entries
    }

    /// Position a cursor on the first record.
    ///
    /// Fails for an empty directory or when the first record is damaged.
    pub fn first(&self) -> Result<RecordCursor<'_>> {
        if self.total_entries == 0 {
            return Err(ArchiveError::InvalidArchive("archive has no entries"));
        }
        let len = RecordCursor::frame(&self.data, 0)?;
        Ok(RecordCursor {
            data: &self.data,
            total: self.total_entries,
            index: 0,
            start: 0,
            len,
        })
    }
}

/// First/next cursor over Central Directory records.
pub struct RecordCursor<'a> {
    data: &'a [u8],
    total: u64,
    index: u64,
    start: usize,
    len: usize,
}

impl<'a> RecordCursor<'a> {
    /// Validate the record header at `start` and return the record length.
    fn frame(data: &[u8], start: usize) -> Result<usize> {
        let header = data
            .get(start..start + CDFH_MIN_SIZE)
            .ok_or(ArchiveError::InvalidArchive("truncated central directory"))?;
        if &header[0..4] != CDFH_SIGNATURE {
            return Err(ArchiveError::InvalidArchive("bad central directory signature"));
        }

        let field = |at: usize| u16::from_le_bytes([header[at], header[at + 1]]) as usize;
        let len = CDFH_MIN_SIZE + field(28) + field(30) + field(32);
        if start + len > data.len() {
            return Err(ArchiveError::InvalidArchive("truncated central directory"));
        }
        Ok(len)
    }

    /// Move to the next record.
    ///
    /// Returns `false` once the directory is exhausted or the next record
    /// cannot be framed; the cursor then stays on the current record.
    pub fn advance(&mut self) -> bool {
        if self.index + 1 >= self.total {
            return false;
        }
        let next = self.start + self.len;
        match Self::frame(self.data, next) {
            Ok(len) => {
                self.index += 1;
                self.start = next;
                self.len = len;
                trace!("cursor at record {}", self.index);
                true
            }
            Err(e) => {
                trace!("cursor stopped after record {}: {}", self.index, e);
                false
            }
        }
    }

    /// Zero-based position of the current record.
    pub fn index(&self) -> u64 {
        self.index
    }

    fn record(&self) -> &'a [u8] {
        &self.data[self.start..self.start + self.len]
    }

    /// Name bytes of the current record, exactly as stored.
    pub fn raw_name(&self) -> &'a [u8] {
        let record = self.record();
        let name_len = u16::from_le_bytes([record[28], record[29]]) as usize;
        &record[CDFH_MIN_SIZE..CDFH_MIN_SIZE + name_len]
    }

    /// Name of the current record, non-UTF-8 bytes replaced.
    pub fn name(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.raw_name())
    }

    /// Parse the full metadata of the current record.
    pub fn entry(&self) -> Result<ZipFileEntry> {
        let record = self.record();
        let raw_name = self.raw_name();
        let unreadable = |reason| ArchiveError::UnreadableEntry {
            name: String::from_utf8_lossy(raw_name).into_owned(),
            reason,
        };

        if raw_name.is_empty() {
            return Err(unreadable("empty name"));
        }
        if raw_name.contains(&0) {
            return Err(unreadable("name contains NUL"));
        }

        let mut cursor = Cursor::new(&record[8..]);
        let flags = cursor.read_u16::<LittleEndian>()?;
        let compression_method = cursor.read_u16::<LittleEndian>()?;
        let _last_mod_time = cursor.read_u16::<LittleEndian>()?;
        let _last_mod_date = cursor.read_u16::<LittleEndian>()?;
        let crc32 = cursor.read_u32::<LittleEndian>()?;
        let compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
        let uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
        let name_len = cursor.read_u16::<LittleEndian>()? as usize;
        let extra_len = cursor.read_u16::<LittleEndian>()? as usize;
        cursor.set_position(42 - 8);
        let lfh_offset = cursor.read_u32::<LittleEndian>()? as u64;

        let extra_start = CDFH_MIN_SIZE + name_len;
        let extra = &record[extra_start..extra_start + extra_len];

        // Only the fields whose header value is the sentinel live in the
        // ZIP64 extra field, in this fixed order.
        let mut uncompressed = (uncompressed_size != SENTINEL_32).then_some(uncompressed_size);
        let mut compressed = (compressed_size != SENTINEL_32).then_some(compressed_size);
        let mut offset = (lfh_offset != SENTINEL_32).then_some(lfh_offset);

        let mut fields = Cursor::new(extra);
        while fields.position() + 4 <= extra.len() as u64 {
            let header_id = fields.read_u16::<LittleEndian>()?;
            let field_size = fields.read_u16::<LittleEndian>()? as u64;
            let body_start = fields.position();
            if body_start + field_size > extra.len() as u64 {
                return Err(unreadable("malformed extra field"));
            }

            if header_id == ZIP64_EXTRA_ID {
                let body = &extra[body_start as usize..(body_start + field_size) as usize];
                let mut zip64 = Cursor::new(body);
                for slot in [&mut uncompressed, &mut compressed, &mut offset] {
                    if slot.is_none() && zip64.position() + 8 <= body.len() as u64 {
                        *slot = Some(zip64.read_u64::<LittleEndian>()?);
                    }
                }
            }
            fields.set_position(body_start + field_size);
        }

        let (Some(uncompressed_size), Some(compressed_size), Some(lfh_offset)) =
            (uncompressed, compressed, offset)
        else {
            return Err(unreadable("missing ZIP64 extra field"));
        };

        Ok(ZipFileEntry {
            file_name: String::from_utf8_lossy(raw_name).into_owned(),
            flags,
            compression_method: CompressionMethod::from_u16(compression_method),
            compressed_size,
            uncompressed_size,
            crc32,
            lfh_offset,
        })
    }
}
