use flate2::Crc;
use std::io::Read;
use std::ops::Deref;

use crate::error::{ArchiveError, Result};

/// The complete, verified contents of one entry.
///
/// The only way to build one is [`EntryBytes::read_exact_from`], which
/// refuses to produce a value unless exactly the declared number of bytes
/// was read, so a partially filled buffer is never observable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryBytes {
    name: String,
    data: Vec<u8>,
}

impl EntryBytes {
    /// Read exactly `declared` bytes of entry `name` from `reader`.
    ///
    /// Fails when the reader runs dry early, has data left over, or
    /// when the bytes do not hash to `expected_crc`.
    pub fn read_exact_from<T: Read>(
        name: &str,
        declared: u64,
        expected_crc: u32,
        mut reader: T,
    ) -> Result<Self> {
        let mut data = vec![0u8; declared as usize];
        let mut filled = 0;
        while filled < data.len() {
            let n = reader.read(&mut data[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        // One extra byte is enough to tell an overlong entry apart.
        let mut probe = [0u8; 1];
        let overflow = if filled == data.len() {
            reader.read(&mut probe)?
        } else {
            0
        };

        if filled != data.len() || overflow != 0 {
            return Err(ArchiveError::SizeMismatch {
                name: name.to_string(),
                expected: declared,
                actual: (filled + overflow) as u64,
            });
        }

        let mut crc = Crc::new();
        crc.update(&data);
        if crc.sum() != expected_crc {
            return Err(ArchiveError::CrcMismatch {
                name: name.to_string(),
                expected: expected_crc,
                actual: crc.sum(),
            });
        }

        Ok(Self {
            name: name.to_string(),
            data,
        })
    }

    /// Name of the entry these bytes came from.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

impl Deref for EntryBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl AsRef<[u8]> for EntryBytes {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}
