//! Helpers shared by the integration tests.
//!
//! `ZipBuilder` writes small archives by hand so tests can produce the
//! damaged layouts (lying sizes, bad CRCs, unreadable records) that no
//! well-behaved encoder emits.

#![allow(dead_code)]

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Crc;
use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;
use std::path::{Path, PathBuf};

use romzip::{ArchiveSession, SessionConfig};

pub const FIXTURE: &str = "collection.zip";

/// Known contents of `tests/fixtures/collection.zip`.
pub fn game_crt() -> Vec<u8> {
    (0..16384u32).map(|i| ((i * 7 + 3) % 256) as u8).collect()
}

pub fn side1_d64() -> Vec<u8> {
    b"C64DISK".repeat(5000)
}

pub fn side2_d64() -> Vec<u8> {
    (0..20000u32).map(|i| (i % 251) as u8).collect()
}

pub const README: &[u8] = b"Last Ninja cartridge. Insert and power on.\n";

/// Copy a checked-in fixture into `dir` under `name`.
pub fn fixture_copy(fixture: &str, dir: &Path, name: &str) -> PathBuf {
    let source = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(fixture);
    let target = dir.join(name);
    std::fs::copy(&source, &target).expect("Failed to copy fixture");
    target
}

pub fn temp_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("romzip-test-")
        .tempdir()
        .expect("Failed to create temp dir")
}

pub fn session_in(dir: &Path) -> ArchiveSession {
    ArchiveSession::new(SessionConfig::with_scratch_dir(dir.join("scratch")))
}

pub struct FakeEntry {
    pub name: Vec<u8>,
    pub data: Vec<u8>,
    pub deflate: bool,
    /// Uncompressed size written to the headers instead of the real one.
    pub declared_size: Option<u32>,
    /// CRC written to the headers instead of the real one.
    pub crc: Option<u32>,
}

impl FakeEntry {
    pub fn new(name: &str, data: &[u8]) -> Self {
        Self {
            name: name.as_bytes().to_vec(),
            data: data.to_vec(),
            deflate: false,
            declared_size: None,
            crc: None,
        }
    }

    pub fn deflated(mut self) -> Self {
        self.deflate = true;
        self
    }

    pub fn declared_size(mut self, size: u32) -> Self {
        self.declared_size = Some(size);
        self
    }

    pub fn crc(mut self, crc: u32) -> Self {
        self.crc = Some(crc);
        self
    }
}

#[derive(Default)]
pub struct ZipBuilder {
    entries: Vec<FakeEntry>,
    comment: Vec<u8>,
}

impl ZipBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored(self, name: &str, data: &[u8]) -> Self {
        self.entry(FakeEntry::new(name, data))
    }

    pub fn deflated(self, name: &str, data: &[u8]) -> Self {
        self.entry(FakeEntry::new(name, data).deflated())
    }

    pub fn dir(self, name: &str) -> Self {
        self.entry(FakeEntry::new(name, b""))
    }

    pub fn entry(mut self, entry: FakeEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn comment(mut self, comment: &str) -> Self {
        self.comment = comment.as_bytes().to_vec();
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut central = Vec::new();

        for entry in &self.entries {
            let mut crc = Crc::new();
            crc.update(&entry.data);
            let crc = entry.crc.unwrap_or(crc.sum());

            let payload = if entry.deflate {
                let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(&entry.data).unwrap();
                encoder.finish().unwrap()
            } else {
                entry.data.clone()
            };
            let method = if entry.deflate { 8 } else { 0 };
            let size = entry.declared_size.unwrap_or(entry.data.len() as u32);
            let offset = out.len() as u32;

            out.extend_from_slice(b"PK\x03\x04");
            out.write_u16::<LittleEndian>(20).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.write_u16::<LittleEndian>(method).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.write_u16::<LittleEndian>(0x21).unwrap();
            out.write_u32::<LittleEndian>(crc).unwrap();
            out.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
            out.write_u32::<LittleEndian>(size).unwrap();
            out.write_u16::<LittleEndian>(entry.name.len() as u16).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.extend_from_slice(&entry.name);
            out.extend_from_slice(&payload);

            central.extend_from_slice(b"PK\x01\x02");
            central.write_u16::<LittleEndian>(20).unwrap();
            central.write_u16::<LittleEndian>(20).unwrap();
            central.write_u16::<LittleEndian>(0).unwrap();
            central.write_u16::<LittleEndian>(method).unwrap();
            central.write_u16::<LittleEndian>(0).unwrap();
            central.write_u16::<LittleEndian>(0x21).unwrap();
            central.write_u32::<LittleEndian>(crc).unwrap();
            central.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
            central.write_u32::<LittleEndian>(size).unwrap();
            central.write_u16::<LittleEndian>(entry.name.len() as u16).unwrap();
            central.write_u16::<LittleEndian>(0).unwrap(); // extra
            central.write_u16::<LittleEndian>(0).unwrap(); // comment
            central.write_u16::<LittleEndian>(0).unwrap(); // disk
            central.write_u16::<LittleEndian>(0).unwrap(); // internal attrs
            central.write_u32::<LittleEndian>(0).unwrap(); // external attrs
            central.write_u32::<LittleEndian>(offset).unwrap();
            central.extend_from_slice(&entry.name);
        }

        let cd_offset = out.len() as u32;
        out.extend_from_slice(&central);

        out.extend_from_slice(b"PK\x05\x06");
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(self.entries.len() as u16).unwrap();
        out.write_u16::<LittleEndian>(self.entries.len() as u16).unwrap();
        out.write_u32::<LittleEndian>(central.len() as u32).unwrap();
        out.write_u32::<LittleEndian>(cd_offset).unwrap();
        out.write_u16::<LittleEndian>(self.comment.len() as u16).unwrap();
        out.extend_from_slice(&self.comment);
        out
    }

    pub fn write_to(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.build()).expect("Failed to write test archive");
        path
    }
}
