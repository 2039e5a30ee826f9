//! ZIP archive parsing and entry decoding.
//!
//! This module is the codec underneath the archive layer: it opens a
//! container, walks its records and hands out readers for entry data.
//!
//! ## Architecture
//!
//! - [`structures`]: Data structures representing ZIP format elements (EOCD, file headers, etc.)
//! - [`parser`]: Low-level parsing of ZIP structures from raw bytes, and the record cursor
//! - [`session`]: An open container with exact-name lookup and entry readers
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - ZIP64 extensions for files > 4GB
//! - STORED and DEFLATE compression methods
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - No BZIP2, LZMA, or other compression methods

mod parser;
mod session;
mod structures;

pub use parser::{CentralDirectory, RecordCursor, ZipParser};
pub use session::{EntryReader, ZipSession};
pub use structures::*;
