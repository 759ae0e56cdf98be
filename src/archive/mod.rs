//! KAR container reading and writing.
//!
//! ## Architecture
//!
//! - [`format`]: wire structs (global header, entry header) with explicit
//!   little-endian encoding
//! - [`path`]: relative path normalization and traversal checks
//! - [`writer`]: record emitter and the directory [`Packer`]
//! - [`reader`]: forward-only record parser
//! - [`extractor`]: list, verify and unpack on top of the reader
//!
//! ## Container Layout
//!
//! ```text
//! GlobalHeader  magic:u32 format_version:u16 entry_count:u32 created_at:u64 reserved:u32
//! EntryHeader   path_length:u32 content_size:u64 modified_time:u64 checksum:u32 permission_bits:u16
//! Entry         EntryHeader, path[path_length], content[content_size]
//! Container     GlobalHeader, Entry * entry_count
//! ```
//!
//! Records follow each other with no padding. The checksum is CRC-32 of the
//! content bytes only and is always recomputed on read.
//!
//! ## Limitations
//!
//! - No compression or encryption
//! - Regular files only; symlinks and empty directories are not stored
//! - Single sequential writer and reader

pub mod extractor;
pub mod format;
pub mod path;
pub mod progress;
pub mod reader;
pub mod writer;

pub use extractor::{Extractor, VerifyReport, list, open_archive, verify};
pub use format::{ArchiveEntry, EntryHeader, FORMAT_VERSION, GlobalHeader, MAGIC};
pub use progress::{NoProgress, Progress};
pub use reader::ArchiveReader;
pub use writer::{ArchiveWriter, PackSummary, Packer};
