//! # kar
//!
//! A Rust archiver for the KAR container format.
//!
//! A KAR container bundles a directory tree of regular files (relative
//! paths, content, modification time, permission bits) into one binary
//! stream. Each entry carries a CRC-32 of its content, and extraction
//! verifies every entry before writing it.
//!
//! ## Features
//!
//! - Pack a directory into a container with deterministic entry order
//! - List entries without reading their content into memory
//! - Verify every checksum without extracting
//! - Unpack with path traversal protection and metadata restore
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use kar::{Extractor, NoProgress, Packer, list, open_archive};
//!
//! fn main() -> kar::Result<()> {
//!     Packer::new().pack_to_file(Path::new("assets"), Path::new("assets.kar"), &mut NoProgress)?;
//!
//!     for entry in list(open_archive(Path::new("assets.kar"))?)? {
//!         println!("{} ({} bytes)", entry.path, entry.content_size);
//!     }
//!
//!     let written = Extractor::new().unpack_file(
//!         Path::new("assets.kar"),
//!         Path::new("restored"),
//!         &mut NoProgress,
//!     )?;
//!     println!("{written} files restored");
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod cli;
pub mod crc;
pub mod error;
pub mod fs;

pub use archive::{
    ArchiveEntry, ArchiveReader, ArchiveWriter, Extractor, NoProgress, PackSummary, Packer,
    Progress, VerifyReport, list, open_archive, verify,
};
pub use cli::Cli;
pub use error::{ArchiveError, Result};
pub use fs::{FileMeta, FileSystem, LocalFs};
