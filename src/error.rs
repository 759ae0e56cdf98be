use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by pack, unpack, list and verify.
///
/// Every variant is terminal for the operation that raised it.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("invalid archive: {0}")]
    InvalidFormat(String),

    #[error("unsupported archive version {0}")]
    UnsupportedVersion(u16),

    #[error("CRC32 mismatch for {path} (expected {expected:#010x}, got {actual:#010x})")]
    ChecksumMismatch {
        path: String,
        expected: u32,
        actual: u32,
    },

    #[error("entry path escapes destination: {0}")]
    PathTraversal(String),
}

impl ArchiveError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        ArchiveError::InvalidFormat(msg.into())
    }

    /// Map a short read inside a record to a truncation error.
    pub(crate) fn truncated(what: &str, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            ArchiveError::InvalidFormat(format!("truncated {what}"))
        } else {
            ArchiveError::Io(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, ArchiveError>;
