//! Filesystem collaborator used by pack and unpack.
//!
//! The archive code never touches `std::fs` directly; directory walking,
//! content reads, metadata capture and metadata restore all go through
//! [`FileSystem`], with [`LocalFs`] as the real implementation.

mod local;

pub use local::LocalFs;

use std::path::{Path, PathBuf};

use crate::error::Result;

/// Permission bits recorded when the platform offers none.
pub const DEFAULT_PERMISSIONS: u16 = 0o644;

/// A regular file found under a source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Location on disk.
    pub path: PathBuf,
    /// Path relative to the walk root, `/`-separated.
    pub rel_path: String,
}

/// Metadata carried in each entry header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMeta {
    /// Seconds since the Unix epoch.
    pub modified_time: u64,
    pub permission_bits: u16,
}

impl Default for FileMeta {
    fn default() -> Self {
        Self {
            modified_time: 0,
            permission_bits: DEFAULT_PERMISSIONS,
        }
    }
}

/// Trait for the filesystem operations pack and unpack depend on
pub trait FileSystem {
    /// Whether `path` is an existing directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Whether anything exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// All regular files under `root` in a stable order, skipping `exclude`.
    fn walk(&self, root: &Path, exclude: Option<&Path>) -> Result<Vec<SourceFile>>;

    /// Full content of a file.
    fn read_file(&self, path: &Path) -> Result<Vec<u8>>;

    /// Metadata for a file, falling back to [`FileMeta::default`] when unavailable.
    fn metadata(&self, path: &Path) -> FileMeta;

    /// Create `path` (and any missing parents) holding `contents`.
    fn write_file(&self, path: &Path, contents: &[u8]) -> Result<()>;

    /// Apply recorded metadata to a written file.
    fn restore_metadata(&self, path: &Path, meta: &FileMeta) -> Result<()>;

    fn create_dir_all(&self, path: &Path) -> Result<()>;
}
