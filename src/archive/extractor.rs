use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::crc;
use crate::error::{ArchiveError, Result};
use crate::fs::{FileMeta, FileSystem, LocalFs};

use super::format::ArchiveEntry;
use super::path::resolve_entry_path;
use super::progress::Progress;
use super::reader::ArchiveReader;

/// Open an archive file for reading, reporting a missing file as `NotFound`.
pub fn open_archive(path: &Path) -> Result<BufReader<File>> {
    match File::open(path) {
        Ok(f) => Ok(BufReader::new(f)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(ArchiveError::NotFound(path.to_path_buf()))
        }
        Err(e) => Err(e.into()),
    }
}

/// List entries without materializing any content.
///
/// Only entry headers and paths are read; content regions are skipped.
pub fn list<R: Read>(input: R) -> Result<Vec<ArchiveEntry>> {
    let mut reader = ArchiveReader::new(input)?;
    let mut entries = Vec::with_capacity(reader.remaining().min(4096) as usize);

    while let Some(entry) = reader.next_entry()? {
        reader.skip_content()?;
        entries.push(entry);
    }
    Ok(entries)
}

/// Outcome of [`verify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyReport {
    pub entries: u32,
    pub total_bytes: u64,
}

/// Check every entry's path and checksum without writing anything.
///
/// Content is streamed through the checksum in fixed-size chunks.
pub fn verify<R: Read>(input: R, progress: &mut dyn Progress) -> Result<VerifyReport> {
    let mut reader = ArchiveReader::new(input)?;
    let total = reader.header().entry_count;
    progress.start(total);

    let mut report = VerifyReport {
        entries: 0,
        total_bytes: 0,
    };

    while let Some(entry) = reader.next_entry()? {
        resolve_entry_path(Path::new(""), &entry.path)?;

        let actual = reader.checksum_content()?;
        if actual != entry.checksum {
            return Err(ArchiveError::ChecksumMismatch {
                path: entry.path,
                expected: entry.checksum,
                actual,
            });
        }

        report.entries += 1;
        report.total_bytes += entry.content_size;
        progress.entry(report.entries, total, &entry);
    }

    progress.finish();
    Ok(report)
}

/// Extracts containers onto a [`FileSystem`].
pub struct Extractor<F: FileSystem = LocalFs> {
    fs: F,
    overwrite: bool,
}

impl Extractor<LocalFs> {
    pub fn new() -> Self {
        Self::with_fs(LocalFs)
    }
}

impl Default for Extractor<LocalFs> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FileSystem> Extractor<F> {
    pub fn with_fs(fs: F) -> Self {
        Self {
            fs,
            overwrite: true,
        }
    }

    /// When false, existing files are left untouched (their entries are
    /// still verified).
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Extract every entry under `dest` and return the number of files written.
    ///
    /// Each entry is verified before it is written. The first bad entry
    /// (checksum mismatch, escaping path, truncation) aborts the whole
    /// operation; files already written for earlier entries stay on disk.
    pub fn unpack<R: Read>(
        &self,
        input: R,
        dest: &Path,
        progress: &mut dyn Progress,
    ) -> Result<usize> {
        let mut reader = ArchiveReader::new(input)?;
        let header = *reader.header();
        debug!(
            version = header.format_version,
            entries = header.entry_count,
            created_at = header.created_at,
            "archive header"
        );

        self.fs.create_dir_all(dest)?;
        progress.start(header.entry_count);

        let mut index = 0u32;
        let mut written = 0usize;

        while let Some(entry) = reader.next_entry()? {
            index += 1;
            let out_path = resolve_entry_path(dest, &entry.path)?;

            let content = reader.read_content()?;
            let actual = crc::checksum(&content);
            if actual != entry.checksum {
                return Err(ArchiveError::ChecksumMismatch {
                    path: entry.path,
                    expected: entry.checksum,
                    actual,
                });
            }

            if !self.overwrite && self.fs.exists(&out_path) {
                debug!(path = %entry.path, "exists, skipping");
                progress.skipped(&entry);
                continue;
            }

            self.fs.write_file(&out_path, &content)?;
            let meta = FileMeta {
                modified_time: entry.modified_time,
                permission_bits: entry.permission_bits,
            };
            if let Err(e) = self.fs.restore_metadata(&out_path, &meta) {
                warn!(path = %entry.path, error = %e, "could not restore metadata");
            }

            written += 1;
            debug!(path = %entry.path, size = entry.content_size, "extracted");
            progress.entry(index, header.entry_count, &entry);
        }

        progress.finish();
        info!(dest = %dest.display(), written, "unpack complete");
        Ok(written)
    }

    /// [`unpack`](Self::unpack) reading from an archive file.
    pub fn unpack_file(
        &self,
        archive: &Path,
        dest: &Path,
        progress: &mut dyn Progress,
    ) -> Result<usize> {
        self.unpack(open_archive(archive)?, dest, progress)
    }
}
