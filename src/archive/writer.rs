use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info};

use crate::crc;
use crate::error::{ArchiveError, Result};
use crate::fs::{FileMeta, FileSystem, LocalFs, SourceFile};

use super::format::{ArchiveEntry, EntryHeader, GlobalHeader};
use super::progress::Progress;

/// Longest path an entry header can describe.
const MAX_PATH_LEN: usize = u32::MAX as usize;

/// Append-only container writer.
///
/// The entry count goes into the global header up front, so it must be
/// known before the first record; [`finish`](Self::finish) refuses to
/// complete a container whose record count disagrees with it.
pub struct ArchiveWriter<W: Write> {
    inner: W,
    declared: u32,
    written: u32,
}

impl<W: Write> ArchiveWriter<W> {
    /// Write the global header and return a writer positioned at the first record.
    pub fn new(mut inner: W, entry_count: u32, created_at: u64) -> Result<Self> {
        GlobalHeader::new(entry_count, created_at).write_to(&mut inner)?;
        Ok(Self {
            inner,
            declared: entry_count,
            written: 0,
        })
    }

    /// Append one record: entry header, path bytes, content bytes.
    pub fn add_entry(&mut self, path: &str, content: &[u8], meta: &FileMeta) -> Result<ArchiveEntry> {
        if self.written >= self.declared {
            return Err(ArchiveError::invalid(format!(
                "more entries than the {} declared",
                self.declared
            )));
        }

        let path_length = u32::try_from(path.len())
            .map_err(|_| ArchiveError::invalid(format!("path too long: {path}")))?;

        let header = EntryHeader {
            path_length,
            content_size: content.len() as u64,
            modified_time: meta.modified_time,
            checksum: crc::checksum(content),
            permission_bits: meta.permission_bits,
        };

        header.write_to(&mut self.inner)?;
        self.inner.write_all(path.as_bytes())?;
        self.inner.write_all(content)?;
        self.written += 1;

        Ok(ArchiveEntry::from_header(&header, path.to_string()))
    }

    pub fn written(&self) -> u32 {
        self.written
    }

    /// Flush and hand back the underlying stream.
    pub fn finish(mut self) -> Result<W> {
        if self.written != self.declared {
            return Err(ArchiveError::invalid(format!(
                "declared {} entries but wrote {}",
                self.declared, self.written
            )));
        }
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Outcome of a successful pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackSummary {
    pub entries: u32,
    pub total_bytes: u64,
}

/// Packs a directory tree into a container.
pub struct Packer<F: FileSystem = LocalFs> {
    fs: F,
}

impl Packer<LocalFs> {
    pub fn new() -> Self {
        Self { fs: LocalFs }
    }
}

impl Default for Packer<LocalFs> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FileSystem> Packer<F> {
    pub fn with_fs(fs: F) -> Self {
        Self { fs }
    }

    /// Pack `source` into a new file at `archive`.
    ///
    /// Nothing is created when `source` is missing. A failure after the
    /// output has been created removes the partial file.
    pub fn pack_to_file(
        &self,
        source: &Path,
        archive: &Path,
        progress: &mut dyn Progress,
    ) -> Result<PackSummary> {
        if !self.fs.is_dir(source) {
            return Err(ArchiveError::NotFound(source.to_path_buf()));
        }

        let files = self.fs.walk(source, Some(archive))?;
        let total = check_files(&files, MAX_PATH_LEN)?;
        let out = File::create(archive)?;

        match self.write_files(source, &files, total, BufWriter::new(out), progress) {
            Ok(summary) => {
                info!(
                    archive = %archive.display(),
                    entries = summary.entries,
                    bytes = summary.total_bytes,
                    "archive created"
                );
                Ok(summary)
            }
            Err(e) => {
                debug!(archive = %archive.display(), "removing partial archive");
                let _ = fs::remove_file(archive);
                Err(e)
            }
        }
    }

    /// Pack `source` into an arbitrary stream.
    pub fn pack<W: Write>(
        &self,
        source: &Path,
        out: W,
        progress: &mut dyn Progress,
    ) -> Result<PackSummary> {
        if !self.fs.is_dir(source) {
            return Err(ArchiveError::NotFound(source.to_path_buf()));
        }
        let files = self.fs.walk(source, None)?;
        let total = check_files(&files, MAX_PATH_LEN)?;
        self.write_files(source, &files, total, out, progress)
    }

    fn write_files<W: Write>(
        &self,
        source: &Path,
        files: &[SourceFile],
        total: u32,
        out: W,
        progress: &mut dyn Progress,
    ) -> Result<PackSummary> {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());

        debug!(source = %source.display(), total, "packing");
        progress.start(total);

        let mut writer = ArchiveWriter::new(out, total, created_at)?;
        let mut total_bytes = 0u64;

        for file in files {
            let content = self.fs.read_file(&file.path)?;
            let meta = self.fs.metadata(&file.path);
            let entry = writer.add_entry(&file.rel_path, &content, &meta)?;

            debug!(
                path = %entry.path,
                size = entry.content_size,
                checksum = entry.checksum,
                "packed entry"
            );
            total_bytes += entry.content_size;
            progress.entry(writer.written(), total, &entry);
        }

        writer.finish()?;
        progress.finish();

        Ok(PackSummary {
            entries: total,
            total_bytes,
        })
    }
}

/// Entry count for `files`, failing if any of them cannot be encoded.
///
/// Runs before the output is opened, so a walk the format cannot hold
/// never leaves bytes behind.
fn check_files(files: &[SourceFile], max_path_len: usize) -> Result<u32> {
    let total = u32::try_from(files.len())
        .map_err(|_| ArchiveError::invalid(format!("too many files: {}", files.len())))?;
    if let Some(file) = files.iter().find(|f| f.rel_path.len() > max_path_len) {
        return Err(ArchiveError::invalid(format!("path too long: {}", file.rel_path)));
    }
    Ok(total)
}
