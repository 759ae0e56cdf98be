//! Forward-only container reader.
//!
//! [`ArchiveReader`] walks a container record by record from any [`Read`]
//! source. After [`next_entry`](ArchiveReader::next_entry) returns an entry,
//! the caller decides what to do with its content region: read it into
//! memory, stream it through the checksum, or skip it. Whatever is left
//! unconsumed is skipped automatically before the next entry header is
//! parsed, so the stream position always lands exactly on a record boundary.

use std::io::{self, Read};

use crate::crc::Crc32;
use crate::error::{ArchiveError, Result};

use super::format::{ArchiveEntry, EntryHeader, GlobalHeader};

/// Chunk size for streaming content through the checksum.
const CHUNK_SIZE: usize = 64 * 1024;

pub struct ArchiveReader<R: Read> {
    inner: R,
    header: GlobalHeader,
    /// Entries not yet returned by `next_entry`.
    remaining: u32,
    /// Content bytes of the current entry not yet consumed.
    pending: u64,
}

impl<R: Read> ArchiveReader<R> {
    /// Parse and validate the global header.
    pub fn new(mut inner: R) -> Result<Self> {
        let header = GlobalHeader::read_from(&mut inner)?;
        Ok(Self {
            inner,
            remaining: header.entry_count,
            header,
            pending: 0,
        })
    }

    pub fn header(&self) -> &GlobalHeader {
        &self.header
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Parse the next entry header and path, or `None` once `entry_count`
    /// entries have been returned.
    pub fn next_entry(&mut self) -> Result<Option<ArchiveEntry>> {
        if self.pending > 0 {
            self.skip_content()?;
        }
        if self.remaining == 0 {
            return Ok(None);
        }

        let header = EntryHeader::read_from(&mut self.inner)?;

        let mut path_bytes = Vec::new();
        let got = (&mut self.inner)
            .take(header.path_length as u64)
            .read_to_end(&mut path_bytes)?;
        if got as u64 != header.path_length as u64 {
            return Err(ArchiveError::invalid("truncated entry path"));
        }
        let path = String::from_utf8(path_bytes)
            .map_err(|_| ArchiveError::invalid("entry path is not UTF-8"))?;

        self.remaining -= 1;
        self.pending = header.content_size;
        Ok(Some(ArchiveEntry::from_header(&header, path)))
    }

    /// Read the current entry's content into memory.
    pub fn read_content(&mut self) -> Result<Vec<u8>> {
        let want = self.pending;
        self.pending = 0;

        let mut buf = Vec::with_capacity(want.min(CHUNK_SIZE as u64) as usize);
        let got = (&mut self.inner).take(want).read_to_end(&mut buf)?;
        if got as u64 != want {
            return Err(ArchiveError::invalid("truncated entry content"));
        }
        Ok(buf)
    }

    /// Advance past the current entry's content without buffering it.
    pub fn skip_content(&mut self) -> Result<u64> {
        let want = self.pending;
        self.pending = 0;

        let got = io::copy(&mut (&mut self.inner).take(want), &mut io::sink())?;
        if got != want {
            return Err(ArchiveError::invalid("truncated entry content"));
        }
        Ok(got)
    }

    /// Stream the current entry's content through CRC-32 in fixed-size chunks
    /// and return the computed value.
    pub fn checksum_content(&mut self) -> Result<u32> {
        let mut crc = Crc32::new();
        let cap = usize::try_from(self.pending).map_or(CHUNK_SIZE, |p| p.min(CHUNK_SIZE));
        let mut buf = vec![0u8; cap];

        while self.pending > 0 {
            let n = usize::try_from(self.pending).map_or(cap, |p| p.min(cap));
            let read = match self.inner.read(&mut buf[..n]) {
                Ok(0) => return Err(ArchiveError::invalid("truncated entry content")),
                Ok(read) => read,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            crc.update(&buf[..read]);
            self.pending -= read as u64;
        }
        Ok(crc.finalize())
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}
