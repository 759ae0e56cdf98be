use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

use crate::error::{ArchiveError, Result};

/// `KAAR` read as a little-endian u32.
pub const MAGIC: u32 = 0x5241_414B;

/// The only container version this crate reads or writes.
pub const FORMAT_VERSION: u16 = 1;

/// Global Header - 22 bytes, at offset 0 of every container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalHeader {
    pub magic: u32,
    pub format_version: u16,
    pub entry_count: u32,
    pub created_at: u64,
    pub reserved: u32,
}

impl GlobalHeader {
    pub const SIZE: usize = 22;

    pub fn new(entry_count: u32, created_at: u64) -> Self {
        Self {
            magic: MAGIC,
            format_version: FORMAT_VERSION,
            entry_count,
            created_at,
            reserved: 0,
        }
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_u32::<LittleEndian>(self.magic)?;
        w.write_u16::<LittleEndian>(self.format_version)?;
        w.write_u32::<LittleEndian>(self.entry_count)?;
        w.write_u64::<LittleEndian>(self.created_at)?;
        // Always zero on write, whatever the caller put in the struct.
        w.write_u32::<LittleEndian>(0)?;
        Ok(())
    }

    /// Decode and validate the header.
    ///
    /// The magic is checked before any other field is interpreted; the
    /// reserved field is ignored.
    pub fn read_from<R: Read>(r: &mut R) -> Result<Self> {
        let mut buf = [0u8; Self::SIZE];
        r.read_exact(&mut buf)
            .map_err(|e| ArchiveError::truncated("global header", e))?;
        Self::from_bytes(&buf)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(ArchiveError::invalid("truncated global header"));
        }

        let mut cursor = data;
        let magic = cursor.read_u32::<LittleEndian>()?;
        if magic != MAGIC {
            return Err(ArchiveError::invalid(format!(
                "wrong magic number {magic:#010x}"
            )));
        }

        let format_version = cursor.read_u16::<LittleEndian>()?;
        if format_version != FORMAT_VERSION {
            return Err(ArchiveError::UnsupportedVersion(format_version));
        }

        Ok(Self {
            magic,
            format_version,
            entry_count: cursor.read_u32::<LittleEndian>()?,
            created_at: cursor.read_u64::<LittleEndian>()?,
            reserved: cursor.read_u32::<LittleEndian>()?,
        })
    }
}

/// Entry Header - 26 bytes, followed by the path and content regions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryHeader {
    pub path_length: u32,
    pub content_size: u64,
    pub modified_time: u64,
    pub checksum: u32,
    pub permission_bits: u16,
}

impl EntryHeader {
    pub const SIZE: usize = 26;

    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_u32::<LittleEndian>(self.path_length)?;
        w.write_u64::<LittleEndian>(self.content_size)?;
        w.write_u64::<LittleEndian>(self.modified_time)?;
        w.write_u32::<LittleEndian>(self.checksum)?;
        w.write_u16::<LittleEndian>(self.permission_bits)?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> Result<Self> {
        let mut buf = [0u8; Self::SIZE];
        r.read_exact(&mut buf)
            .map_err(|e| ArchiveError::truncated("entry header", e))?;

        let mut cursor = &buf[..];
        Ok(Self {
            path_length: cursor.read_u32::<LittleEndian>()?,
            content_size: cursor.read_u64::<LittleEndian>()?,
            modified_time: cursor.read_u64::<LittleEndian>()?,
            checksum: cursor.read_u32::<LittleEndian>()?,
            permission_bits: cursor.read_u16::<LittleEndian>()?,
        })
    }

    /// Bytes this record occupies in the container.
    pub fn record_len(&self) -> u64 {
        Self::SIZE as u64 + self.path_length as u64 + self.content_size
    }
}

/// Parsed entry information, without content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: String,
    pub content_size: u64,
    pub modified_time: u64,
    pub checksum: u32,
    pub permission_bits: u16,
}

impl ArchiveEntry {
    pub fn from_header(header: &EntryHeader, path: String) -> Self {
        Self {
            path,
            content_size: header.content_size,
            modified_time: header.modified_time,
            checksum: header.checksum,
            permission_bits: header.permission_bits,
        }
    }

    /// Render permission bits as `rwxr-xr-x`.
    pub fn mode_string(&self) -> String {
        let mut out = String::with_capacity(9);
        for shift in [6u16, 3, 0] {
            let bits = (self.permission_bits >> shift) & 0o7;
            out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
            out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
            out.push(if bits & 0o1 != 0 { 'x' } else { '-' });
        }
        out
    }
}
