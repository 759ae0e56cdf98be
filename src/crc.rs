//! CRC-32 (IEEE 802.3) checksum engine.
//!
//! Uses the reflected polynomial `0xEDB88320` with a 256-entry lookup table.
//! The table is built at compile time and shared by every computation in the
//! process through [`TABLE`].
//!
//! ## Example
//!
//! ```
//! use kar::crc::{checksum, Crc32};
//!
//! assert_eq!(checksum(b"123456789"), 0xCBF4_3926);
//!
//! let mut crc = Crc32::new();
//! crc.update(b"1234");
//! crc.update(b"56789");
//! assert_eq!(crc.finalize(), 0xCBF4_3926);
//! ```

/// Reflected IEEE 802.3 polynomial.
pub const POLYNOMIAL: u32 = 0xEDB8_8320;

/// Precomputed lookup table for byte-at-a-time CRC-32.
#[derive(Debug, Clone)]
pub struct Crc32Table {
    entries: [u32; 256],
}

impl Crc32Table {
    /// Build the table: for each byte value, run eight shift/xor rounds.
    pub const fn new() -> Self {
        let mut entries = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = i as u32;
            let mut bit = 0;
            while bit < 8 {
                if crc & 1 != 0 {
                    crc = (crc >> 1) ^ POLYNOMIAL;
                } else {
                    crc >>= 1;
                }
                bit += 1;
            }
            entries[i] = crc;
            i += 1;
        }
        Self { entries }
    }

    /// Table entry for a byte value.
    pub fn get(&self, index: u8) -> u32 {
        self.entries[index as usize]
    }

    /// Feed `bytes` into a raw (non-inverted) accumulator.
    fn advance(&self, mut acc: u32, bytes: &[u8]) -> u32 {
        for &b in bytes {
            let index = (acc ^ b as u32) as u8;
            acc = (acc >> 8) ^ self.entries[index as usize];
        }
        acc
    }

    /// One-shot CRC-32 of `bytes`.
    pub fn checksum(&self, bytes: &[u8]) -> u32 {
        self.advance(0xFFFF_FFFF, bytes) ^ 0xFFFF_FFFF
    }
}

impl Default for Crc32Table {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide table.
pub static TABLE: Crc32Table = Crc32Table::new();

/// CRC-32 of `bytes` using the shared table.
pub fn checksum(bytes: &[u8]) -> u32 {
    TABLE.checksum(bytes)
}

/// Incremental CRC-32 for content that arrives in chunks.
#[derive(Debug, Clone, Copy)]
pub struct Crc32 {
    acc: u32,
    len: u64,
}

impl Crc32 {
    pub fn new() -> Self {
        Self {
            acc: 0xFFFF_FFFF,
            len: 0,
        }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.acc = TABLE.advance(self.acc, bytes);
        self.len += bytes.len() as u64;
    }

    /// Number of bytes fed so far.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn finalize(&self) -> u32 {
        self.acc ^ 0xFFFF_FFFF
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}
