//! Checksummed record frames used by the Genius.
//!
//! Every record is laid out as:
//!
//! ```text
//! ┌───────────────────────────────┐
//! │ type tag  (u32, big endian)   │
//! │ body      [size - 10 bytes]   │
//! │ checksum  (u16, little endian)│
//! │ type tag  (u32, big endian)   │
//! └───────────────────────────────┘
//! ```
//!
//! The checksum covers the body only.

use core::fmt::{self, Write};

use super::check::compute_crc;

/// The kinds of framed record found in a Genius dive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// Dive start.
    Dstr,
    /// Tissue saturation.
    Tiss,
    /// Profile sample.
    Dprs,
    /// Air integration.
    Airs,
    /// Dive end.
    Dend,
}

impl RecordKind {
    /// The type tag repeated at both ends of the record.
    pub const fn tag(self) -> u32 {
        u32::from_be_bytes(*self.name())
    }

    /// The total size of the record, including its frame.
    pub const fn size(self) -> usize {
        match self {
            Self::Dstr => 58,
            Self::Tiss => 138,
            Self::Dprs => 34,
            Self::Airs => 16,
            Self::Dend => 162,
        }
    }

    /// The ASCII name spelled by the type tag.
    pub const fn name(self) -> &'static [u8; 4] {
        match self {
            Self::Dstr => b"DSTR",
            Self::Tiss => b"TISS",
            Self::Dprs => b"DPRS",
            Self::Airs => b"AIRS",
            Self::Dend => b"DEND",
        }
    }

    /// Validate the record of this kind starting at an offset, returning its
    /// body.
    pub fn body(self, r: &[u8], at: usize) -> Option<&[u8]> {
        let record = r.get(at..)?.get(..self.size())?;

        if is_valid_record(record, self.tag()) {
            record.get(4..self.size() - 6)
        } else {
            None
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.name()
            .iter()
            .try_for_each(|&b| f.write_char(b as char))
    }
}

/// Check that a slice holds exactly one well-formed record with the given
/// type tag.
pub fn is_valid_record(r: &[u8], tag: u32) -> bool {
    let size = r.len();
    if size < 10 {
        return false;
    }

    let (head, rest) = r.split_at(4);
    let (rest, tail) = rest.split_at(size - 8);
    let (body, crc) = rest.split_at(size - 10);

    if u32::from_be_bytes([head[0], head[1], head[2], head[3]]) != tag
        || u32::from_be_bytes([tail[0], tail[1], tail[2], tail[3]]) != tag
    {
        return false;
    }

    let found = u16::from_le_bytes([crc[0], crc[1]]);
    let calculated = compute_crc(0, body);

    found == calculated
}
