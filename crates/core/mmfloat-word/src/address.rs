//! Segment base addresses and word indexing.

use std::fmt;

/// Base of the segment words are read from.
pub const READ_BASE: u64 = 0xA000_0000;

/// Base of the segment words are written to.
pub const WRITE_BASE: u64 = 0xA100_0000;

/// Width of one word in bytes.
pub const WORD_SIZE: u64 = 4;

/// One of the two MMIO address ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Segment {
    /// The read-oriented range at [`READ_BASE`].
    #[default]
    Read,
    /// The write-oriented range at [`WRITE_BASE`].
    Write,
}

impl Segment {
    /// Absolute address of the first word in this segment.
    #[must_use]
    pub const fn base(self) -> u64 {
        match self {
            Self::Read => READ_BASE,
            Self::Write => WRITE_BASE,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
        }
    }
}

/// Absolute address of word `index` in `segment`.
///
/// No bounds check is done here; out-of-range indices come back from the
/// helper as the sentinel word or as a helper failure.
#[must_use]
pub fn address(segment: Segment, index: u32) -> u64 {
    segment.base() + WORD_SIZE * u64::from(index)
}

/// Render an address the way the helper expects it: `0x` plus lowercase hex.
#[must_use]
pub fn format_address(address: u64) -> String {
    format!("{address:#x}")
}
