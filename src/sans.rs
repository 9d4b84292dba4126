//! Allocation-free building blocks for implementing decoders.
//!
//! This module is intended for applications that need fine control over
//! decoder internals, such as walking the profile lazily or inspecting the
//! validated header directly. See [`crate::avec`] for a session type covering
//! common decoding patterns.
//!
//! # Architecture
//!
//! Decoding a dive is split into a single validation pass and any number of
//! read-only queries against its result:
//!
//! - [`model`] resolves a device model to its layout constants.
//!
//! - [`header::DiveHeader::parse`] validates the buffer and produces an
//! immutable snapshot of every header-level value (dive mode, sample count,
//! settings, gas mixes, tanks). No other part of the buffer is trusted until
//! this succeeds.
//!
//! - [`sample::Samples`] walks the profile as an iterator of sample events.
//! Dropping the iterator is the only way to stop early.
//!
//! - [`field::read`] and [`field::datetime`] look up summary values.
//!
//! The Genius wraps every profile record in a checksummed frame, validated by
//! [`framing`] with the help of [`check`].
//!
//! All reads go through bounds-checked helpers, so malformed input produces an
//! error rather than a panic.

use core::fmt;

use thiserror::Error;

pub mod check;
pub mod field;
pub mod framing;
pub mod header;
pub mod model;
pub mod sample;

/// A read past the end of the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Read of {len} bytes at offset {offset} exceeds the buffer ({size} bytes).")]
pub struct OutOfBounds {
    pub offset: usize,
    pub len: usize,
    pub size: usize,
}

/// A non-fatal anomaly found while decoding.
///
/// Warnings are logged and reported alongside decoded values, but never
/// alter them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Warning {
    /// A gas mix whose oxygen, nitrogen and helium do not add up to 100%.
    GasMixSum {
        slot: usize,
        oxygen: u8,
        nitrogen: u8,
        helium: u8,
    },
    /// The profile holds several readings per second; all but the first of
    /// each second are dropped.
    SubSecondSamples { rate: u32 },
    /// A pressure reading for a gas mix with no matching tank.
    InactiveTankPressure { tank: usize, pressure: u16 },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GasMixSum {
                slot,
                oxygen,
                nitrogen,
                helium,
            } => write!(
                f,
                "Invalid gas mix {slot} ({helium}% He, {oxygen}% O2, {nitrogen}% N2)."
            ),
            Self::SubSecondSamples { rate } => write!(
                f,
                "Multiple samples per second ({rate}) are not supported."
            ),
            Self::InactiveTankPressure { tank, pressure } => {
                write!(f, "Invalid tank {tank} with non-zero pressure ({pressure}).")
            }
        }
    }
}

/// Take an exact number of bytes from an offset in a slice.
pub(crate) fn take<const N: usize>(r: &[u8], at: usize) -> Result<[u8; N], OutOfBounds> {
    r.get(at..)
        .and_then(|r| r.first_chunk::<N>())
        .copied()
        .ok_or(OutOfBounds {
            offset: at,
            len: N,
            size: r.len(),
        })
}

pub(crate) fn u8_at(r: &[u8], at: usize) -> Result<u8, OutOfBounds> {
    take::<1>(r, at).map(|[b]| b)
}

pub(crate) fn u16_le(r: &[u8], at: usize) -> Result<u16, OutOfBounds> {
    take(r, at).map(u16::from_le_bytes)
}

pub(crate) fn u32_le(r: &[u8], at: usize) -> Result<u32, OutOfBounds> {
    take(r, at).map(u32::from_le_bytes)
}
