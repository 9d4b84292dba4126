//! Gas mixes and tanks configured for a dive.
//!
//! Active slots are always stored first. Enumeration stops at the first
//! inactive slot, so indices `0..len` are all active and no gap exists.

use tinyvec::ArrayVec;

/// The most gas mixes (and tanks) any model records.
pub const MAX_SLOTS: usize = 5;

/// A breathing gas, in whole percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GasMix {
    pub oxygen: u8,
    pub helium: u8,
}

impl GasMix {
    /// The mix assumed for dives in air mode.
    pub const AIR: Self = Self {
        oxygen: 21,
        helium: 0,
    };
}

/// A tank as stored by the device.
///
/// Pressures are in 1/100 bar. Volume and working pressure are in the unit
/// system selected on the device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tank {
    pub volume: u16,
    pub work_pressure: u16,
    pub begin_pressure: u16,
    pub end_pressure: u16,
}

impl Tank {
    /// Full-scale end pressure, reported when no transmitter is paired.
    pub const NO_TRANSMITTER: u16 = 36000;

    /// Whether a transmitter reported for this tank.
    pub fn is_active(&self) -> bool {
        self.begin_pressure != 0
            || (self.end_pressure != 0 && self.end_pressure != Self::NO_TRANSMITTER)
    }
}

pub type GasMixes = ArrayVec<[GasMix; MAX_SLOTS]>;
pub type Tanks = ArrayVec<[Tank; MAX_SLOTS]>;

/// Collect slots up to the first inactive one.
///
/// `slot` returns `None` for an inactive slot; slots after it are never read.
pub fn active_prefix<T: Default, E>(
    max: usize,
    mut slot: impl FnMut(usize) -> Result<Option<T>, E>,
) -> Result<ArrayVec<[T; MAX_SLOTS]>, E> {
    let mut active = ArrayVec::new();

    for i in 0..max.min(MAX_SLOTS) {
        match slot(i)? {
            Some(item) => active.push(item),
            None => break,
        }
    }

    Ok(active)
}
