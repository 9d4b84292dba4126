//! Device models and their layout constants.

use thiserror::Error;

/// A model number not belonging to the Icon HD family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Unknown model number ({0:#08x}).")]
pub struct UnknownModel(pub u32);

/// A device model sharing the Icon HD dive-log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Model {
    Smart,
    SmartApnea,
    IconHd,
    IconHdNet,
    Genius,
    QuadAir,
    SmartAir,
}

/// Raw dive mode codes of every model but the Genius.
pub mod icon_mode {
    pub const AIR: u8 = 0;
    pub const GAUGE: u8 = 1;
    pub const NITROX: u8 = 2;
    pub const FREEDIVE: u8 = 3;
}

/// Raw dive mode codes of the Genius.
pub mod genius_mode {
    pub const AIR: u8 = 0;
    pub const NITROX_SINGLE: u8 = 1;
    pub const NITROX_MULTI: u8 = 2;
    pub const TRIMIX: u8 = 3;
    pub const GAUGE: u8 = 4;
    pub const FREEDIVE: u8 = 5;
}

/// Header and sample sizes for a dive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Size of the dive header, including the type and sample count.
    pub header_size: usize,
    /// Size of a single profile record.
    pub sample_size: usize,
}

impl Model {
    /// The identifier assigned to this model by the device family.
    pub const fn number(self) -> u32 {
        match self {
            Self::Smart => 0x000010,
            Self::SmartApnea => 0x010010,
            Self::IconHd => 0x14,
            Self::IconHdNet => 0x15,
            Self::Genius => 0x1C,
            Self::QuadAir => 0x23,
            Self::SmartAir => 0x24,
        }
    }

    /// Header and sample sizes for a dive recorded in the given raw mode.
    ///
    /// Only the Smart narrows its records for freedives.
    pub const fn layout(self, mode: u8) -> Layout {
        let (header_size, sample_size) = match self {
            Self::Smart if mode == icon_mode::FREEDIVE => (0x2E, 6),
            Self::Smart | Self::IconHd => (0x5C, 8),
            Self::SmartApnea => (0x50, 14),
            Self::IconHdNet => (0x80, 12),
            Self::QuadAir | Self::SmartAir => (0x84, 12),
            Self::Genius => (0xB8, 34),
        };

        Layout {
            header_size,
            sample_size,
        }
    }

    /// Number of trailing bytes holding the dive type and sample count,
    /// before the real header size is known.
    ///
    /// The Smart family stores only those two fields at the end of a dive;
    /// the others store the complete header there. Framed dives begin with
    /// their header instead, and have no trailer.
    pub(crate) const fn trailer_size(self) -> Option<usize> {
        match self {
            Self::Smart | Self::SmartAir => Some(4),
            Self::SmartApnea => Some(6),
            Self::IconHd => Some(0x5C),
            Self::IconHdNet => Some(0x80),
            Self::QuadAir => Some(0x84),
            Self::Genius => None,
        }
    }

    /// Whether the header begins directly with its fields, rather than with
    /// the dive type and sample count.
    pub const fn is_smart_family(self) -> bool {
        matches!(self, Self::Smart | Self::SmartApnea | Self::SmartAir)
    }

    /// Whether tank pressure records are interleaved with the profile.
    pub const fn is_air_integrated(self) -> bool {
        matches!(
            self,
            Self::IconHdNet | Self::QuadAir | Self::SmartAir | Self::Genius
        )
    }

    /// Whether every record is wrapped in a checksummed frame.
    pub const fn is_framed(self) -> bool {
        matches!(self, Self::Genius)
    }

    /// Maximum number of gas mixes, and of tanks, a dive can hold.
    pub const fn max_gas_mixes(self) -> usize {
        match self {
            Self::Genius => 5,
            _ => 3,
        }
    }

    /// Offset of the tank block within the header fields, for air-integrated
    /// models without framing.
    pub(crate) const fn tank_offset(self) -> Option<usize> {
        match self {
            Self::IconHdNet => Some(0x58),
            Self::QuadAir | Self::SmartAir => Some(0x5C),
            _ => None,
        }
    }

    /// Size of the tank pressure record following every fourth sample.
    pub(crate) const fn pressure_record_size(self) -> usize {
        match self {
            Self::Genius => 16,
            _ => 8,
        }
    }
}

impl TryFrom<u32> for Model {
    type Error = UnknownModel;

    fn try_from(number: u32) -> Result<Self, Self::Error> {
        Ok(match number {
            0x000010 => Self::Smart,
            0x010010 => Self::SmartApnea,
            0x14 => Self::IconHd,
            0x15 => Self::IconHdNet,
            0x1C => Self::Genius,
            0x23 => Self::QuadAir,
            0x24 => Self::SmartAir,
            _ => Err(UnknownModel(number))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Layout, Model, UnknownModel};

    const ALL: [Model; 7] = [
        Model::Smart,
        Model::SmartApnea,
        Model::IconHd,
        Model::IconHdNet,
        Model::Genius,
        Model::QuadAir,
        Model::SmartAir,
    ];

    #[test]
    fn model_numbers_round_trip() {
        for model in ALL {
            assert_eq!(Model::try_from(model.number()), Ok(model));
        }
        assert_eq!(Model::try_from(0x99), Err(UnknownModel(0x99)));
    }

    #[test]
    fn only_unframed_models_have_a_trailer() {
        for model in ALL {
            assert_eq!(model.trailer_size().is_none(), model.is_framed());
        }
        assert_eq!(Model::SmartApnea.trailer_size(), Some(6));
    }

    #[test]
    fn smart_narrows_for_freedives_only() {
        let narrow = Layout {
            header_size: 0x2E,
            sample_size: 6,
        };
        assert_eq!(Model::Smart.layout(3), narrow);
        assert_ne!(Model::IconHd.layout(3), narrow);
        assert_ne!(Model::SmartAir.layout(3), narrow);
    }
}
