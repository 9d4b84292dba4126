//! Summary values of a dive.
//!
//! Every lookup reads from the header fields located by a validated
//! [`DiveHeader`]. Offsets depend on the dive's [`Format`].

use tartan_bitfield::bitfield;
use thiserror::Error;

use super::{
    OutOfBounds,
    header::{DiveHeader, Format, WaterSetting, mix::Tank},
    model::{genius_mode, icon_mode},
    u16_le, u32_le,
};

const CUFT: f64 = 0.0283168466;
const PSI: f64 = 6894.75729;
const BAR: f64 = 100000.0;
const ATM: f64 = 101325.0;
const MSW: f64 = 10000.0;
const GRAVITY: f64 = 9.80665;

/// An error looking up a field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// No model records this field.
    #[error("Field {0:?} is not recorded.")]
    Unsupported(FieldKind),
    /// A gas mix or tank index past the active slots.
    #[error("Index {index} out of range for {count} active slots.")]
    IndexOutOfRange { index: usize, count: usize },
    #[error("Unrecognized water type ({0}).")]
    UnknownWater(u8),
    #[error("Unrecognized dive mode ({0}).")]
    UnknownMode(u8),
    /// Imperial tank volumes cannot be converted without a working pressure.
    #[error("Tank {0} has no working pressure.")]
    ZeroWorkPressure(usize),
    #[error(transparent)]
    OutOfBounds(#[from] OutOfBounds),
}

/// A summary value that can be requested from a dive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    DiveTime,
    MaxDepth,
    AvgDepth,
    GasMixCount,
    GasMix(usize),
    TankCount,
    Tank(usize),
    Atmospheric,
    Salinity,
    TemperatureSurface,
    TemperatureMinimum,
    TemperatureMaximum,
    DiveMode,
}

/// A decoded summary value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field {
    /// Seconds.
    DiveTime(u32),
    /// Metres.
    MaxDepth(f64),
    GasMixCount(usize),
    GasMix(Mix),
    TankCount(usize),
    Tank(TankInfo),
    /// Bar.
    Atmospheric(f64),
    Salinity(Salinity),
    /// Degrees Celsius.
    TemperatureMinimum(f64),
    /// Degrees Celsius.
    TemperatureMaximum(f64),
    DiveMode(DiveMode),
}

/// Gas fractions, each between 0 and 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mix {
    pub oxygen: f64,
    pub helium: f64,
    pub nitrogen: f64,
}

/// Unit system a tank volume was configured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TankVolume {
    Metric,
    Imperial,
}

/// A tank, in metric units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TankInfo {
    pub volume_type: TankVolume,
    /// Litres.
    pub volume: f64,
    /// Bar.
    pub work_pressure: f64,
    /// Bar.
    pub begin_pressure: f64,
    /// Bar.
    pub end_pressure: f64,
    /// Index of the gas mix breathed from this tank.
    pub gas_mix: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Water {
    Fresh,
    Salt,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Salinity {
    pub water: Water,
    /// kg/m³, or zero when not recorded.
    pub density: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiveMode {
    OpenCircuit,
    Gauge,
    Freedive,
}

/// Local start time of a dive. No time zone is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTime {
    pub year: u32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

bitfield! {
    struct Timestamp(u32) {
        [0..5] hour: u8,
        [5..11] minute: u8,
        [11..16] day: u8,
        [16..20] month: u8,
        [20..32] year: u16,
    }
}

/// Offsets of the fields stored at a fixed place for each format.
struct Offsets {
    datetime: usize,
    max_depth: usize,
    atmospheric: usize,
    min_temperature: usize,
    max_temperature: usize,
}

impl Offsets {
    const fn of(format: Format) -> Self {
        let (datetime, max_depth, atmospheric, min_temperature, max_temperature) = match format {
            Format::Framed => (0x08, 0x22, 0x3E, 0x28, 0x26),
            Format::Apnea => (0x40, 0x3A, 0x38, 0x3E, 0x3C),
            Format::Freedive => (0x20, 0x1A, 0x18, 0x1C, 0x1E),
            Format::Standard => (0x02, 0x00, 0x22, 0x42, 0x44),
        };

        Self {
            datetime,
            max_depth,
            atmospheric,
            min_temperature,
            max_temperature,
        }
    }
}

/// Read the start time of a dive.
pub fn datetime(header: &DiveHeader, r: &[u8]) -> Result<DateTime, OutOfBounds> {
    let r = header.extent(r);
    let at = header.fields_offset() + Offsets::of(header.format()).datetime;

    if header.format() == Format::Framed {
        let timestamp = Timestamp(u32_le(r, at)?);

        return Ok(DateTime {
            year: timestamp.year() as u32,
            month: timestamp.month() as u32,
            day: timestamp.day() as u32,
            hour: timestamp.hour() as u32,
            minute: timestamp.minute() as u32,
            second: 0,
        });
    }

    let word = |i: usize| u16_le(r, at + 2 * i).map(u32::from);

    Ok(DateTime {
        hour: word(0)?,
        minute: word(1)?,
        second: 0,
        day: word(2)?,
        month: word(3)? + 1,
        year: word(4)? + 1900,
    })
}

/// Read a summary value of a dive.
pub fn read(header: &DiveHeader, r: &[u8], kind: FieldKind) -> Result<Field, FieldError> {
    let r = header.extent(r);
    let fields = header.fields_offset();
    let format = header.format();
    let offsets = Offsets::of(format);

    let decimal = |at: usize, scale: f64| -> Result<f64, OutOfBounds> {
        Ok(u16_le(r, fields + at)? as f64 / scale)
    };
    let signed = |at: usize| -> Result<f64, OutOfBounds> {
        Ok(u16_le(r, fields + at)? as i16 as f64 / 10.0)
    };

    Ok(match kind {
        FieldKind::DiveTime => Field::DiveTime(match format {
            Format::Apnea => u16_le(r, fields + 0x24)? as u32,
            Format::Freedive => (0..header.samples()).try_fold(0u32, |total, i| {
                let at = 4 + i * header.sample_size() + 2;
                Ok::<_, OutOfBounds>(total.saturating_add(u16_le(r, at)? as u32))
            })?,
            Format::Framed | Format::Standard => {
                (header.samples() as u32).saturating_mul(header.interval())
            }
        }),
        FieldKind::MaxDepth => Field::MaxDepth(decimal(offsets.max_depth, 10.0)?),
        FieldKind::GasMixCount => Field::GasMixCount(header.gas_mixes().len()),
        FieldKind::GasMix(i) => {
            let mixes = header.gas_mixes();
            let mix = mixes.get(i).ok_or(FieldError::IndexOutOfRange {
                index: i,
                count: mixes.len(),
            })?;

            let oxygen = mix.oxygen as f64 / 100.0;
            let helium = mix.helium as f64 / 100.0;

            Field::GasMix(Mix {
                oxygen,
                helium,
                nitrogen: 1.0 - oxygen - helium,
            })
        }
        FieldKind::TankCount => Field::TankCount(header.tanks().len()),
        FieldKind::Tank(i) => {
            let tanks = header.tanks();
            let tank = tanks.get(i).ok_or(FieldError::IndexOutOfRange {
                index: i,
                count: tanks.len(),
            })?;

            Field::Tank(tank_info(header, i, tank)?)
        }
        FieldKind::Atmospheric => Field::Atmospheric(match format {
            Format::Standard => decimal(offsets.atmospheric, 8000.0)?,
            _ => decimal(offsets.atmospheric, 1000.0)?,
        }),
        FieldKind::Salinity => Field::Salinity(match header.water() {
            WaterSetting::Fresh => Salinity {
                water: Water::Fresh,
                density: 0.0,
            },
            WaterSetting::Salt => Salinity {
                water: Water::Salt,
                density: 0.0,
            },
            WaterSetting::En13319 => Salinity {
                water: Water::Salt,
                density: MSW / GRAVITY,
            },
            WaterSetting::Density(s) => Salinity {
                water: if s == 0 { Water::Fresh } else { Water::Salt },
                density: 1000.0 + s as f64,
            },
            WaterSetting::Unknown(code) => Err(FieldError::UnknownWater(code))?,
        }),
        FieldKind::TemperatureMinimum => Field::TemperatureMinimum(signed(offsets.min_temperature)?),
        FieldKind::TemperatureMaximum => Field::TemperatureMaximum(signed(offsets.max_temperature)?),
        FieldKind::DiveMode => Field::DiveMode(dive_mode(header)?),
        FieldKind::AvgDepth | FieldKind::TemperatureSurface => Err(FieldError::Unsupported(kind))?,
    })
}

fn tank_info(header: &DiveHeader, i: usize, tank: &Tank) -> Result<TankInfo, FieldError> {
    let (volume_type, volume, work_pressure) = if header.is_metric() {
        (
            TankVolume::Metric,
            tank.volume as f64,
            tank.work_pressure as f64,
        )
    } else {
        if tank.work_pressure == 0 {
            Err(FieldError::ZeroWorkPressure(i))?;
        }

        let work = tank.work_pressure as f64;
        (
            TankVolume::Imperial,
            tank.volume as f64 * CUFT * 1000.0 / (work * PSI / ATM),
            work * PSI / BAR,
        )
    };

    Ok(TankInfo {
        volume_type,
        volume,
        work_pressure,
        begin_pressure: tank.begin_pressure as f64 / 100.0,
        end_pressure: tank.end_pressure as f64 / 100.0,
        gas_mix: (i < header.gas_mixes().len()).then_some(i),
    })
}

fn dive_mode(header: &DiveHeader) -> Result<DiveMode, FieldError> {
    let mode = header.mode();

    Ok(if header.format() == Format::Framed {
        match mode {
            genius_mode::AIR
            | genius_mode::NITROX_SINGLE
            | genius_mode::NITROX_MULTI
            | genius_mode::TRIMIX => DiveMode::OpenCircuit,
            genius_mode::GAUGE => DiveMode::Gauge,
            genius_mode::FREEDIVE => DiveMode::Freedive,
            _ => Err(FieldError::UnknownMode(mode))?,
        }
    } else {
        match mode {
            icon_mode::AIR | icon_mode::NITROX => DiveMode::OpenCircuit,
            icon_mode::GAUGE => DiveMode::Gauge,
            icon_mode::FREEDIVE => DiveMode::Freedive,
            _ => Err(FieldError::UnknownMode(mode))?,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::Timestamp;

    #[test]
    fn timestamp_bits() {
        // 2021-07-14 09:41
        let word = 9 | (41 << 5) | (14 << 11) | (7 << 16) | (2021 << 20);
        let timestamp = Timestamp(word);
        assert_eq!(timestamp.hour(), 9);
        assert_eq!(timestamp.minute(), 41);
        assert_eq!(timestamp.day(), 14);
        assert_eq!(timestamp.month(), 7);
        assert_eq!(timestamp.year(), 2021);
    }
}
