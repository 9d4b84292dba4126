//! Validation of a dive and the header snapshot derived from it.

use tartan_bitfield::bitfield;
use thiserror::Error;
use tinyvec::ArrayVec;
use zerocopy::{
    FromBytes,
    byteorder::little_endian::{U16, U32},
};

use super::{
    OutOfBounds, Warning,
    framing::RecordKind,
    model::{Layout, Model, icon_mode},
    take, u8_at, u16_le, u32_le,
};

pub mod mix;

use mix::{GasMix, GasMixes, MAX_SLOTS, Tank, Tanks, active_prefix};

/// An error validating a dive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    /// Too few bytes to hold a length or object tag.
    #[error("Buffer too small ({size} bytes).")]
    BufferTooSmall { size: usize },
    /// Declared length is larger than the buffer, or cannot hold a header.
    #[error("Declared length ({declared}) exceeds the buffer ({size} bytes) or cannot hold a {header} byte header.")]
    LengthOutOfRange {
        declared: usize,
        header: usize,
        size: usize,
    },
    /// Declared length disagrees with the size implied by the header.
    #[error("Calculated ({calculated}) and declared ({declared}) sizes are not equal.")]
    SizeMismatch { declared: usize, calculated: u64 },
    /// Incorrect object tag at the start of a framed dive.
    #[error("Unsupported object type ({kind}) or version ({major}.{minor}).")]
    UnsupportedObject { kind: u16, major: u8, minor: u8 },
    /// Buffer is smaller than the records the header announces.
    #[error("Dive needs at least {needed} bytes, but the buffer holds {size}.")]
    Truncated { needed: u64, size: usize },
    #[error(transparent)]
    OutOfBounds(#[from] OutOfBounds),
}

/// The arrangement of a dive's header fields and profile records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Checksummed records, with the header at the start of the buffer.
    Framed,
    /// Surface records, each followed by a run of depth readings.
    Apnea,
    /// One summary record per dive.
    Freedive,
    /// Fixed-size records at a regular interval.
    Standard,
}

/// Water type configured on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaterSetting {
    Fresh,
    Salt,
    /// Salt water with the EN 13319 density.
    En13319,
    /// Water density above 1000 kg/m³; zero is fresh water.
    Density(u8),
    /// An unrecognized water type code.
    Unknown(u8),
}

/// A leading object tag, identifying the type and version of what follows.
#[repr(C)]
#[derive(Debug, FromBytes)]
pub(crate) struct ObjectTag {
    kind: U16,
    major: u8,
    minor: u8,
}

impl ObjectTag {
    pub(crate) fn read(r: &[u8], at: usize) -> Result<Self, OutOfBounds> {
        Ok(zerocopy::transmute!(take::<4>(r, at)?))
    }

    pub(crate) fn is(&self, kind: u16, major: u8, minor: u8) -> bool {
        self.kind.get() == kind && self.major == major && self.minor == minor
    }

    pub(crate) fn parts(&self) -> (u16, u8, u8) {
        (self.kind.get(), self.major, self.minor)
    }
}

bitfield! {
    struct Settings(u32) {
        [4] fresh_water,
        [8] metric,
        [10..12] interval: u8,
    }
}

bitfield! {
    struct ApneaSettings(u32) {
        [0..6] density: u8,
        [9..11] sample_rate: u8,
    }
}

bitfield! {
    struct GeniusSettings(u32) {
        [0..4] mode: u8,
        [5..7] water: u8,
    }
}

// Bit 23 flags a mix changed during the dive; it is not decoded.
bitfield! {
    struct GasWord(u32) {
        [0..7] oxygen: u8,
        [7..14] nitrogen: u8,
        [14..21] helium: u8,
        [21..23] state: u8,
    }
}

const GAS_OFF: u8 = 0;

/// Gas mix and tank slot of a Genius header.
#[repr(C)]
#[derive(FromBytes)]
struct GasSlot {
    gas: U32,
    begin_pressure: U16,
    end_pressure: U16,
    volume: U16,
    work_pressure: U16,
    _reserved: [u8; 8],
}

/// Validated header-level values of a dive.
///
/// A snapshot is produced once per buffer by [`DiveHeader::parse`] and never
/// changes afterward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiveHeader {
    model: Model,
    mode: u8,
    length: usize,
    fields: usize,
    layout: Layout,
    samples: usize,
    settings: u32,
    interval: u32,
    sample_rate: u32,
    metric: bool,
    gas_mixes: GasMixes,
    tanks: Tanks,
    warnings: ArrayVec<[Option<Warning>; MAX_SLOTS]>,
}

impl DiveHeader {
    /// Validate a dive recorded by a model and derive its header values.
    pub fn parse(model: Model, r: &[u8]) -> Result<Self, HeaderError> {
        let header = match model.trailer_size() {
            Some(trailer) => Self::parse_standard(model, trailer, r),
            None => Self::parse_framed(r),
        };

        header.inspect_err(|err| log::error!("{err}"))
    }

    fn parse_standard(model: Model, trailer: usize, r: &[u8]) -> Result<Self, HeaderError> {
        let size = r.len();
        if size < 4 {
            Err(HeaderError::BufferTooSmall { size })?;
        }

        let length = u32_le(r, 0)? as usize;
        if length < 4 + trailer || length > size {
            Err(HeaderError::LengthOutOfRange {
                declared: length,
                header: trailer,
                size,
            })?;
        }

        // Nothing past the declared length belongs to the dive.
        let r = &r[..length];

        let at = length - trailer;
        let (kind, samples) = if model.is_smart_family() {
            (u16_le(r, at + 2)?, u16_le(r, at)?)
        } else {
            (u16_le(r, at)?, u16_le(r, at + 2)?)
        };

        let mode = (kind & 0x03) as u8;
        let layout = model.layout(mode);
        if length < 4 + layout.header_size {
            Err(HeaderError::LengthOutOfRange {
                declared: length,
                header: layout.header_size,
                size,
            })?;
        }

        let fields = if model.is_smart_family() {
            length - layout.header_size
        } else {
            length - layout.header_size + 4
        };

        let settings = u16_le(
            r,
            fields
                + match model {
                    Model::SmartApnea => 0x1C,
                    _ if mode == icon_mode::FREEDIVE => 0x08,
                    _ => 0x0C,
                },
        )? as u32;

        let (interval, sample_rate) = if model == Model::SmartApnea {
            (1, 1 << ApneaSettings(settings).sample_rate())
        } else {
            const INTERVALS: [u32; 4] = [1, 5, 10, 20];
            (INTERVALS[Settings(settings).interval() as usize], 1)
        };

        let samples = samples as u64;
        let mut calculated = 4 + layout.header_size as u64 + samples * layout.sample_size as u64;
        if model.is_air_integrated() {
            calculated += (samples / 4) * model.pressure_record_size() as u64;
        } else if model == Model::SmartApnea {
            let dive_time = u32_le(r, fields + 0x24)? as u64;
            calculated += dive_time * sample_rate as u64 * 2;
        }

        if calculated != length as u64 {
            Err(HeaderError::SizeMismatch {
                declared: length,
                calculated,
            })?;
        }

        let gas_mixes = match mode {
            icon_mode::GAUGE | icon_mode::FREEDIVE => GasMixes::new(),
            icon_mode::AIR => [GasMix::AIR].into_iter().collect(),
            _ => active_prefix(model.max_gas_mixes(), |i| -> Result<_, OutOfBounds> {
                let [oxygen, flags] = take::<2>(r, fields + 0x10 + 4 * i)?;

                Ok(if flags & 0x80 != 0 {
                    None
                } else {
                    Some(GasMix { oxygen, helium: 0 })
                })
            })?,
        };

        let tanks = match model.tank_offset() {
            Some(offset) => {
                let at = fields + offset;

                active_prefix(model.max_gas_mixes(), |i| -> Result<_, OutOfBounds> {
                    let tank = Tank {
                        volume: u16_le(r, at + 0x0C + 8 * i)?,
                        work_pressure: u16_le(r, at + 0x0C + 8 * i + 2)?,
                        begin_pressure: u16_le(r, at + 4 * i)?,
                        end_pressure: u16_le(r, at + 4 * i + 2)?,
                    };

                    Ok(tank.is_active().then_some(tank))
                })?
            }
            None => Tanks::new(),
        };

        Ok(Self {
            model,
            mode,
            length,
            fields,
            layout,
            samples: samples as usize,
            settings,
            interval,
            sample_rate,
            metric: Settings(settings).metric(),
            gas_mixes,
            tanks,
            warnings: ArrayVec::new(),
        })
    }

    fn parse_framed(r: &[u8]) -> Result<Self, HeaderError> {
        let size = r.len();
        if size < 4 {
            Err(HeaderError::BufferTooSmall { size })?;
        }

        let tag = ObjectTag::read(r, 0)?;
        if !tag.is(1, 0, 0) {
            let (kind, major, minor) = tag.parts();
            Err(HeaderError::UnsupportedObject { kind, major, minor })?;
        }

        let layout = Model::Genius.layout(0);
        if layout.header_size > size {
            Err(HeaderError::Truncated {
                needed: layout.header_size as u64,
                size,
            })?;
        }

        let samples = u16_le(r, 0x20)? as u64;
        let settings = u32_le(r, 0x0C)?;
        let mode = GeniusSettings(settings).mode();

        // Unlike the other models, trailing bytes are tolerated here.
        let needed = layout.header_size as u64
            + 4
            + RecordKind::Dstr.size() as u64
            + RecordKind::Tiss.size() as u64
            + samples * RecordKind::Dprs.size() as u64
            + (samples / 4) * RecordKind::Airs.size() as u64
            + RecordKind::Dend.size() as u64;
        if needed > size as u64 {
            Err(HeaderError::Truncated { needed, size })?;
        }

        let mut gas_mixes = GasMixes::new();
        let mut tanks = Tanks::new();
        let mut warnings = ArrayVec::new();

        for i in 0..Model::Genius.max_gas_mixes() {
            let slot: GasSlot = zerocopy::transmute!(take::<20>(r, 0x54 + 20 * i)?);

            let gas = GasWord(slot.gas.get());
            let (oxygen, nitrogen, helium) = (gas.oxygen(), gas.nitrogen(), gas.helium());

            if oxygen as u32 + nitrogen as u32 + helium as u32 != 100 {
                let warning = Warning::GasMixSum {
                    slot: i,
                    oxygen,
                    nitrogen,
                    helium,
                };
                log::warn!("{warning}");
                warnings.push(Some(warning));
            }

            // A slot only counts while every slot before it did.
            if gas.state() != GAS_OFF && gas_mixes.len() == i {
                gas_mixes.push(GasMix { oxygen, helium });
            }

            let tank = Tank {
                volume: slot.volume.get(),
                work_pressure: slot.work_pressure.get(),
                begin_pressure: slot.begin_pressure.get(),
                end_pressure: slot.end_pressure.get(),
            };

            if tank.is_active() && tanks.len() == i {
                tanks.push(tank);
            }
        }

        Ok(Self {
            model: Model::Genius,
            mode,
            length: size,
            fields: 0,
            layout,
            samples: samples as usize,
            settings,
            interval: 5,
            sample_rate: 1,
            metric: u8_at(r, 0x34)? != 0,
            gas_mixes,
            tanks,
            warnings,
        })
    }

    /// The model that recorded this dive.
    pub fn model(&self) -> Model {
        self.model
    }

    /// The raw dive mode code.
    pub fn mode(&self) -> u8 {
        self.mode
    }

    /// The arrangement of header fields and profile records.
    pub fn format(&self) -> Format {
        match self.model {
            Model::Genius => Format::Framed,
            Model::SmartApnea => Format::Apnea,
            _ if self.mode == icon_mode::FREEDIVE => Format::Freedive,
            _ => Format::Standard,
        }
    }

    /// Number of bytes belonging to the dive.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Restrict a buffer to the bytes belonging to the dive.
    pub fn extent<'a>(&self, r: &'a [u8]) -> &'a [u8] {
        &r[..self.length.min(r.len())]
    }

    /// Offset of the header fields within the buffer.
    pub fn fields_offset(&self) -> usize {
        self.fields
    }

    pub fn header_size(&self) -> usize {
        self.layout.header_size
    }

    pub fn sample_size(&self) -> usize {
        self.layout.sample_size
    }

    /// Number of logical samples in the profile.
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// The raw settings word.
    pub fn settings(&self) -> u32 {
        self.settings
    }

    /// Seconds between samples.
    pub fn interval(&self) -> u32 {
        self.interval
    }

    /// Readings per second; above one only for apnea dives.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Whether tank volumes and working pressures are stored in metric units.
    pub fn is_metric(&self) -> bool {
        self.metric
    }

    /// The water type configured on the device.
    pub fn water(&self) -> WaterSetting {
        match self.model {
            Model::Genius => match GeniusSettings(self.settings).water() {
                0 => WaterSetting::Salt,
                1 => WaterSetting::Fresh,
                2 => WaterSetting::En13319,
                code => WaterSetting::Unknown(code),
            },
            Model::SmartApnea => WaterSetting::Density(ApneaSettings(self.settings).density()),
            _ if Settings(self.settings).fresh_water() => WaterSetting::Fresh,
            _ => WaterSetting::Salt,
        }
    }

    /// Active gas mixes, in slot order.
    pub fn gas_mixes(&self) -> &[GasMix] {
        &self.gas_mixes
    }

    /// Active tanks, in slot order.
    pub fn tanks(&self) -> &[Tank] {
        &self.tanks
    }

    /// Anomalies found while validating the header.
    pub fn warnings(&self) -> impl Iterator<Item = Warning> + '_ {
        self.warnings.iter().flatten().copied()
    }
}
