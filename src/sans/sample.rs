//! Walking the profile of a dive.
//!
//! [`Samples`] decodes one profile record at a time and yields its events in
//! order. Every event of a record is checked before the first is yielded, so a
//! record failing validation produces nothing. Events of earlier records are
//! never withheld.
//!
//! Warnings are yielded in-band as [`Sample::Warning`], at the point of the
//! profile that raised them.

use core::{iter::FusedIterator, mem};

use either::Either::{self, Left, Right};
use tartan_bitfield::bitfield;
use thiserror::Error;
use tinyvec::ArrayVec;
use zerocopy::{
    FromBytes, TryFromBytes,
    byteorder::little_endian::{U16, U32},
};

use super::{
    OutOfBounds, Warning,
    framing::RecordKind,
    header::{DiveHeader, Format, ObjectTag},
    take, u16_le,
};

/// An error walking the profile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SampleError {
    /// Incorrect object tag at the start of a framed profile.
    #[error("Unsupported profile type ({kind}) or version ({major}.{minor}).")]
    UnsupportedProfile { kind: u16, major: u8, minor: u8 },
    /// A framed record with a bad tag or checksum.
    #[error("Invalid {kind} record at offset {offset}.")]
    InvalidRecord { kind: RecordKind, offset: usize },
    /// A record referring to a gas mix the header does not define.
    #[error("Invalid gas mix index ({index}) for {count} gas mixes.")]
    GasMixIndex { index: usize, count: usize },
    #[error(transparent)]
    OutOfBounds(#[from] OutOfBounds),
}

/// A single profile event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample {
    /// Seconds since the start of the dive. Begins every group of events.
    Time(u32),
    /// Depth in metres.
    Depth(f64),
    /// Water temperature in degrees Celsius.
    Temperature(f64),
    /// Index of the gas mix switched to.
    GasMix(usize),
    Deco(Deco),
    Event(Event),
    Pressure(Pressure),
    /// A non-fatal anomaly, also logged.
    Warning(Warning),
}

/// Decompression status.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Deco {
    pub kind: DecoKind,
    /// Stop depth in metres; zero within the no-decompression limit.
    pub depth: f64,
    /// Seconds remaining.
    pub time: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoKind {
    /// Within the no-decompression limit.
    Ndl,
    DecoStop,
}

/// A coarse alarm category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Ascent,
    Ceiling,
}

/// Tank pressure reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pressure {
    pub tank: usize,
    pub bar: f64,
}

/// Alarms recorded by the Genius, numbered by their bit in the alarm mask.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromBytes)]
pub enum Alarm {
    NoAlarm = 0,
    SlowDown = 1,
    FastAscent = 2,
    UncontrolledAscent = 3,
    ModReached = 4,
    CnsDanger = 5,
    CnsExtreme = 6,
    MissedDeco = 7,
    DiveViolationDeco = 8,
    LowBattery = 9,
    VeryLowBattery = 10,
    ProbeLowBattery = 11,
    LowTankPressure = 12,
    TankReserveReached = 13,
    TankLostLink = 14,
    MaxDiveDepth = 15,
    RunAwayDeco = 16,
    TankHalfReached = 17,
    NoDeco2Min = 18,
    NoDecoDeco = 19,
    MultigasATankIsLow = 20,
    DiveTimeHalfTime = 21,
    DiveTimeFullTime = 22,
    GasSwitchpoint = 23,
    GasIgnored = 24,
    GasChanged = 25,
    GasNotChanged = 26,
    GasAdded = 27,
}

impl Alarm {
    /// The alarm signalled by a bit of the alarm mask, if any.
    pub fn from_bit(bit: u8) -> Option<Self> {
        let alarm: Result<Self, _> = zerocopy::try_transmute!(bit);
        alarm.ok()
    }

    /// The alarms set in a mask, lowest bit first.
    pub fn from_mask(mask: u32) -> impl Iterator<Item = Self> {
        (0..32u8)
            .filter(move |&bit| mask & (1 << bit) != 0)
            .filter_map(Self::from_bit)
    }

    /// The event category reported for this alarm.
    pub fn event(self) -> Option<Event> {
        match self {
            Self::FastAscent | Self::UncontrolledAscent => Some(Event::Ascent),
            Self::MissedDeco | Self::DiveViolationDeco => Some(Event::Ceiling),
            _ => None,
        }
    }
}

/// Leading fields of an interval record of every model but the Genius.
#[repr(C)]
#[derive(FromBytes)]
struct Reading {
    depth: U16,
    thermal: U16,
}

bitfield! {
    struct Thermal(u16) {
        [0..12] temperature: u16,
        [12..16] gas_mix: u8,
    }
}

/// Leading fields of an apnea surface record or a freedive record.
#[repr(C)]
#[derive(FromBytes)]
struct Summary {
    max_depth: U16,
    dive_time: U16,
    surface_time: U16,
}

/// Body of a Genius profile record.
#[repr(C)]
#[derive(FromBytes)]
struct ProfileBody {
    depth: U16,
    _reserved0: [u8; 2],
    temperature: U16,
    _reserved1: [u8; 4],
    deco_time: U16,
    alarms: U32,
    _reserved2: [u8; 4],
    misc: U32,
}

bitfield! {
    struct Misc(u32) {
        [6..10] gas_mix: u8,
        [18] deco_stop,
        [19..26] deco_depth: u8,
    }
}

/// Most events a single record can produce: time, depth, temperature, gas
/// mix, deco, four alarm events and a tank pressure or its warning.
const MAX_EVENTS: usize = 10;

#[derive(Debug)]
enum Stage {
    Start,
    Profile,
    Failed(SampleError),
    Done,
}

/// Iterator over the events of a dive profile.
///
/// Yields an error at most once, after which it is exhausted. Dropping the
/// iterator stops the walk.
#[derive(Debug)]
pub struct Samples<'a> {
    header: &'a DiveHeader,
    r: &'a [u8],
    stage: Stage,
    offset: usize,
    time: u32,
    count: usize,
    /// Apnea depth readings left after the current surface record.
    readings: usize,
    gas_mix: Option<usize>,
    queue: ArrayVec<[Option<Sample>; MAX_EVENTS]>,
    head: usize,
}

impl<'a> Samples<'a> {
    /// Walk the profile of a dive validated as `header`.
    pub fn new(header: &'a DiveHeader, r: &'a [u8]) -> Self {
        Self {
            header,
            r: header.extent(r),
            stage: Stage::Start,
            offset: 0,
            time: 0,
            count: 0,
            readings: 0,
            gas_mix: None,
            queue: ArrayVec::new(),
            head: 0,
        }
    }

    fn warn(&mut self, warning: Warning) {
        log::warn!("{warning}");
        self.push(Sample::Warning(warning));
    }

    fn push(&mut self, sample: Sample) {
        self.queue.push(Some(sample));
    }

    fn advance(&mut self, seconds: u32) {
        self.time = self.time.saturating_add(seconds);
        self.push(Sample::Time(self.time));
    }

    fn check(&self, kind: RecordKind) -> Result<&'a [u8], SampleError> {
        kind.body(self.r, self.offset)
            .ok_or(SampleError::InvalidRecord {
                kind,
                offset: self.offset,
            })
    }

    fn start(&mut self) -> Result<(), SampleError> {
        let rate = self.header.sample_rate();
        if rate > 1 {
            self.warn(Warning::SubSecondSamples { rate });
        }

        if self.header.format() != Format::Framed {
            self.offset = 4;
            return Ok(());
        }

        let at = self.header.header_size();
        let tag = ObjectTag::read(self.r, at)?;
        if !tag.is(0, 2, 0) {
            let (kind, major, minor) = tag.parts();
            Err(SampleError::UnsupportedProfile { kind, major, minor })?;
        }

        self.offset = at + 4;
        for kind in [RecordKind::Dstr, RecordKind::Tiss] {
            self.check(kind)?;
            self.offset += kind.size();
        }

        Ok(())
    }

    /// Decode the next record into the queue. Returns `false` once the
    /// profile is exhausted.
    fn refill(&mut self) -> Result<bool, SampleError> {
        self.queue.clear();
        self.head = 0;

        if self.readings > 0 {
            self.apnea_reading()?;
        } else if self.count < self.header.samples() {
            match self.header.format() {
                Format::Apnea => self.apnea_surface()?,
                Format::Freedive => self.freedive()?,
                Format::Standard | Format::Framed => self.interval()?,
            }
        } else {
            if self.header.format() == Format::Framed {
                self.check(RecordKind::Dend)?;
            }
            return Ok(false);
        }

        Ok(true)
    }

    fn apnea_surface(&mut self) -> Result<(), SampleError> {
        let summary: Summary = zerocopy::transmute!(take::<6>(self.r, self.offset)?);

        self.advance(summary.surface_time.get() as u32);
        self.push(Sample::Depth(0.0));

        self.offset += self.header.sample_size();
        self.count += 1;
        self.readings = summary.dive_time.get() as usize;

        Ok(())
    }

    fn apnea_reading(&mut self) -> Result<(), SampleError> {
        let depth = u16_le(self.r, self.offset)?;

        self.advance(self.header.interval());
        self.push(Sample::Depth(depth as f64 / 10.0));

        // Only the first reading of each second is kept.
        self.offset += 2 * self.header.sample_rate() as usize;
        self.readings -= 1;

        Ok(())
    }

    fn freedive(&mut self) -> Result<(), SampleError> {
        let summary: Summary = zerocopy::transmute!(take::<6>(self.r, self.offset)?);

        self.advance(summary.surface_time.get() as u32);
        self.push(Sample::Depth(0.0));

        self.advance(summary.dive_time.get() as u32);
        self.push(Sample::Depth(summary.max_depth.get() as f64 / 10.0));

        self.offset += self.header.sample_size();
        self.count += 1;

        Ok(())
    }

    fn interval(&mut self) -> Result<(), SampleError> {
        let framed = self.header.format() == Format::Framed;

        let (depth, temperature, gas_mix, status) = if framed {
            let body = self.check(RecordKind::Dprs)?;
            let body: ProfileBody = zerocopy::transmute!(take::<24>(body, 0)?);

            let misc = Misc(body.misc.get());
            let time = body.deco_time.get() as u32 * 60;
            let deco = if misc.deco_stop() {
                Deco {
                    kind: DecoKind::DecoStop,
                    depth: misc.deco_depth() as f64,
                    time,
                }
            } else {
                Deco {
                    kind: DecoKind::Ndl,
                    depth: 0.0,
                    time,
                }
            };

            (
                body.depth.get(),
                body.temperature.get(),
                misc.gas_mix() as usize,
                Some((deco, body.alarms.get())),
            )
        } else {
            let reading: Reading = zerocopy::transmute!(take::<4>(self.r, self.offset)?);
            let thermal = Thermal(reading.thermal.get());

            (
                reading.depth.get(),
                thermal.temperature(),
                thermal.gas_mix() as usize,
                None,
            )
        };

        let count = self.header.gas_mixes().len();
        if count > 0 && gas_mix >= count {
            Err(SampleError::GasMixIndex {
                index: gas_mix,
                count,
            })?;
        }

        self.advance(self.header.interval());
        self.push(Sample::Depth(depth as f64 / 10.0));
        self.push(Sample::Temperature(temperature as f64 / 10.0));

        if count > 0 && self.gas_mix != Some(gas_mix) {
            self.push(Sample::GasMix(gas_mix));
            self.gas_mix = Some(gas_mix);
        }

        if let Some((deco, alarms)) = status {
            self.push(Sample::Deco(deco));

            for event in Alarm::from_mask(alarms).filter_map(Alarm::event) {
                self.push(Sample::Event(event));
            }
        }

        self.offset += self.header.sample_size();
        self.count += 1;

        if self.header.model().is_air_integrated() && self.count % 4 == 0 {
            let pressure = if framed {
                u16_le(self.check(RecordKind::Airs)?, 0)?
            } else {
                u16_le(self.r, self.offset)?
            };

            match attribute_pressure(gas_mix, self.header.tanks().len(), pressure) {
                Some(Left(pressure)) => self.push(Sample::Pressure(pressure)),
                Some(Right(warning)) => self.warn(warning),
                None => {}
            }

            self.offset += self.header.model().pressure_record_size();
        }

        Ok(())
    }
}

/// Attribute a pressure reading to the tank matching the current gas mix.
fn attribute_pressure(tank: usize, tanks: usize, pressure: u16) -> Option<Either<Pressure, Warning>> {
    if tank < tanks {
        Some(Left(Pressure {
            tank,
            bar: pressure as f64 / 100.0,
        }))
    } else if pressure != 0 {
        Some(Right(Warning::InactiveTankPressure { tank, pressure }))
    } else {
        None
    }
}

impl Iterator for Samples<'_> {
    type Item = Result<Sample, SampleError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(sample) = self.queue.get_mut(self.head).and_then(Option::take) {
                self.head += 1;
                return Some(Ok(sample));
            }

            self.stage = match mem::replace(&mut self.stage, Stage::Done) {
                Stage::Start => match self.start() {
                    Ok(()) => Stage::Profile,
                    Err(err) => Stage::Failed(err),
                },
                Stage::Profile => match self.refill() {
                    Ok(true) => Stage::Profile,
                    Ok(false) => Stage::Done,
                    Err(err) => Stage::Failed(err),
                },
                Stage::Failed(err) => {
                    log::error!("{err}");
                    return Some(Err(err));
                }
                Stage::Done => return None,
            };
        }
    }
}

impl FusedIterator for Samples<'_> {}
