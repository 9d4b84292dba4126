//! Owned decoding of a complete dive.
//!
//! _Requires Cargo feature `std`._

extern crate std;

use std::vec::Vec;

use crate::sans::{
    Warning,
    field::{DateTime, DiveMode, Field, FieldKind, Mix, Salinity, TankInfo},
    model::Model,
    sample::{Deco, Event, Pressure, Sample},
};

use super::{Error, FromSamples, Parser};

/// Summary values and profile of a dive.
#[derive(Debug, Clone, PartialEq)]
pub struct Dive {
    pub datetime: DateTime,
    /// Seconds.
    pub dive_time: u32,
    /// Metres.
    pub max_depth: f64,
    /// Bar.
    pub atmospheric: f64,
    pub salinity: Salinity,
    /// Degrees Celsius.
    pub temperature_minimum: f64,
    /// Degrees Celsius.
    pub temperature_maximum: f64,
    pub mode: DiveMode,
    pub gas_mixes: Vec<Mix>,
    pub tanks: Vec<TankInfo>,
    /// Profile events, without warnings.
    pub profile: Vec<Sample>,
    /// Anomalies found in the header and profile.
    pub warnings: Vec<Warning>,
}

#[derive(Default)]
struct Profile {
    samples: Vec<Sample>,
    warnings: Vec<Warning>,
}

impl FromSamples for Profile {
    fn add_time(&mut self, seconds: u32) {
        self.samples.push(Sample::Time(seconds));
    }
    fn add_depth(&mut self, metres: f64) {
        self.samples.push(Sample::Depth(metres));
    }
    fn add_temperature(&mut self, celsius: f64) {
        self.samples.push(Sample::Temperature(celsius));
    }
    fn add_gas_mix(&mut self, index: usize) {
        self.samples.push(Sample::GasMix(index));
    }
    fn add_deco(&mut self, deco: Deco) {
        self.samples.push(Sample::Deco(deco));
    }
    fn add_event(&mut self, event: Event) {
        self.samples.push(Sample::Event(event));
    }
    fn add_pressure(&mut self, pressure: Pressure) {
        self.samples.push(Sample::Pressure(pressure));
    }
    fn add_warning(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }
}

/// Decode every summary value and the whole profile of a dive.
///
/// Fails on the first error, including errors in fields that a partial
/// decode through [`Parser`] could skip.
pub fn decode(model: Model, data: &[u8]) -> Result<Dive, Error> {
    let mut parser = Parser::new(model);
    parser.set_data(data);

    let header = parser.header()?;
    let mut warnings: Vec<_> = header.warnings().collect();
    let (gas_mixes, tanks) = (header.gas_mixes().len(), header.tanks().len());

    macro_rules! field {
        ($kind:expr, $variant:ident) => {
            match parser.field($kind)? {
                Field::$variant(value) => value,
                _ => unreachable!(),
            }
        };
    }

    let dive_time = field!(FieldKind::DiveTime, DiveTime);
    let max_depth = field!(FieldKind::MaxDepth, MaxDepth);
    let atmospheric = field!(FieldKind::Atmospheric, Atmospheric);
    let salinity = field!(FieldKind::Salinity, Salinity);
    let temperature_minimum = field!(FieldKind::TemperatureMinimum, TemperatureMinimum);
    let temperature_maximum = field!(FieldKind::TemperatureMaximum, TemperatureMaximum);
    let mode = field!(FieldKind::DiveMode, DiveMode);

    let gas_mixes: Vec<Mix> = (0..gas_mixes)
        .map(|i| -> Result<_, Error> { Ok(field!(FieldKind::GasMix(i), GasMix)) })
        .collect::<Result<_, _>>()?;
    let tanks: Vec<TankInfo> = (0..tanks)
        .map(|i| -> Result<_, Error> { Ok(field!(FieldKind::Tank(i), Tank)) })
        .collect::<Result<_, _>>()?;

    let mut profile = Profile::default();
    parser.samples_foreach(&mut profile)?;
    warnings.append(&mut profile.warnings);

    Ok(Dive {
        datetime: parser.datetime()?,
        dive_time,
        max_depth,
        atmospheric,
        salinity,
        temperature_minimum,
        temperature_maximum,
        mode,
        gas_mixes,
        tanks,
        profile: profile.samples,
        warnings,
    })
}
