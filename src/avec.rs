//! Convenience interfaces for common decoding patterns.
//!
//! A [`Parser`] holds a dive buffer for one model, validating it on first use
//! and answering field, date and profile queries from the result. Profiles are
//! published to the [`FromSamples`] trait, which can be derived for structs
//! collecting samples of a known kind. See the [`FromSamples`](macro@FromSamples)
//! macro for details.

use crate::sans::{
    Warning,
    sample::{Deco, Event, Pressure, Sample},
};

#[cfg(feature = "std")]
pub mod dive;
pub mod parser;

#[cfg(feature = "std")]
pub use dive::{Dive, decode};
pub use parser::{Error, ErrorKind, Parser};

/// Derive [`FromSamples`] for a struct collecting profile samples.
///
/// _Requires Cargo feature `derive`._
///
/// # Examples
///
/// Add the `sample(kind)` attribute to a struct field, where `kind` is one of
/// `time`, `depth`, `temperature`, `gas_mix`, `deco`, `event`, `pressure` or
/// `warning`. A `Vec<T>` field receives every value of that kind, while an
/// `Option<T>` field keeps the last. Several fields may receive the same kind.
///
/// ```
/// #[derive(Debug, Default, FromSamples)]
/// struct Profile {
///     #[sample(time)]
///     times: Vec<u32>,
///     #[sample(depth)]
///     depths: Vec<f64>,
///     #[sample(depth)]
///     last_depth: Option<f64>,
///     #[sample(event)]
///     events: Vec<Event>,
/// }
/// ```
///
/// To fold values into a field of any other type, supply an accumulator
/// closure receiving the field and the value.
///
/// ```
/// #[derive(Debug, Default, FromSamples)]
/// struct Extremes {
///     #[sample(depth, |max, v| *max = f64::max(*max, v))]
///     max_depth: f64,
///     #[sample(time, |n, _| *n += 1)]
///     intervals: usize,
/// }
/// ```
#[cfg(feature = "derive")]
pub use regulator_derive::FromSamples;

/// Receive the samples of a dive profile.
///
/// Samples arrive in profile order. Every group of samples recorded at the
/// same moment begins with a call to [`add_time`](FromSamples::add_time).
///
/// The default implementation of each method ignores received values.
///
/// See the [`FromSamples`](macro@FromSamples) derive macro for an automatic
/// implementation of this trait.
#[allow(unused_variables)]
pub trait FromSamples {
    /// Add the seconds elapsed since the start of the dive.
    fn add_time(&mut self, seconds: u32) {}
    /// Add a depth in metres.
    fn add_depth(&mut self, metres: f64) {}
    /// Add a water temperature in degrees Celsius.
    fn add_temperature(&mut self, celsius: f64) {}
    /// Add the index of the gas mix now breathed.
    fn add_gas_mix(&mut self, index: usize) {}
    /// Add the decompression status.
    fn add_deco(&mut self, deco: Deco) {}
    /// Add an alarm event.
    fn add_event(&mut self, event: Event) {}
    /// Add a tank pressure reading.
    fn add_pressure(&mut self, pressure: Pressure) {}
    /// Add a non-fatal anomaly found while walking the profile.
    fn add_warning(&mut self, warning: Warning) {}
}

/// Publish a sample to the receiver method for its kind.
pub(crate) fn publish(o: &mut (impl FromSamples + ?Sized), sample: Sample) {
    match sample {
        Sample::Time(seconds) => o.add_time(seconds),
        Sample::Depth(metres) => o.add_depth(metres),
        Sample::Temperature(celsius) => o.add_temperature(celsius),
        Sample::GasMix(index) => o.add_gas_mix(index),
        Sample::Deco(deco) => o.add_deco(deco),
        Sample::Event(event) => o.add_event(event),
        Sample::Pressure(pressure) => o.add_pressure(pressure),
        Sample::Warning(warning) => o.add_warning(warning),
    }
}
