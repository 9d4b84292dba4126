#![allow(dead_code, unused)]
#![cfg(all(feature = "derive", feature = "std"))]

use regulator::{
    avec::{FromSamples, Parser},
    sans::{
        Warning,
        model::Model,
        sample::{Deco, DecoKind, Event, Pressure},
    },
};
use tinyvec::ArrayVec;

#[derive(Debug, Default, FromSamples)]
struct Profile {
    #[sample(time)]
    times: Vec<u32>,
    #[sample(depth)]
    depths: Vec<f64>,
    #[sample(depth)]
    last_depth: Option<f64>,
    #[sample(gas_mix)]
    gas_mix: Option<usize>,
    #[sample(deco)]
    deco: Vec<Deco>,
    #[sample(event)]
    events: Vec<Event>,
    #[sample(pressure)]
    pressures: Vec<Pressure>,
    #[sample(warning)]
    warnings: Vec<Warning>,
}

#[derive(Debug, Default, FromSamples)]
struct Extremes {
    #[sample(depth, |max, v| *max = f64::max(*max, v))]
    max_depth: f64,
    #[sample(temperature, |min: &mut Option<f64>, v| *min = Some(min.map_or(v, |m| m.min(v))))]
    min_temperature: Option<f64>,
    #[sample(time, |n, _| *n += 1)]
    intervals: usize,
    #[sample(event, |v, e| { let _ = v.try_push(Some(e)); })]
    first_events: ArrayVec<[Option<Event>; 2]>,
    ignored: u8,
}

impl Extremes {
    fn events(&self) -> impl Iterator<Item = Event> + '_ {
        self.first_events.iter().flatten().copied()
    }
}

#[test]
fn collects_the_genius_fixture() {
    let data = std::fs::read("fixtures/genius-trimix.bin").unwrap();

    let mut parser = Parser::new(Model::Genius);
    parser.set_data(&data);

    let mut profile = Profile::default();
    parser.samples_foreach(&mut profile).unwrap();

    assert_eq!(profile.times.len(), 10);
    assert_eq!(profile.times.last(), Some(&50));
    assert_eq!(profile.depths.len(), 10);
    assert_eq!(profile.last_depth, Some(2.0));
    assert_eq!(profile.gas_mix, Some(1));
    assert_eq!(
        profile.deco[4],
        Deco {
            kind: DecoKind::DecoStop,
            depth: 9.0,
            time: 120
        }
    );
    assert_eq!(
        profile.events,
        [Event::Ceiling, Event::Ascent, Event::Ascent, Event::Ceiling]
    );
    assert_eq!(
        profile.pressures,
        [
            Pressure {
                tank: 0,
                bar: 198.0
            },
            Pressure {
                tank: 1,
                bar: 176.5
            }
        ]
    );
    assert!(profile.warnings.is_empty());
}

#[test]
fn accumulates_with_handlers() {
    let data = std::fs::read("fixtures/genius-trimix.bin").unwrap();

    let mut parser = Parser::new(Model::Genius);
    parser.set_data(&data);

    let mut extremes = Extremes::default();
    parser.samples_foreach(&mut extremes).unwrap();

    assert_eq!(extremes.max_depth, 54.8);
    assert_eq!(extremes.min_temperature, Some(18.3));
    assert_eq!(extremes.intervals, 10);
    assert!(extremes.events().eq([Event::Ceiling, Event::Ascent]));
    assert_eq!(extremes.ignored, 0);
}

#[test]
fn receives_warnings() {
    let data = std::fs::read("fixtures/smart-apnea.bin").unwrap();

    let mut parser = Parser::new(Model::SmartApnea);
    parser.set_data(&data);

    let mut profile = Profile::default();
    parser.samples_foreach(&mut profile).unwrap();

    assert_eq!(profile.warnings, [Warning::SubSecondSamples { rate: 4 }]);
    assert_eq!(profile.times.len(), 15);
    assert_eq!(profile.gas_mix, None);
}
