#![cfg(feature = "std")]

use std::path::Path;

use csv::ReaderBuilder;
use regulator::{
    avec::{FromSamples, Parser},
    sans::{
        Warning,
        field::{DiveMode, Mix},
        model::Model,
        sample::{Deco, DecoKind, Event, Pressure, Sample},
    },
};

#[test]
fn iconhd_nitrox() {
    validate("fixtures/iconhd-nitrox.bin", Model::IconHd);
}

#[test]
fn iconhdnet_air() {
    validate("fixtures/iconhdnet-air.bin", Model::IconHdNet);
}

#[test]
fn smart_apnea() {
    validate("fixtures/smart-apnea.bin", Model::SmartApnea);
}

#[test]
fn genius_trimix() {
    validate("fixtures/genius-trimix.bin", Model::Genius);
}

#[test]
fn decode_owned_dive() {
    let data = std::fs::read("fixtures/iconhd-nitrox.bin").unwrap();
    let dive = regulator::avec::decode(Model::IconHd, &data).unwrap();

    assert_eq!(dive.dive_time, 120);
    assert_eq!(dive.max_depth, 30.4);
    assert_eq!(dive.mode, DiveMode::OpenCircuit);
    assert_eq!(
        dive.gas_mixes,
        [
            Mix {
                oxygen: 0.32,
                helium: 0.0,
                nitrogen: 1.0 - 0.32 - 0.0
            },
            Mix {
                oxygen: 0.5,
                helium: 0.0,
                nitrogen: 1.0 - 0.5 - 0.0
            }
        ]
    );
    assert!(dive.tanks.is_empty());
    assert!(dive.warnings.is_empty());
    assert_eq!(dive.datetime.year, 2023);
    assert_eq!(dive.profile.first(), Some(&Sample::Time(5)));
    assert_eq!(dive.profile.iter().filter(|s| matches!(s, Sample::Time(_))).count(), 24);
}

#[test]
fn decode_owned_genius_dive() {
    let data = std::fs::read("fixtures/genius-trimix.bin").unwrap();
    let dive = regulator::avec::decode(Model::Genius, &data).unwrap();

    assert_eq!(dive.dive_time, 50);
    assert_eq!(dive.gas_mixes.len(), 2);
    assert_eq!(dive.tanks.len(), 2);
    assert_eq!(dive.tanks[1].gas_mix, Some(1));

    // The three unused gas slots are empty.
    assert_eq!(dive.warnings.len(), 3);
}

fn validate(path: &str, model: Model) {
    let data = std::fs::read(path).unwrap();

    let mut parser = Parser::new(model);
    parser.set_data(&data);

    let mut validator = Validator::new(path);
    parser.samples_foreach(&mut validator).unwrap();
    assert!(validator.0.is_empty(), "{} rows left", validator.0.len());
}

struct Validator(Vec<Vec<String>>);

impl Validator {
    fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().with_extension("csv");

        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .has_headers(false)
            .from_path(path)
            .unwrap();

        let expected: Vec<Vec<String>> = reader
            .records()
            .map(|r| r.unwrap().iter().map(|f| f.to_string()).collect())
            .collect();

        Self(expected)
    }

    fn next(&mut self, kind: &str) -> Vec<String> {
        let mut row = self.0.remove(0);
        assert_eq!(row.remove(0), kind);
        row
    }
}

fn float(s: &str) -> f64 {
    s.parse().unwrap()
}

impl FromSamples for Validator {
    fn add_time(&mut self, seconds: u32) {
        assert_eq!(self.next("time"), [seconds.to_string()]);
    }
    fn add_depth(&mut self, metres: f64) {
        assert_eq!(float(&self.next("depth")[0]), metres);
    }
    fn add_temperature(&mut self, celsius: f64) {
        assert_eq!(float(&self.next("temperature")[0]), celsius);
    }
    fn add_gas_mix(&mut self, index: usize) {
        assert_eq!(self.next("gas_mix"), [index.to_string()]);
    }
    fn add_deco(&mut self, deco: Deco) {
        let row = self.next("deco");
        let kind = match deco.kind {
            DecoKind::Ndl => "ndl",
            DecoKind::DecoStop => "decostop",
        };
        assert_eq!(row[0], kind);
        assert_eq!(float(&row[1]), deco.depth);
        assert_eq!(row[2], deco.time.to_string());
    }
    fn add_event(&mut self, event: Event) {
        let kind = match event {
            Event::Ascent => "ascent",
            Event::Ceiling => "ceiling",
        };
        assert_eq!(self.next("event"), [kind]);
    }
    fn add_pressure(&mut self, pressure: Pressure) {
        let row = self.next("pressure");
        assert_eq!(row[0], pressure.tank.to_string());
        assert_eq!(float(&row[1]), pressure.bar);
    }
    fn add_warning(&mut self, warning: Warning) {
        let row = self.next("warning");
        match warning {
            Warning::SubSecondSamples { rate } => {
                assert_eq!(row, ["sub_second_samples".to_string(), rate.to_string()]);
            }
            Warning::InactiveTankPressure { tank, pressure } => {
                assert_eq!(
                    row,
                    [
                        "inactive_tank_pressure".to_string(),
                        tank.to_string(),
                        pressure.to_string()
                    ]
                );
            }
            warning => panic!("unexpected warning {warning}"),
        }
    }
}
