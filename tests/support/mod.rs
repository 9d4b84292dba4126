#![allow(dead_code)]

//! Builders for synthetic dive buffers.

use regulator::{
    avec::FromSamples,
    sans::{
        Warning,
        check::compute_crc,
        model::Model,
        sample::{Deco, Event, Pressure, Sample},
    },
};

pub fn put_u16(r: &mut [u8], at: usize, value: u16) {
    r[at..at + 2].copy_from_slice(&value.to_le_bytes());
}

pub fn put_u32(r: &mut [u8], at: usize, value: u32) {
    r[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

/// Assemble a dive for a model without framing.
///
/// `profile` is the raw sample region, `count` the logical sample count and
/// `fields` fills the header fields, indexed from the fields offset.
pub fn standard(
    model: Model,
    kind: u16,
    count: u16,
    profile: &[u8],
    fields: impl FnOnce(&mut [u8]),
) -> Vec<u8> {
    let header_size = model.layout((kind & 0x03) as u8).header_size;
    let length = 4 + profile.len() + header_size;

    let mut r = vec![0; length];
    put_u32(&mut r, 0, length as u32);
    r[4..4 + profile.len()].copy_from_slice(profile);

    let offset = if model.is_smart_family() {
        length - header_size
    } else {
        length - header_size + 4
    };
    fields(&mut r[offset..]);

    if model.is_smart_family() {
        let at = length - if model == Model::SmartApnea { 6 } else { 4 };
        put_u16(&mut r, at, count);
        put_u16(&mut r, at + 2, kind);
    } else {
        let at = length - header_size;
        put_u16(&mut r, at, kind);
        put_u16(&mut r, at + 2, count);
    }

    r
}

/// A profile record of any unframed model but the Smart Apnea.
pub fn reading(size: usize, depth: u16, temperature: u16, gas_mix: u8) -> Vec<u8> {
    let mut r = vec![0; size];
    put_u16(&mut r, 0, depth);
    put_u16(&mut r, 2, temperature | (gas_mix as u16) << 12);
    r
}

/// A surface or freedive summary record.
pub fn summary(size: usize, max_depth: u16, dive_time: u16, surface_time: u16) -> Vec<u8> {
    let mut r = vec![0; size];
    put_u16(&mut r, 0, max_depth);
    put_u16(&mut r, 2, dive_time);
    put_u16(&mut r, 4, surface_time);
    r
}

/// Wrap a body in a checksummed frame.
pub fn frame(tag: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut r = tag.to_vec();
    r.extend_from_slice(body);
    r.extend_from_slice(&compute_crc(0, body).to_le_bytes());
    r.extend_from_slice(tag);
    r
}

pub const GENIUS_HEADER: usize = 0xB8;
pub const PROFILE_START: usize = GENIUS_HEADER + 4 + 58 + 138;

/// The body of a Genius profile record.
pub fn genius_reading(depth: u16, temperature: u16, misc: u32, alarms: u32, deco: u16) -> [u8; 24] {
    let mut r = [0; 24];
    put_u16(&mut r, 0, depth);
    put_u16(&mut r, 4, temperature);
    put_u16(&mut r, 0x0A, deco);
    put_u32(&mut r, 0x0C, alarms);
    put_u32(&mut r, 0x14, misc);
    r
}

/// A Genius gas word in use.
pub fn gas_word(oxygen: u32, helium: u32) -> u32 {
    oxygen | (100 - oxygen - helium) << 7 | helium << 14 | 2 << 21
}

/// Assemble a Genius dive. A pressure follows every fourth record.
pub fn genius(header: impl FnOnce(&mut [u8]), records: &[[u8; 24]], pressures: &[u16]) -> Vec<u8> {
    let mut r = vec![0; GENIUS_HEADER];
    put_u16(&mut r, 0, 1);
    put_u16(&mut r, 0x20, records.len() as u16);
    header(&mut r);

    r.extend_from_slice(&[0, 0, 2, 0]);
    r.extend(frame(b"DSTR", &[0; 48]));
    r.extend(frame(b"TISS", &[0; 128]));

    for (i, record) in records.iter().enumerate() {
        r.extend(frame(b"DPRS", record));

        if (i + 1) % 4 == 0 {
            let mut body = [0; 6];
            put_u16(&mut body, 0, pressures[i / 4]);
            r.extend(frame(b"AIRS", &body));
        }
    }

    r.extend(frame(b"DEND", &[0; 152]));
    r
}

/// Offset of a record within a Genius dive, counting pressure records.
pub fn genius_record_offset(i: usize) -> usize {
    PROFILE_START + i * 34 + (i / 4) * 16
}

/// A receiver keeping everything in order.
#[derive(Debug, Default)]
pub struct Recorder {
    pub samples: Vec<Sample>,
    pub warnings: Vec<Warning>,
}

impl FromSamples for Recorder {
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
