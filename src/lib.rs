#![no_std]

//! An efficient decoder for dive logs recorded by the Mares Icon HD family of
//! dive computers.
//!
//! Regulator validates a downloaded dive once, then answers queries for its
//! start time, summary fields and sample profile. Seven models share the
//! format: the Smart, Smart Apnea, Icon HD, Icon HD Net Ready, Quad Air,
//! Smart Air and Genius. The Genius additionally wraps its profile in
//! checksummed records.
//!
//! Most users should begin with the [`Parser`](avec::Parser) session and the
//! derive macro in the [`avec`] module. If these prove insufficient, the
//! allocation-free building blocks they are made of are exposed in the
//! [`sans`] module.
//!
//! Non-fatal anomalies are reported through the [`log`] facade as well as
//! in-band.
//!
//! ## Cargo Features
//!
//! The following crate feature flags are available:
//!
//! - `derive`: enable derive macros (default).
//! - `std`: enable owned decoding of complete dives (default).

pub mod avec;
pub mod sans;
