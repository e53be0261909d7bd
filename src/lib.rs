//! diesel-stable - stable-period extraction for diesel test-bench logs
//!
//! This library turns raw bench exports (one time column per channel) into
//! steady-state datasets: channels are synchronized onto one time axis,
//! filtered down to periods where every monitored signal is stable, corrected
//! to reference atmospheric conditions and labelled with fuel properties.
//!
//! ## Module Structure
//!
//! - [`parsers`] - Bench CSV parsing, encoding detection and channel pairing
//! - [`frame`] - Columnar table with a shared time axis
//! - [`analysis`] - Synchronization, stability detection, intersection and
//!   physical corrections
//! - [`fuels`] - Fuel property reference table and join
//! - [`catalog`] - Run catalog and file-name based catalog builder
//! - [`validator`] - Diagnostic column validation
//! - [`normalize`] - Bench header names and English short names
//! - [`settings`] - Pipeline configuration
//! - [`observer`] - Progress observer interface
//! - [`metadata`] - Versioned metadata side-store
//! - [`export`] - CSV output
//! - [`pipeline`] - Per-run processing and batch driver

pub mod analysis;
pub mod catalog;
pub mod export;
pub mod frame;
pub mod fuels;
pub mod metadata;
pub mod normalize;
pub mod observer;
pub mod parsers;
pub mod pipeline;
pub mod settings;
pub mod validator;
