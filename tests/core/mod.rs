//! Core module tests for non-parser functionality
//!
//! Tests for:
//! - Channel synchronization onto a reference axis
//! - Rolling-range stability and the oil-temperature gate
//! - Intersection of stable sets
//! - Atmospheric correction and exhaust averaging
//! - Fuel property join
//! - Header normalization
//! - Settings, catalog and metadata store

pub mod fuels_tests;
pub mod intersect_tests;
pub mod normalize_tests;
pub mod settings_tests;
pub mod stability_tests;
