//! Integration tests for end-to-end functionality
//!
//! Tests for:
//! - Stable-period extraction on synthetic bench sessions
//! - Run outcome classification
//! - Batch processing from a catalog with CSV and metadata output

pub mod export_tests;
