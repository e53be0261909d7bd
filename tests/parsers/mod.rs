//! Parser integration tests for bench exports
//!
//! Tests for:
//! - Format detection and unsupported formats
//! - Encodings and decimal separators
//! - Duplicate time headers and channel pairing
//! - Edge cases and error handling
