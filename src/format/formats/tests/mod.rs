//! Unit tests for the label format.
//!
//! These tests verify serialization, deserialization, error reporting and
//! round-trip behavior against pixel-space registries.
