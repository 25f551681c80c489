//! Unit tests grouped by subsystem.

/// Configuration parsing and validation.
pub mod config;
