//! Common utilities and types used throughout the harness.
//!
//! This module provides the building blocks shared by the fabric, its devices, and the
//! simulation driver. It includes:
//! 1. **Constants:** Page geometry for the 4 KiB burst rule and bus widths.
//! 2. **Access helpers:** Size and byte-enable masks for partial register writes.
//! 3. **Error Handling:** The host-side `SimError` type.

/// Common constants used throughout the harness.
pub mod constants;

/// Access-size and byte-enable helpers.
pub mod data;

/// Error types for configuration, loading, and registration.
pub mod error;

pub use constants::{PAGE_MASK, PAGE_SIZE};
pub use error::SimError;
