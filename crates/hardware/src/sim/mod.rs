//! Simulation driver and program loading.
//!
//! Provides the clock loop that steps an external CPU model against the system,
//! and the loader that places program images into memory.

/// Clock loop and the CPU model interface.
pub mod harness;

/// ELF program image loading.
pub mod loader;

pub use harness::{CpuModel, RunSummary, Simulator};
