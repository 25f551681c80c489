//! AXI bus fabric and peripheral harness for RISC-V RTL cores.
//!
//! This crate serves the memory-mapped address space of an externally supplied CPU model
//! over a single-master AXI bus, one clock edge at a time:
//! 1. **Fabric:** Read and write engines, burst address generation, address decoding,
//!    and the exclusive-access reservation monitor.
//! 2. **Devices:** RAM and ROM images, CLINT timer, PLIC, and a 16550 UART.
//! 3. **Simulation:** ELF loading, configuration, the clock loop, and bus statistics.

/// Common types and constants (page geometry, access helpers, errors).
pub mod common;
/// Harness configuration (defaults and hierarchical config structures).
pub mod config;
/// Clock loop and program loading.
pub mod sim;
/// System-on-chip (fabric, engines, devices, memory, traits).
pub mod soc;
/// Bus statistics collection and reporting.
pub mod stats;

/// Crate error type.
pub use crate::common::SimError;
/// Root configuration type; use `Config::default()` or parse it from JSON.
pub use crate::config::Config;
/// The fabric on its own, for custom device maps.
pub use crate::soc::AxiFabric;
/// Standard platform (fabric plus PLIC, CLINT, ROM, RAM and UART); construct with `System::new`.
pub use crate::soc::System;
