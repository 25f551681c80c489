//! System-on-Chip Components.
//!
//! This module organizes the AXI fabric and the slaves attached to it: the signal set
//! exchanged with the CPU model, the burst generator, address decoder and reservation
//! monitor, the read and write engines, the devices, and the builder that assembles
//! the standard platform.

/// System builder for assembling the standard platform.
pub mod builder;

/// Burst address generation and the 4 KiB page rule.
pub mod burst;

/// Device registry and address decoding.
pub mod decoder;

/// Memory-mapped I/O device implementations.
pub mod devices;

/// AXI fabric: registry, engines and monitor.
pub mod interconnect;

/// Memory-backed slaves.
pub mod memory;

/// Exclusive-access reservation monitor.
pub mod monitor;

/// Read engine state machine.
pub mod read;

/// AXI channel wires and response codes.
pub mod signals;

/// Device trait definitions.
pub mod traits;

/// Write engine state machine.
pub mod write;

pub use builder::System;
pub use interconnect::AxiFabric;
