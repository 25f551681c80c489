//! Device traits for slaves attached to the fabric.
//!
//! This module defines the contract every registered slave satisfies. It provides:
//! 1. **Identification:** `name` and `address_range` for registration and decoding.
//! 2. **Access:** One read and one strobed write entry point at device-relative offsets.
//! 3. **Lifecycle:** An optional per-edge `step` that may drive interrupt wires.
//! 4. **Downcasting:** Optional casts to an interrupt controller or a memory image.
//!
//! Implementors must be `Send` so a whole `System` can be moved onto a simulation thread.

use crate::soc::memory::Memory;

/// Interrupt wires sampled by the CPU model, plus source levels headed for the PLIC.
///
/// A fresh value is built every edge. Devices write the wires they own during `step`;
/// the fabric then forwards `sources` to the interrupt controller and samples its
/// output onto `meip`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IrqLines {
    /// Machine timer interrupt pending.
    pub mtip: bool,
    /// Machine software interrupt pending.
    pub msip: bool,
    /// Machine external interrupt pending.
    pub meip: bool,
    /// Interrupt source levels raised or lowered this edge, in the order devices stepped.
    pub sources: Vec<(u16, bool)>,
}

impl IrqLines {
    /// Records the level of interrupt source `id` for delivery to the interrupt controller.
    pub fn set_source_level(&mut self, id: u16, level: bool) {
        self.sources.push((id, level));
    }
}

/// Receives level changes from interrupt sources.
pub trait InterruptController {
    /// Sets the input level of source `id` (true = asserted).
    fn set_interrupt_level(&mut self, id: u16, level: bool);

    /// True while the controller asserts its external interrupt output.
    fn interrupt_pending(&self) -> bool;
}

/// Trait for memory-mapped slaves attached to the AXI fabric.
///
/// Offsets passed to `read` and `write` are relative to the base address returned by
/// `address_range`. `size` is log2 of the access width in bytes.
pub trait Device: Send {
    /// Returns a short name for this device (e.g., `"UART0"`, `"RAM"`).
    fn name(&self) -> &'static str;

    /// Returns `(base, len)` of this device's region.
    fn address_range(&self) -> (u64, u64);

    /// Reads `1 << size` bytes (little-endian) at `offset`.
    fn read(&mut self, offset: u64, size: u8) -> u64;

    /// Writes the bytes of `value` selected by `strobe` (bit `i` enables byte `i`,
    /// stored at `offset + i`).
    fn write(&mut self, offset: u64, value: u64, size: u8, strobe: u8);

    /// Advances device state by one clock edge. Runs before either engine on that edge.
    fn step(&mut self, _irq: &mut IrqLines) {}

    /// Returns this device as an interrupt controller, if it is one.
    fn as_interrupt_controller_mut(&mut self) -> Option<&mut dyn InterruptController> {
        None
    }

    /// Returns this device as a memory image, if it is one.
    fn as_memory(&self) -> Option<&Memory> {
        None
    }

    /// Returns this device as a mutable memory image, if it is one.
    fn as_memory_mut(&mut self) -> Option<&mut Memory> {
        None
    }
}
