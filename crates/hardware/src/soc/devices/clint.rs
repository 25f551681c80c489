//! Core Local Interruptor (CLINT).
//!
//! The CLINT block holds memory-mapped control and status registers associated
//! with software and timer interrupts for a single hart.
//!
//! # Memory Map
//!
//! * `0x0000`: MSIP (Machine Software Interrupt Pending, bit 0)
//! * `0x4000`: MTIMECMP (Machine Time Compare)
//! * `0xBFF8`: MTIME (Machine Time)
//!
//! Every register is treated as 64 bits wide; narrower and strobed accesses select the
//! bytes inside it.

use crate::common::data::{extract_read, merge_write};
use crate::soc::traits::{Device, IrqLines};

/// Offset for the Machine Software Interrupt Pending register.
const MSIP_OFFSET: u64 = 0x0000;
/// Offset for the Machine Time Compare register.
const MTIMECMP_OFFSET: u64 = 0x4000;
/// Offset for the Machine Time register.
const MTIME_OFFSET: u64 = 0xBFF8;
/// Size of the register window.
pub const CLINT_SIZE: u64 = 0x10000;

/// CLINT device structure.
#[derive(Debug)]
pub struct Clint {
    base_addr: u64,
    mtime: u64,
    mtimecmp: u64,
    msip: u64,
    /// Steps per `mtime` increment.
    divider: u64,
    counter: u64,
}

impl Clint {
    /// Creates a new CLINT device.
    ///
    /// # Arguments
    ///
    /// * `base_addr` - The base physical address.
    /// * `divider` - Clock edges per timer tick (0 is treated as 1).
    pub fn new(base_addr: u64, divider: u64) -> Self {
        Self {
            base_addr,
            mtime: 0,
            mtimecmp: u64::MAX,
            msip: 0,
            divider: divider.max(1),
            counter: 0,
        }
    }

    /// Current machine time.
    pub fn mtime(&self) -> u64 {
        self.mtime
    }

    fn reg_mut(&mut self, offset: u64) -> Option<&mut u64> {
        match offset & !7 {
            MSIP_OFFSET => Some(&mut self.msip),
            MTIMECMP_OFFSET => Some(&mut self.mtimecmp),
            MTIME_OFFSET => Some(&mut self.mtime),
            _ => None,
        }
    }
}

impl Device for Clint {
    fn name(&self) -> &'static str {
        "CLINT"
    }

    fn address_range(&self) -> (u64, u64) {
        (self.base_addr, CLINT_SIZE)
    }

    fn read(&mut self, offset: u64, size: u8) -> u64 {
        self.reg_mut(offset)
            .map_or(0, |reg| extract_read(*reg, offset, size))
    }

    fn write(&mut self, offset: u64, value: u64, size: u8, strobe: u8) {
        let is_msip = offset & !7 == MSIP_OFFSET;
        if let Some(reg) = self.reg_mut(offset) {
            *reg = merge_write(*reg, offset, value, size, strobe);
            if is_msip {
                *reg &= 1;
            }
        }
    }

    /// Advances `mtime` every `divider` edges and drives `mtip` and `msip`.
    fn step(&mut self, irq: &mut IrqLines) {
        self.counter += 1;
        if self.counter >= self.divider {
            self.mtime = self.mtime.wrapping_add(1);
            self.counter = 0;
        }
        irq.mtip = self.mtime >= self.mtimecmp;
        irq.msip = self.msip & 1 != 0;
    }
}
