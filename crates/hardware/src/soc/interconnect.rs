//! AXI bus fabric.
//!
//! This module ties the fabric together. It provides:
//! 1. **Device registration:** Slaves are appended to an ordered, first-match registry.
//! 2. **Device phase:** Every slave is stepped, and interrupt sources reach the controller.
//! 3. **Bus phase:** The read engine then the write engine are evaluated once each.
//! 4. **Backdoor access:** Untimed reads and writes for loaders and tests.
//!
//! The exclusive monitor is the only state the two engines share. Both run on the
//! caller's thread in a fixed order, so a same-edge read followed by a write always sees
//! the reservation table the read left behind.

use crate::common::SimError;
use crate::soc::decoder::{DeviceId, DeviceMap};
use crate::soc::monitor::ExclusiveMonitor;
use crate::soc::read::ReadEngine;
use crate::soc::signals::AxiSignals;
use crate::soc::traits::{Device, IrqLines};
use crate::soc::write::WriteEngine;
use crate::stats::BusStats;

/// Single-master AXI interconnect with its slaves, engines and reservation monitor.
#[derive(Debug, Default)]
pub struct AxiFabric {
    devices: DeviceMap,
    read: ReadEngine,
    write: WriteEngine,
    monitor: ExclusiveMonitor,
    stats: BusStats,
}

impl AxiFabric {
    /// Creates an empty fabric whose monitor holds `max_reservations` reservations.
    pub fn new(max_reservations: usize) -> Self {
        Self {
            devices: DeviceMap::new(),
            read: ReadEngine::new(),
            write: WriteEngine::new(),
            monitor: ExclusiveMonitor::new(max_reservations),
            stats: BusStats::default(),
        }
    }

    /// Registers a slave after those already present; overlaps are logged.
    pub fn register(&mut self, device: Box<dyn Device>) -> DeviceId {
        self.devices.insert(device)
    }

    /// Registers a slave, refusing ranges that intersect an existing one.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::OverlappingRange`] on overlap; the fabric is unchanged.
    pub fn register_checked(&mut self, device: Box<dyn Device>) -> Result<DeviceId, SimError> {
        self.devices.insert_checked(device)
    }

    /// Steps every device in registration order, then delivers the interrupt source
    /// levels they raised to each interrupt controller and samples its output.
    pub fn step_devices(&mut self) -> IrqLines {
        let mut irq = IrqLines::default();
        for dev in self.devices.iter_mut() {
            dev.step(&mut irq);
        }
        for dev in self.devices.iter_mut() {
            if let Some(ctrl) = dev.as_interrupt_controller_mut() {
                for &(id, level) in &irq.sources {
                    ctrl.set_interrupt_level(id, level);
                }
                irq.meip |= ctrl.interrupt_pending();
            }
        }
        irq
    }

    /// Evaluates the read engine and then the write engine for one edge.
    pub fn step(&mut self, sig: &mut AxiSignals) {
        self.read.step(
            sig,
            &mut self.devices,
            &mut self.monitor,
            &mut self.stats,
        );
        self.write.step(
            sig,
            &mut self.devices,
            &mut self.monitor,
            &mut self.stats,
        );
    }

    /// One full edge: device phase, then bus phase.
    pub fn sim_step(&mut self, sig: &mut AxiSignals) -> IrqLines {
        let irq = self.step_devices();
        self.step(sig);
        irq
    }

    /// Abandons any transactions in flight and clears every reservation.
    pub fn reset(&mut self) {
        self.read.reset();
        self.write.reset();
        self.monitor.reset();
    }

    /// Reads `1 << size` bytes at `addr` without going through the engines.
    ///
    /// Returns `None` when no device claims the address.
    pub fn backdoor_read(&mut self, addr: u64, size: u8) -> Option<u64> {
        let (id, offset) = self.devices.decode(addr)?;
        self.devices.get_mut(id).map(|dev| dev.read(offset, size))
    }

    /// Writes `value` at `addr` with every byte enabled, bypassing the engines and
    /// the monitor. Returns false when no device claims the address.
    pub fn backdoor_write(&mut self, addr: u64, value: u64, size: u8) -> bool {
        let Some((id, offset)) = self.devices.decode(addr) else {
            return false;
        };
        let Some(dev) = self.devices.get_mut(id) else {
            return false;
        };
        dev.write(offset, value, size, 0xFF);
        true
    }

    /// Registered devices.
    pub fn devices(&self) -> &DeviceMap {
        &self.devices
    }

    /// Registered devices, mutably.
    pub fn devices_mut(&mut self) -> &mut DeviceMap {
        &mut self.devices
    }

    /// Reservation monitor.
    pub fn monitor(&self) -> &ExclusiveMonitor {
        &self.monitor
    }

    /// Reservation monitor, mutably.
    pub fn monitor_mut(&mut self) -> &mut ExclusiveMonitor {
        &mut self.monitor
    }

    /// Read engine.
    pub fn read_engine(&self) -> &ReadEngine {
        &self.read
    }

    /// Write engine.
    pub fn write_engine(&self) -> &WriteEngine {
        &self.write
    }

    /// Bus counters.
    pub fn stats(&self) -> &BusStats {
        &self.stats
    }

    /// Bus counters, mutably.
    pub fn stats_mut(&mut self) -> &mut BusStats {
        &mut self.stats
    }
}
