//! System-on-Chip construction and top-level `System` type.
//!
//! This module builds the standard platform from configuration. It performs:
//! 1. **Fabric setup:** Creates the AXI fabric with the configured reservation capacity.
//! 2. **Device registration:** PLIC, CLINT, ROM, RAM and UART, in that decode order.
//! 3. **Image loading:** Optionally loads ELF images into the ROM and RAM.
//! 4. **Edge stepping:** One call per clock edge runs the device phase and the bus phase.

use std::path::Path;

use crate::common::SimError;
use crate::config::Config;
use crate::sim::loader;
use crate::soc::decoder::DeviceId;
use crate::soc::devices::{Clint, Plic, Uart};
use crate::soc::interconnect::AxiFabric;
use crate::soc::memory::Memory;
use crate::soc::signals::AxiSignals;
use crate::soc::traits::{Device, IrqLines};

/// Top-level system: the fabric plus handles to its memories.
#[derive(Debug)]
pub struct System {
    /// The fabric and every device registered on it.
    pub fabric: AxiFabric,
    rom: DeviceId,
    ram: DeviceId,
}

impl System {
    /// Builds the standard platform with a UART on stdout (and stdin if configured).
    ///
    /// # Errors
    ///
    /// Propagates allocation, registration and image-loading failures.
    pub fn new(config: &Config) -> Result<Self, SimError> {
        let mut uart = Uart::new(config.system.uart_base, config.system.uart_irq);
        if config.system.uart_stdin {
            uart = uart.with_input(Uart::stdin_reader());
        }
        Self::with_uart(config, uart)
    }

    /// Builds the standard platform around a caller-provided UART.
    ///
    /// # Errors
    ///
    /// Propagates allocation, registration and image-loading failures.
    pub fn with_uart(config: &Config, uart: Uart) -> Result<Self, SimError> {
        config.validate()?;
        let sys = &config.system;
        let mut fabric = AxiFabric::new(config.bus.max_reservations);
        let checked = config.bus.reject_overlapping_ranges;
        let register = |fabric: &mut AxiFabric, dev: Box<dyn Device>| {
            if checked {
                fabric.register_checked(dev)
            } else {
                Ok(fabric.register(dev))
            }
        };

        let _plic = register(&mut fabric, Box::new(Plic::new(sys.plic_base)))?;
        let _clint = register(
            &mut fabric,
            Box::new(Clint::new(sys.clint_base, sys.clint_divider)),
        )?;
        let rom = register(
            &mut fabric,
            Box::new(Memory::new("ROM", sys.rom_base, sys.rom_size)?),
        )?;
        let ram = register(
            &mut fabric,
            Box::new(Memory::new("RAM", sys.ram_base, sys.ram_size)?),
        )?;
        let _uart = register(&mut fabric, Box::new(uart))?;

        let mut system = Self { fabric, rom, ram };
        if let Some(path) = &config.sim.rom_image {
            let _entry = system.load_rom_image(path)?;
        }
        if let Some(path) = &config.sim.ram_image {
            let _entry = system.load_ram_image(path)?;
        }
        Ok(system)
    }

    /// Runs one clock edge: device phase, then read engine, then write engine.
    pub fn step(&mut self, sig: &mut AxiSignals) -> IrqLines {
        self.fabric.sim_step(sig)
    }

    /// The boot ROM.
    pub fn rom(&self) -> Option<&Memory> {
        self.fabric.devices().get(self.rom)?.as_memory()
    }

    /// The boot ROM, mutably.
    pub fn rom_mut(&mut self) -> Option<&mut Memory> {
        self.fabric.devices_mut().get_mut(self.rom)?.as_memory_mut()
    }

    /// Main RAM.
    pub fn ram(&self) -> Option<&Memory> {
        self.fabric.devices().get(self.ram)?.as_memory()
    }

    /// Main RAM, mutably.
    pub fn ram_mut(&mut self) -> Option<&mut Memory> {
        self.fabric.devices_mut().get_mut(self.ram)?.as_memory_mut()
    }

    /// Loads an ELF image into the ROM; returns its entry point.
    ///
    /// # Errors
    ///
    /// See [`loader::load_elf_file`].
    pub fn load_rom_image(&mut self, path: &Path) -> Result<u64, SimError> {
        let rom = self.rom_mut().ok_or_else(|| missing("ROM"))?;
        loader::load_elf_file(rom, path)
    }

    /// Loads an ELF image into the RAM; returns its entry point.
    ///
    /// # Errors
    ///
    /// See [`loader::load_elf_file`].
    pub fn load_ram_image(&mut self, path: &Path) -> Result<u64, SimError> {
        let ram = self.ram_mut().ok_or_else(|| missing("RAM"))?;
        loader::load_elf_file(ram, path)
    }

    /// Writes the RAM contents to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Io`] if the file cannot be written.
    pub fn dump_ram(&self, path: &Path) -> Result<(), SimError> {
        self.ram().ok_or_else(|| missing("RAM"))?.dump(path)
    }
}

fn missing(name: &str) -> SimError {
    SimError::InvalidConfig(format!("{name} is not a memory device"))
}
