//! Configuration system for the AXI harness.
//!
//! This module defines the configuration structures used to parameterize a run. It provides:
//! 1. **Defaults:** Baseline memory map and harness constants.
//! 2. **Structures:** Hierarchical config for the system memory map, the bus, and the clock loop.
//! 3. **Loading:** JSON parsing from a string or a file, followed by validation.
//!
//! Every field is optional in JSON; `Config::default()` describes the standard platform.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::common::SimError;
use crate::common::constants::PAGE_OFFSET_MASK;

/// Default configuration constants for the harness.
pub(crate) mod defaults {
    /// Base address of the boot ROM image.
    pub const ROM_BASE: u64 = 0x0000_1000;

    /// Size of the boot ROM image (32 KiB).
    pub const ROM_SIZE: u64 = 32 * 1024;

    /// Base address of main system RAM (2 GiB).
    pub const RAM_BASE: u64 = 0x8000_0000;

    /// Size of main system RAM (8 MiB).
    pub const RAM_SIZE: u64 = 8 * 1024 * 1024;

    /// Base address of the 16550-compatible UART.
    pub const UART_BASE: u64 = 0x1000_0000;

    /// Base address of the CLINT timer block.
    pub const CLINT_BASE: u64 = 0x0200_0000;

    /// Base address of the PLIC.
    pub const PLIC_BASE: u64 = 0x0C00_0000;

    /// CLINT timer divider (mtime increments every N clock edges).
    pub const CLINT_DIVIDER: u64 = 1;

    /// PLIC source id of the UART.
    pub const UART_IRQ: u16 = 10;

    /// Capacity of the exclusive monitor's reservation table.
    pub const MAX_RESERVATIONS: usize = 2;

    /// Clock cycles simulated before the run stops.
    pub const MAX_CLOCK: u64 = 0x400;

    /// Clock cycles the model is held in reset at the start of a run.
    pub const RESET_CYCLES: u64 = 4;
}

/// Root configuration.
///
/// # Example
///
/// ```
/// use axisim_core::config::Config;
///
/// let json = r#"{
///     "system": { "ram_size": 16777216 },
///     "bus": { "max_reservations": 4 },
///     "sim": { "max_clock": 100000, "trace_bus": true }
/// }"#;
///
/// let config = Config::from_json_str(json).unwrap();
/// assert_eq!(config.system.ram_size, 16 * 1024 * 1024);
/// assert_eq!(config.system.ram_base, 0x8000_0000);
/// assert_eq!(config.bus.max_reservations, 4);
/// assert!(config.sim.trace_bus);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Memory map and peripheral parameters
    #[serde(default)]
    pub system: SystemConfig,
    /// Fabric parameters
    #[serde(default)]
    pub bus: BusConfig,
    /// Clock loop and image files
    #[serde(default)]
    pub sim: SimConfig,
}

impl Config {
    /// Parses and validates a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::ConfigParse`] for malformed JSON and
    /// [`SimError::InvalidConfig`] for values the harness cannot honour.
    pub fn from_json_str(json: &str) -> Result<Self, SimError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Io`] if the file cannot be read, otherwise as `from_json_str`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| SimError::io(path, e))?;
        Self::from_json_str(&text)
    }

    /// Checks the values serde cannot: memory sizes and the reservation capacity.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] describing the first offending field.
    pub fn validate(&self) -> Result<(), SimError> {
        for (name, size) in [
            ("system.rom_size", self.system.rom_size),
            ("system.ram_size", self.system.ram_size),
        ] {
            if size == 0 || size & PAGE_OFFSET_MASK != 0 {
                return Err(SimError::InvalidConfig(format!(
                    "{name} must be a non-zero multiple of 4 KiB (got {size:#x})"
                )));
            }
        }
        if self.bus.max_reservations == 0 {
            return Err(SimError::InvalidConfig(
                "bus.max_reservations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// System memory map and peripheral configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SystemConfig {
    /// Boot ROM base address
    #[serde(default = "SystemConfig::default_rom_base")]
    pub rom_base: u64,

    /// Boot ROM size in bytes
    #[serde(default = "SystemConfig::default_rom_size")]
    pub rom_size: u64,

    /// RAM base address
    #[serde(default = "SystemConfig::default_ram_base")]
    pub ram_base: u64,

    /// RAM size in bytes
    #[serde(default = "SystemConfig::default_ram_size")]
    pub ram_size: u64,

    /// UART base address
    #[serde(default = "SystemConfig::default_uart_base")]
    pub uart_base: u64,

    /// CLINT base address
    #[serde(default = "SystemConfig::default_clint_base")]
    pub clint_base: u64,

    /// PLIC base address
    #[serde(default = "SystemConfig::default_plic_base")]
    pub plic_base: u64,

    /// Clock edges per mtime tick
    #[serde(default = "SystemConfig::default_clint_divider")]
    pub clint_divider: u64,

    /// PLIC source id raised by the UART
    #[serde(default = "SystemConfig::default_uart_irq")]
    pub uart_irq: u16,

    /// Feed host stdin into the UART receiver
    #[serde(default)]
    pub uart_stdin: bool,
}

impl SystemConfig {
    fn default_rom_base() -> u64 {
        defaults::ROM_BASE
    }

    fn default_rom_size() -> u64 {
        defaults::ROM_SIZE
    }

    fn default_ram_base() -> u64 {
        defaults::RAM_BASE
    }

    fn default_ram_size() -> u64 {
        defaults::RAM_SIZE
    }

    fn default_uart_base() -> u64 {
        defaults::UART_BASE
    }

    fn default_clint_base() -> u64 {
        defaults::CLINT_BASE
    }

    fn default_plic_base() -> u64 {
        defaults::PLIC_BASE
    }

    fn default_clint_divider() -> u64 {
        defaults::CLINT_DIVIDER
    }

    fn default_uart_irq() -> u16 {
        defaults::UART_IRQ
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            rom_base: defaults::ROM_BASE,
            rom_size: defaults::ROM_SIZE,
            ram_base: defaults::RAM_BASE,
            ram_size: defaults::RAM_SIZE,
            uart_base: defaults::UART_BASE,
            clint_base: defaults::CLINT_BASE,
            plic_base: defaults::PLIC_BASE,
            clint_divider: defaults::CLINT_DIVIDER,
            uart_irq: defaults::UART_IRQ,
            uart_stdin: false,
        }
    }
}

/// Fabric configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BusConfig {
    /// Reservation slots in the exclusive monitor
    #[serde(default = "BusConfig::default_max_reservations")]
    pub max_reservations: usize,

    /// Refuse device registrations whose ranges overlap instead of warning
    #[serde(default)]
    pub reject_overlapping_ranges: bool,
}

impl BusConfig {
    fn default_max_reservations() -> usize {
        defaults::MAX_RESERVATIONS
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            max_reservations: defaults::MAX_RESERVATIONS,
            reject_overlapping_ranges: false,
        }
    }
}

/// Clock loop configuration and image files.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimConfig {
    /// Stop after this many clock cycles
    #[serde(default = "SimConfig::default_max_clock")]
    pub max_clock: u64,

    /// Clock cycles held in reset before the bus is served
    #[serde(default = "SimConfig::default_reset_cycles")]
    pub reset_cycles: u64,

    /// Log the full signal set every served edge (at trace level)
    #[serde(default)]
    pub trace_bus: bool,

    /// ELF image loaded into the ROM
    #[serde(default)]
    pub rom_image: Option<PathBuf>,

    /// ELF image loaded into the RAM
    #[serde(default)]
    pub ram_image: Option<PathBuf>,

    /// File the RAM contents are written to when the run ends
    #[serde(default)]
    pub ram_dump: Option<PathBuf>,
}

impl SimConfig {
    fn default_max_clock() -> u64 {
        defaults::MAX_CLOCK
    }

    fn default_reset_cycles() -> u64 {
        defaults::RESET_CYCLES
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_clock: defaults::MAX_CLOCK,
            reset_cycles: defaults::RESET_CYCLES,
            trace_bus: false,
            rom_image: None,
            ram_image: None,
            ram_dump: None,
        }
    }
}
