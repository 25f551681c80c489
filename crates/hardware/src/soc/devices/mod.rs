//! Memory-Mapped IO Devices.
//!
//! This module contains the peripherals attached to the fabric next to memory:
//! the timer (CLINT), the interrupt controller (PLIC) and the serial console (UART).

/// Core Local Interruptor (timer and software interrupt controller).
pub mod clint;

/// Platform-Level Interrupt Controller (PLIC).
pub mod plic;

/// UART 16550-compatible serial port.
pub mod uart;

pub use clint::Clint;
pub use plic::Plic;
pub use uart::Uart;

pub use crate::soc::traits::Device;
