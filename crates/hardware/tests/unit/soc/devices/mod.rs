//! Peripheral tests.




/// Serial console registers.
pub mod uart;
