//! Global Harness Constants.
//!
//! This module defines constants shared by the fabric and its devices. It includes:
//! 1. **Paging:** The 4 KiB page used by the burst boundary rule.
//! 2. **Bus geometry:** The largest access size a beat may carry on the 64-bit data bus.

/// Page size in bytes (4KB); a burst may never leave the page it started in.
pub const PAGE_SIZE: u64 = 4096;

/// Mask for extracting the page offset from an address.
pub const PAGE_OFFSET_MASK: u64 = PAGE_SIZE - 1;

/// Mask for extracting the page-aligned part of an address.
pub const PAGE_MASK: u64 = !PAGE_OFFSET_MASK;

/// Largest `size` (log2 bytes) a single beat can transfer on the data bus.
pub const MAX_BEAT_SIZE: u8 = 3;
