//! Burst address generation.
//!
//! Computes the address of every beat of a burst from the request that opened it.
//! The generator is stateless: engines call it once per beat with the beat index.
//!
//! * `Fixed`: the start address on every beat.
//! * `Incr`: `base + beat * 2^size`.
//! * `Wrap`: cycles through a window of `(len + 1) * 2^size` bytes aligned to its own size.
//!
//! Reserved encodings are logged when the request is latched and addressed as `Fixed`.

use crate::common::constants::PAGE_MASK;
use crate::common::data::beat_bytes;
use crate::soc::signals::{AddrChannel, Burst};

/// Request latched from an address channel when a transaction is accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BurstRequest {
    /// Start address.
    pub addr: u64,
    /// Beat size as log2 bytes.
    pub size: u8,
    /// Burst mode.
    pub burst: Burst,
    /// Transaction id echoed on the response channel.
    pub id: u16,
    /// Number of beats minus one.
    pub len: u8,
    /// Exclusive access.
    pub lock: bool,
}

impl Default for BurstRequest {
    fn default() -> Self {
        Self {
            addr: 0,
            size: 0,
            burst: Burst::Fixed,
            id: 0,
            len: 0,
            lock: false,
        }
    }
}

impl BurstRequest {
    /// Captures the request wires of `ch`.
    ///
    /// A reserved burst encoding is reported here, once per transaction; its beats then
    /// follow `Fixed` addressing.
    pub fn latch(ch: &AddrChannel) -> Self {
        let burst = Burst::from(ch.burst);
        if let Burst::Reserved(bits) = burst {
            tracing::warn!(
                "invalid burst mode {bits} at {:#x}, treating as FIXED",
                ch.addr
            );
        }
        Self {
            addr: ch.addr,
            size: ch.size,
            burst,
            id: ch.id,
            len: ch.len,
            lock: ch.lock,
        }
    }

    /// Address of beat `beat` of this burst.
    #[inline]
    pub fn beat_addr(&self, beat: u8) -> u64 {
        beat_addr(self.addr, self.size, self.burst, self.len, beat)
    }

    /// True when `beat` is the final beat of the burst.
    #[inline]
    pub const fn is_last(&self, beat: u8) -> bool {
        beat == self.len
    }
}

/// Returns the address of beat `beat` of a burst.
///
/// # Arguments
///
/// * `base` - Start address latched from the address channel.
/// * `size` - Beat size as log2 bytes.
/// * `burst` - Burst mode.
/// * `len` - Number of beats minus one (only `Wrap` uses it).
/// * `beat` - Zero-based beat index.
pub fn beat_addr(base: u64, size: u8, burst: Burst, len: u8, beat: u8) -> u64 {
    let bytes_per_beat = beat_bytes(size);
    let offset = u64::from(beat).wrapping_mul(bytes_per_beat);
    match burst {
        Burst::Incr => base.wrapping_add(offset),
        Burst::Wrap => {
            let window = (u64::from(len) + 1) * bytes_per_beat;
            let aligned_base = base & !(window - 1);
            aligned_base.wrapping_add(offset % window)
        }
        Burst::Fixed | Burst::Reserved(_) => base,
    }
}

/// True when `addr` lies in the same 4 KiB page as `start`.
#[inline]
pub const fn same_page(start: u64, addr: u64) -> bool {
    (start & PAGE_MASK) == (addr & PAGE_MASK)
}
