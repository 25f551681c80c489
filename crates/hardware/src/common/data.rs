//! Access Size and Byte-Enable Helpers.
//!
//! Bus accesses describe their width as `size` (log2 of the byte count) and select
//! bytes with a strobe whose bit `i` enables byte `i` of the value. These helpers turn
//! that pair into 64-bit masks so devices can merge partial writes into registers.

use super::constants::MAX_BEAT_SIZE;

/// Number of bytes moved by an access of the given `size` (clamped to the bus width).
#[inline]
pub const fn access_bytes(size: u8) -> u64 {
    let size = if size > MAX_BEAT_SIZE {
        MAX_BEAT_SIZE
    } else {
        size
    };
    1 << size
}

/// Bytes spanned by one beat of `size` as encoded on the 3-bit size wire.
///
/// Unlike [`access_bytes`] this does not clamp to the data bus width; burst addressing
/// and reservation ranges both use the full `2^size` span.
#[inline]
pub const fn beat_bytes(size: u8) -> u64 {
    1 << (size & 0x7)
}

/// Mask covering the low `1 << size` bytes of a 64-bit value.
#[inline]
pub const fn size_mask(size: u8) -> u64 {
    let bytes = access_bytes(size);
    if bytes >= 8 {
        u64::MAX
    } else {
        (1u64 << (bytes * 8)) - 1
    }
}

/// Mask of the bytes an access of `size` writes when `strobe` selects them.
///
/// Strobe bits beyond the access width are ignored.
#[inline]
pub const fn strobe_mask(size: u8, strobe: u8) -> u64 {
    let bytes = access_bytes(size);
    let mut mask = 0u64;
    let mut i = 0;
    while i < bytes {
        if strobe & (1 << i) != 0 {
            mask |= 0xFF << (i * 8);
        }
        i += 1;
    }
    mask
}

/// Merges a strobed write into the 64-bit register `old`.
///
/// `lane` is the byte position of the access within the register (`offset & 7`).
/// Bytes that would fall past the top of the register are dropped.
#[inline]
pub const fn merge_write(old: u64, lane: u64, value: u64, size: u8, strobe: u8) -> u64 {
    let shift = (lane & 7) * 8;
    let mask = strobe_mask(size, strobe) << shift;
    (old & !mask) | ((value << shift) & mask)
}

/// Extracts an access of `size` at byte position `lane` from the 64-bit register `reg`.
#[inline]
pub const fn extract_read(reg: u64, lane: u64, size: u8) -> u64 {
    (reg >> ((lane & 7) * 8)) & size_mask(size)
}
