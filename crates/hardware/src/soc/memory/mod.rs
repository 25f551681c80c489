//! Memory-backed slaves (RAM and ROM images).
//!
//! This module implements the plain memory device. It provides:
//! 1. **Buffer:** Backing storage (`MemBuffer`) for the image contents.
//! 2. **Memory:** Device implementation that maps the buffer at a base address, with
//!    little-endian reads and strobe-masked writes.
//! 3. **Images:** Bulk loading at absolute addresses and dumping the contents to a file.

/// Backing byte storage (mmap on Unix, heap elsewhere).
pub mod buffer;

use std::fs;
use std::path::Path;

use self::buffer::MemBuffer;
use crate::common::SimError;
use crate::common::data::access_bytes;
use crate::soc::traits::Device;

/// A byte-addressable memory region mapped at a fixed base address.
#[derive(Debug)]
pub struct Memory {
    name: &'static str,
    base: u64,
    buffer: MemBuffer,
}

impl Memory {
    /// Creates a zero-filled memory of `size` bytes at `base`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Alloc`] if the backing storage cannot be allocated.
    pub fn new(name: &'static str, base: u64, size: u64) -> Result<Self, SimError> {
        Ok(Self {
            name,
            base,
            buffer: MemBuffer::new(size as usize)?,
        })
    }

    /// Base address of the region.
    pub fn base(&self) -> u64 {
        self.base
    }

    /// Size of the region in bytes.
    pub fn size(&self) -> u64 {
        self.buffer.len() as u64
    }

    /// The whole image.
    pub fn as_slice(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    /// The whole image, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        self.buffer.as_mut_slice()
    }

    /// Copies `data` into the image at absolute address `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::SegmentOutOfBounds`] if any byte would land outside the region.
    pub fn load_at(&mut self, addr: u64, data: &[u8]) -> Result<(), SimError> {
        let len = data.len() as u64;
        let out_of_bounds = || SimError::SegmentOutOfBounds {
            addr,
            len,
            base: self.base,
            end: self.base.saturating_add(self.size()),
        };
        let offset = addr.checked_sub(self.base).ok_or_else(out_of_bounds)?;
        if offset > self.size() || len > self.size() - offset {
            return Err(out_of_bounds());
        }
        let start = offset as usize;
        self.buffer.as_mut_slice()[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Writes the whole image to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Io`] if the file cannot be written.
    pub fn dump(&self, path: &Path) -> Result<(), SimError> {
        fs::write(path, self.as_slice()).map_err(|e| SimError::io(path, e))?;
        tracing::info!(
            "dumped {} ({:#x} bytes) to {}",
            self.name,
            self.size(),
            path.display()
        );
        Ok(())
    }

    /// Zeroes the image.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Device for Memory {
    fn name(&self) -> &'static str {
        self.name
    }

    fn address_range(&self) -> (u64, u64) {
        (self.base, self.size())
    }

    /// Reads `1 << size` bytes little-endian; bytes past the end read as zero.
    fn read(&mut self, offset: u64, size: u8) -> u64 {
        let bytes = self.as_slice();
        let mut value = 0u64;
        for i in 0..access_bytes(size) {
            let Some(&b) = offset
                .checked_add(i)
                .and_then(|a| bytes.get(usize::try_from(a).ok()?))
            else {
                tracing::warn!(
                    "{} read of {} bytes at {offset:#x} runs past the end",
                    self.name,
                    access_bytes(size)
                );
                break;
            };
            value |= u64::from(b) << (8 * i);
        }
        value
    }

    /// Stores byte `i` of `value` at `offset + i` for every strobe bit `i` set.
    fn write(&mut self, offset: u64, value: u64, size: u8, strobe: u8) {
        let name = self.name;
        let bytes = self.as_mut_slice();
        for i in 0..access_bytes(size) {
            if strobe & (1 << i) == 0 {
                continue;
            }
            let Some(b) = offset
                .checked_add(i)
                .and_then(|a| bytes.get_mut(usize::try_from(a).ok()?))
            else {
                tracing::warn!("{name} write at {offset:#x} byte {i} dropped past the end");
                break;
            };
            *b = (value >> (8 * i)) as u8;
        }
    }

    fn as_memory(&self) -> Option<&Memory> {
        Some(self)
    }

    fn as_memory_mut(&mut self) -> Option<&mut Memory> {
        Some(self)
    }
}
