//! Device registry and address decoding.
//!
//! Devices are kept in registration order and decoded first-match: an address belongs to
//! the first registered device whose `[base, base + len)` contains it. Registration order
//! is therefore part of the memory map, and overlapping ranges resolve to the earlier
//! device. Overlaps are reported, and `insert_checked` refuses them outright.

use std::fmt;

use crate::common::SimError;
use crate::soc::burst::same_page;
use crate::soc::traits::Device;

/// Stable handle to a registered device (its registration index).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub usize);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A device and the range it was registered with. Immutable once registered.
struct Registration {
    base: u64,
    len: u64,
    device: Box<dyn Device>,
}

impl Registration {
    /// Device-relative offset of `addr`, if the device claims it.
    #[inline]
    fn offset_of(&self, addr: u64) -> Option<u64> {
        let offset = addr.wrapping_sub(self.base);
        (offset < self.len).then_some(offset)
    }

    fn overlaps(&self, base: u64, len: u64) -> bool {
        let end = base.saturating_add(len);
        let self_end = self.base.saturating_add(self.len);
        base < self_end && self.base < end
    }
}

/// Ordered list of registered devices.
#[derive(Default)]
pub struct DeviceMap {
    entries: Vec<Registration>,
}

impl fmt::Debug for DeviceMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| {
                format!(
                    "{} @ {:#x}..{:#x}",
                    e.device.name(),
                    e.base,
                    e.base.saturating_add(e.len)
                )
            }))
            .finish()
    }
}

impl DeviceMap {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a device; its range is taken from `address_range`.
    ///
    /// Overlaps with already registered devices are allowed and logged: the earlier
    /// registration keeps winning for the shared addresses.
    pub fn insert(&mut self, device: Box<dyn Device>) -> DeviceId {
        let (base, len) = device.address_range();
        if let Some(existing) = self.first_overlap(base, len) {
            tracing::warn!(
                "device '{}' at {base:#x}+{len:#x} overlaps '{existing}'; '{existing}' wins on shared addresses",
                device.name()
            );
        }
        self.push(base, len, device)
    }

    /// Appends a device, refusing it if its range intersects a registered one.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::OverlappingRange`] naming the device already owning the range.
    pub fn insert_checked(&mut self, device: Box<dyn Device>) -> Result<DeviceId, SimError> {
        let (base, len) = device.address_range();
        if let Some(existing) = self.first_overlap(base, len) {
            return Err(SimError::OverlappingRange {
                name: device.name().to_string(),
                base,
                len,
                existing: existing.to_string(),
            });
        }
        Ok(self.push(base, len, device))
    }

    fn push(&mut self, base: u64, len: u64, device: Box<dyn Device>) -> DeviceId {
        let id = DeviceId(self.entries.len());
        tracing::debug!(
            "registered {} {id} at {base:#x}..{:#x}",
            device.name(),
            base.saturating_add(len)
        );
        self.entries.push(Registration { base, len, device });
        id
    }

    fn first_overlap(&self, base: u64, len: u64) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|e| e.overlaps(base, len))
            .map(|e| e.device.name())
    }

    /// Maps an absolute address to the owning device and the device-relative offset.
    ///
    /// Returns `None` when no device claims the address.
    pub fn decode(&self, addr: u64) -> Option<(DeviceId, u64)> {
        self.entries
            .iter()
            .enumerate()
            .find_map(|(i, e)| e.offset_of(addr).map(|off| (DeviceId(i), off)))
    }

    /// Decodes a beat address, refusing it when it left the 4 KiB page of `start`.
    pub fn decode_in_page(&self, start: u64, addr: u64) -> Option<(DeviceId, u64)> {
        if same_page(start, addr) {
            self.decode(addr)
        } else {
            None
        }
    }

    /// Returns the device registered under `id`.
    pub fn get(&self, id: DeviceId) -> Option<&(dyn Device + 'static)> {
        self.entries.get(id.0).map(|e| e.device.as_ref())
    }

    /// Returns the device registered under `id` mutably.
    pub fn get_mut(&mut self, id: DeviceId) -> Option<&mut (dyn Device + 'static)> {
        self.entries.get_mut(id.0).map(|e| e.device.as_mut())
    }

    /// Returns the (base, len) the device `id` was registered with.
    pub fn range(&self, id: DeviceId) -> Option<(u64, u64)> {
        self.entries.get(id.0).map(|e| (e.base, e.len))
    }

    /// Number of registered devices.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no device is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates all devices mutably in registration order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Device>> {
        self.entries.iter_mut().map(|e| &mut e.device)
    }
}
