//! Exclusive-access reservation monitor.
//!
//! A locked read installs a reservation covering `[addr, addr + 2^size)`. Every accepted
//! write clears the reservations its bytes touch, and a locked write only succeeds when a
//! reservation starting at exactly its beat address is still live. The table has a fixed
//! number of slots; once all are live, new reservations overwrite slots round-robin.

use crate::common::data::beat_bytes;

/// One reservation table entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Reservation {
    /// Slot holds a live reservation.
    pub valid: bool,
    /// Start address of the reserved range.
    pub addr: u64,
    /// Size of the reserved range as log2 bytes.
    pub size: u8,
}

impl Reservation {
    fn end(&self) -> u64 {
        self.addr.saturating_add(beat_bytes(self.size))
    }

    fn overlaps(&self, addr: u64, size: u8) -> bool {
        let end = addr.saturating_add(beat_bytes(size));
        self.valid && addr < self.end() && self.addr < end
    }
}

/// What `reserve` did to the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReserveOutcome {
    /// The reservation went into a free slot.
    Installed,
    /// The table was full; the live reservation in that slot was overwritten.
    Evicted(Reservation),
}

/// Fixed-capacity reservation table with a round-robin replacement cursor.
#[derive(Clone, Debug)]
pub struct ExclusiveMonitor {
    slots: Vec<Reservation>,
    cursor: usize,
}

impl ExclusiveMonitor {
    /// Creates a monitor with `capacity` slots (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![Reservation::default(); capacity.max(1)],
            cursor: 0,
        }
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Installs a reservation in the first free slot, or overwrites the slot under the
    /// cursor and advances the cursor when every slot is live.
    pub fn reserve(&mut self, addr: u64, size: u8) -> ReserveOutcome {
        let entry = Reservation {
            valid: true,
            addr,
            size,
        };
        if let Some(slot) = self.slots.iter_mut().find(|s| !s.valid) {
            *slot = entry;
            tracing::debug!("reservation installed at {addr:#x} size {size}");
            return ReserveOutcome::Installed;
        }
        let victim = std::mem::replace(&mut self.slots[self.cursor], entry);
        self.cursor = (self.cursor + 1) % self.slots.len();
        tracing::debug!(
            "reservation at {:#x} evicted by {addr:#x} size {size}",
            victim.addr
        );
        ReserveOutcome::Evicted(victim)
    }

    /// True if `[addr, addr + 2^size)` intersects a live reservation.
    pub fn conflicts(&self, addr: u64, size: u8) -> bool {
        self.slots.iter().any(|s| s.overlaps(addr, size))
    }

    /// True if a live reservation starts exactly at `addr`.
    pub fn hit(&self, addr: u64) -> bool {
        self.slots.iter().any(|s| s.valid && s.addr == addr)
    }

    /// Clears every reservation intersecting `[addr, addr + 2^size)`; returns how many.
    pub fn invalidate_conflicting(&mut self, addr: u64, size: u8) -> usize {
        let mut cleared = 0;
        for slot in self.slots.iter_mut().filter(|s| s.overlaps(addr, size)) {
            tracing::debug!(
                "reservation at {:#x} invalidated by write to {addr:#x}",
                slot.addr
            );
            slot.valid = false;
            cleared += 1;
        }
        cleared
    }

    /// Drops every reservation and rewinds the cursor.
    pub fn reset(&mut self) {
        self.slots.fill(Reservation::default());
        self.cursor = 0;
    }

    /// Iterates the live reservations in slot order.
    pub fn live(&self) -> impl Iterator<Item = &Reservation> {
        self.slots.iter().filter(|s| s.valid)
    }
}

impl Default for ExclusiveMonitor {
    fn default() -> Self {
        Self::new(crate::config::defaults::MAX_RESERVATIONS)
    }
}
