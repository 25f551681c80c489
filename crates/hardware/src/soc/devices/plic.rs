//! Platform-Level Interrupt Controller (PLIC).
//!
//! The PLIC arbitrates global external interrupts for a single hart context (machine mode).
//! Sources are level-sensitive: while a source is asserted and neither pending nor in
//! service, its gateway makes it pending. A claim hands the best pending source to the hart
//! and holds it in service until the matching complete.
//!
//! # Memory Map
//!
//! * `0x000000`: Interrupt Priorities (one 32-bit word per source)
//! * `0x001000`: Interrupt Pending Bits (read-only)
//! * `0x002000`: Context 0 Interrupt Enables
//! * `0x200000`: Context 0 Priority Threshold
//! * `0x200004`: Context 0 Claim/Complete

use crate::common::data::{extract_read, merge_write, size_mask, strobe_mask};
use crate::soc::traits::{Device, InterruptController, IrqLines};

const PLIC_PRIORITY_BASE: u64 = 0x000000;
const PLIC_PENDING_BASE: u64 = 0x001000;
const PLIC_ENABLE_BASE: u64 = 0x002000;
const PLIC_THRESHOLD: u64 = 0x200000;
const PLIC_CLAIM: u64 = 0x200004;

/// Number of interrupt sources (source 0 is reserved).
pub const NUM_SOURCES: usize = 1024;
const WORDS: usize = NUM_SOURCES / 32;
/// Size of the register window.
pub const PLIC_SIZE: u64 = 0x400_0000;

/// Fixed-size source bitmap.
#[derive(Clone, Debug, Default)]
struct Bitmap([u32; WORDS]);

impl Bitmap {
    fn get(&self, id: usize) -> bool {
        id < NUM_SOURCES && self.0[id / 32] & (1 << (id % 32)) != 0
    }

    fn set(&mut self, id: usize, on: bool) {
        if id >= NUM_SOURCES {
            return;
        }
        let bit = 1 << (id % 32);
        if on {
            self.0[id / 32] |= bit;
        } else {
            self.0[id / 32] &= !bit;
        }
    }
}

/// PLIC device structure.
#[derive(Debug)]
pub struct Plic {
    base_addr: u64,
    priorities: Vec<u32>,
    pending: Bitmap,
    enables: Bitmap,
    asserted: Bitmap,
    in_service: Bitmap,
    threshold: u32,
}

impl Plic {
    /// Creates a new PLIC device with every source disabled at priority 0.
    pub fn new(base_addr: u64) -> Self {
        Self {
            base_addr,
            priorities: vec![0; NUM_SOURCES],
            pending: Bitmap::default(),
            enables: Bitmap::default(),
            asserted: Bitmap::default(),
            in_service: Bitmap::default(),
            threshold: 0,
        }
    }

    /// Runs every gateway: asserted sources that are idle become pending.
    fn gateway(&mut self) {
        for id in 1..NUM_SOURCES {
            if self.asserted.get(id) && !self.pending.get(id) && !self.in_service.get(id) {
                self.pending.set(id, true);
            }
        }
    }

    /// Highest-priority enabled pending source above the threshold; ties go to the lowest id.
    fn best_candidate(&self) -> Option<usize> {
        let mut best: Option<(usize, u32)> = None;
        for id in 1..NUM_SOURCES {
            if !self.pending.get(id) || !self.enables.get(id) {
                continue;
            }
            let prio = self.priorities[id];
            if prio <= self.threshold {
                continue;
            }
            if best.is_none_or(|(_, p)| prio > p) {
                best = Some((id, prio));
            }
        }
        best.map(|(id, _)| id)
    }

    fn claim(&mut self) -> u32 {
        let Some(id) = self.best_candidate() else {
            return 0;
        };
        self.pending.set(id, false);
        self.in_service.set(id, true);
        tracing::debug!("PLIC claim {id}");
        id as u32
    }

    fn complete(&mut self, id: u32) {
        let id = id as usize;
        if !self.in_service.get(id) {
            return;
        }
        self.in_service.set(id, false);
        tracing::debug!("PLIC complete {id}");
        if self.asserted.get(id) {
            self.pending.set(id, true);
        }
    }

    /// Reads the 32-bit register at `off` without side effects.
    fn peek(&self, off: u64) -> u32 {
        match off {
            o if (PLIC_PRIORITY_BASE..PLIC_PENDING_BASE).contains(&o) => self
                .priorities
                .get((o / 4) as usize)
                .copied()
                .unwrap_or(0),
            o if (PLIC_PENDING_BASE..PLIC_PENDING_BASE + 0x80).contains(&o) => {
                self.pending.0[((o - PLIC_PENDING_BASE) / 4) as usize]
            }
            o if (PLIC_ENABLE_BASE..PLIC_ENABLE_BASE + 0x80).contains(&o) => {
                self.enables.0[((o - PLIC_ENABLE_BASE) / 4) as usize]
            }
            PLIC_THRESHOLD => self.threshold,
            _ => 0,
        }
    }

    fn load(&mut self, off: u64) -> u32 {
        if off == PLIC_CLAIM {
            self.claim()
        } else {
            self.peek(off)
        }
    }

    fn store(&mut self, off: u64, val: u32) {
        match off {
            // Source 0 has no priority register.
            PLIC_PRIORITY_BASE => {}
            o if (PLIC_PRIORITY_BASE..PLIC_PENDING_BASE).contains(&o) => {
                if let Some(p) = self.priorities.get_mut((o / 4) as usize) {
                    *p = val;
                }
            }
            o if (PLIC_ENABLE_BASE..PLIC_ENABLE_BASE + 0x80).contains(&o) => {
                self.enables.0[((o - PLIC_ENABLE_BASE) / 4) as usize] = val;
            }
            PLIC_THRESHOLD => self.threshold = val,
            PLIC_CLAIM => self.complete(val),
            _ => {}
        }
    }
}

impl Device for Plic {
    fn name(&self) -> &'static str {
        "PLIC"
    }

    fn address_range(&self) -> (u64, u64) {
        (self.base_addr, PLIC_SIZE)
    }

    /// Reads the 32-bit registers the access covers; a claim only fires when the
    /// claim word is among them.
    fn read(&mut self, offset: u64, size: u8) -> u64 {
        let base = offset & !7;
        let lanes = size_mask(size) << ((offset & 7) * 8);
        let lo = if lanes & 0xFFFF_FFFF != 0 {
            self.load(base)
        } else {
            0
        };
        let hi = if lanes >> 32 != 0 {
            self.load(base + 4)
        } else {
            0
        };
        extract_read(u64::from(lo) | (u64::from(hi) << 32), offset, size)
    }

    fn write(&mut self, offset: u64, value: u64, size: u8, strobe: u8) {
        let base = offset & !7;
        let old = u64::from(self.peek(base)) | (u64::from(self.peek(base + 4)) << 32);
        let new = merge_write(old, offset, value, size, strobe);
        let touched = strobe_mask(size, strobe) << ((offset & 7) * 8);
        if touched & 0xFFFF_FFFF != 0 {
            self.store(base, new as u32);
        }
        if touched >> 32 != 0 {
            self.store(base + 4, (new >> 32) as u32);
        }
    }

    fn step(&mut self, _irq: &mut IrqLines) {
        self.gateway();
    }

    fn as_interrupt_controller_mut(&mut self) -> Option<&mut dyn InterruptController> {
        Some(self)
    }
}

impl InterruptController for Plic {
    fn set_interrupt_level(&mut self, id: u16, level: bool) {
        let id = usize::from(id);
        if id == 0 || id >= NUM_SOURCES {
            return;
        }
        self.asserted.set(id, level);
        if level {
            self.gateway();
        }
    }

    fn interrupt_pending(&self) -> bool {
        self.best_candidate().is_some()
    }
}
