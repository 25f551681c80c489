//! Read engine.
//!
//! Serves one read burst at a time over the `ar` and `r` channels:
//!
//! * `Idle`: `arready` is asserted; a valid request is latched and the engine starts sending.
//! * `Sending`: one beat is presented per edge until the master takes it with `rready`.
//!
//! A beat's device read happens once. The value is held until the master accepts the
//! beat, so a stalled master sees the same data without repeating read side effects.

use crate::soc::burst::BurstRequest;
use crate::soc::decoder::DeviceMap;
use crate::soc::monitor::{ExclusiveMonitor, ReserveOutcome};
use crate::soc::signals::{AxiSignals, Resp};
use crate::stats::BusStats;

/// Read engine state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReadState {
    /// Waiting for a request on `ar`.
    #[default]
    Idle,
    /// Presenting beats on `r`.
    Sending,
}

/// State machine for the read channels.
#[derive(Clone, Debug, Default)]
pub struct ReadEngine {
    state: ReadState,
    req: BurstRequest,
    beat: u8,
    held: Option<u64>,
}

impl ReadEngine {
    /// Creates an idle engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> ReadState {
        self.state
    }

    /// Index of the beat being presented.
    pub fn beat(&self) -> u8 {
        self.beat
    }

    /// Request of the burst in flight (meaningless while idle).
    pub fn request(&self) -> &BurstRequest {
        &self.req
    }

    /// Drops any burst in flight.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Evaluates the engine for one clock edge.
    pub fn step(
        &mut self,
        sig: &mut AxiSignals,
        map: &mut DeviceMap,
        monitor: &mut ExclusiveMonitor,
        stats: &mut BusStats,
    ) {
        match self.state {
            ReadState::Idle => {
                sig.ar.ready = true;
                if sig.ar.valid {
                    self.req = BurstRequest::latch(&sig.ar);
                    self.beat = 0;
                    self.held = None;
                    self.state = ReadState::Sending;
                    stats.read_txns += 1;
                    tracing::debug!(
                        "read accepted: id={:#x} addr={:#x} size={} len={} burst={:?} lock={}",
                        self.req.id,
                        self.req.addr,
                        self.req.size,
                        self.req.len,
                        self.req.burst,
                        self.req.lock
                    );
                }
            }
            ReadState::Sending => self.send(sig, map, monitor, stats),
        }
    }

    fn send(
        &mut self,
        sig: &mut AxiSignals,
        map: &mut DeviceMap,
        monitor: &mut ExclusiveMonitor,
        stats: &mut BusStats,
    ) {
        sig.r.valid = true;
        sig.r.id = self.req.id;

        let addr = self.req.beat_addr(self.beat);
        if let Some((id, offset)) = map.decode_in_page(self.req.addr, addr) {
            let size = self.req.size;
            let data = *self
                .held
                .get_or_insert_with(|| map.get_mut(id).map_or(0, |dev| dev.read(offset, size)));
            sig.r.data = data;
            sig.r.resp = if self.req.lock {
                Resp::ExOkay
            } else {
                Resp::Okay
            };
            sig.r.last = self.req.is_last(self.beat);
            tracing::trace!(
                "read beat {} addr={addr:#x} data={data:#018x}",
                self.beat
            );
        } else {
            sig.r.data = 0;
            sig.r.last = true;
            sig.r.resp = Resp::DecErr;
        }

        if !sig.r.ready {
            return;
        }

        self.held = None;
        stats.read_beats += 1;
        if self.req.lock {
            stats.exclusive_reads += 1;
            stats.reservations_installed += 1;
            if let ReserveOutcome::Evicted(_) = monitor.reserve(self.req.addr, self.req.size) {
                stats.reservations_evicted += 1;
            }
        }

        if sig.r.resp == Resp::DecErr {
            stats.read_decode_errors += 1;
            tracing::debug!(
                "read id={:#x} terminated with DECERR on beat {} at {addr:#x}",
                self.req.id,
                self.beat
            );
            self.reset();
        } else if self.req.is_last(self.beat) {
            tracing::debug!("read id={:#x} complete", self.req.id);
            self.reset();
        } else {
            self.beat = self.beat.wrapping_add(1);
        }
    }
}
