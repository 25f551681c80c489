//! Write engine.
//!
//! Serves one write burst at a time over the `aw`, `w` and `b` channels:
//!
//! * `Idle`: `awready` is asserted; a valid request is latched.
//! * `AcceptingData`: `wready` is asserted; each valid beat is decoded and written.
//! * `Responding`: the stored response is presented on `b` until `bready`.
//!
//! Every accepted beat clears the reservations it overlaps. A locked beat is only written
//! when a reservation started at exactly its address, and then answers `ExOkay`.

use crate::soc::burst::BurstRequest;
use crate::soc::decoder::DeviceMap;
use crate::soc::monitor::ExclusiveMonitor;
use crate::soc::signals::{AxiSignals, Resp};
use crate::stats::BusStats;

/// Write engine state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WriteState {
    /// Waiting for a request on `aw`.
    #[default]
    Idle,
    /// Taking data beats on `w`.
    AcceptingData,
    /// Presenting the response on `b`.
    Responding,
}

/// State machine for the write channels.
#[derive(Clone, Debug, Default)]
pub struct WriteEngine {
    state: WriteState,
    req: BurstRequest,
    beat: u8,
    resp: Resp,
}

impl WriteEngine {
    /// Creates an idle engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> WriteState {
        self.state
    }

    /// Index of the next data beat.
    pub fn beat(&self) -> u8 {
        self.beat
    }

    /// Response that will be (or is being) presented on `b`.
    pub fn pending_response(&self) -> Resp {
        self.resp
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
            WriteState::Idle => {
                sig.aw.ready = true;
                if sig.aw.valid {
                    self.req = BurstRequest::latch(&sig.aw);
                    self.beat = 0;
                    self.resp = Resp::Okay;
                    self.state = WriteState::AcceptingData;
                    stats.write_txns += 1;
                    tracing::debug!(
                        "write accepted: id={:#x} addr={:#x} size={} len={} burst={:?} lock={}",
                        self.req.id,
                        self.req.addr,
                        self.req.size,
                        self.req.len,
                        self.req.burst,
                        self.req.lock
                    );
                }
            }
            WriteState::AcceptingData => {
                sig.w.ready = true;
                if sig.w.valid {
                    self.accept_beat(sig, map, monitor, stats);
                }
            }
            WriteState::Responding => {
                sig.b.valid = true;
                sig.b.resp = self.resp;
                sig.b.id = self.req.id;
                if sig.b.ready {
                    tracing::debug!(
                        "write id={:#x} complete with {:?}",
                        self.req.id,
                        self.resp
                    );
                    self.reset();
                }
            }
        }
    }

    fn accept_beat(
        &mut self,
        sig: &AxiSignals,
        map: &mut DeviceMap,
        monitor: &mut ExclusiveMonitor,
        stats: &mut BusStats,
    ) {
        stats.write_beats += 1;
        let addr = self.req.beat_addr(self.beat);
        if let Some((id, offset)) = map.decode_in_page(self.req.addr, addr) {
            let hit = monitor.hit(addr);
            let cleared = monitor.invalidate_conflicting(addr, self.req.size);
            stats.reservations_invalidated += cleared as u64;

            let lock = self.req.lock;
            if let Some(dev) = map.get_mut(id).filter(|_| !lock || hit) {
                dev.write(offset, sig.w.data, self.req.size, sig.w.strb);
            }
            if lock {
                if hit {
                    stats.exclusive_write_success += 1;
                } else {
                    stats.exclusive_write_failure += 1;
                }
            }
            self.resp = if lock && hit { Resp::ExOkay } else { Resp::Okay };
            tracing::trace!(
                "write beat {} addr={addr:#x} data={:#018x} strb={:#04x} resp={:?}",
                self.beat,
                sig.w.data,
                sig.w.strb,
                self.resp
            );
        } else {
            stats.write_decode_errors += 1;
            tracing::debug!(
                "write id={:#x} DECERR on beat {} at {addr:#x}",
                self.req.id,
                self.beat
            );
            self.resp = Resp::DecErr;
            self.state = WriteState::Responding;
        }

        if sig.w.last {
            self.state = WriteState::Responding;
        }
        self.beat = self.beat.wrapping_add(1);
    }
}
