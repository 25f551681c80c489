use std::collections::VecDeque;

use axisim_core::sim::CpuModel;
use axisim_core::soc::signals::{AddrChannel, AxiSignals, Burst, Resp, WriteDataChannel};
use axisim_core::soc::traits::IrqLines;

/// One single-beat access the master performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    /// Read `1 << size` bytes.
    Read {
        /// Address.
        addr: u64,
        /// Log2 bytes.
        size: u8,
    },
    /// Write `data` under `strb`.
    Write {
        /// Address.
        addr: u64,
        /// Payload.
        data: u64,
        /// Log2 bytes.
        size: u8,
        /// Byte enables.
        strb: u8,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    ReadAddr,
    ReadData,
    WriteAddr,
    WriteData,
    WriteResp,
    Done,
}

/// Bus master that runs a fixed list of accesses, one handshake at a time, and records
/// what it observed. Handshakes complete in `drive_bus`, i.e. at the edge they fire on.
#[derive(Debug)]
pub struct ScriptedMaster {
    ops: VecDeque<Op>,
    phase: Phase,
    clock: bool,
    reset: bool,
    stop_when_done: bool,
    /// `(data, resp)` of every completed read, in order.
    pub reads: Vec<(u64, Resp)>,
    /// Response of every completed write, in order.
    pub writes: Vec<Resp>,
    /// Rising clock edges seen.
    pub posedges: u64,
    /// Rising clock edges seen with reset asserted.
    pub reset_posedges: u64,
    /// Interrupt lines driven most recently.
    pub irq: IrqLines,
    /// Wall-clock seconds presented most recently.
    pub time: u64,
}

impl ScriptedMaster {
    /// A master that performs `ops` and then asks the harness to stop.
    pub fn new(ops: impl IntoIterator<Item = Op>) -> Self {
        let mut master = Self {
            ops: ops.into_iter().collect(),
            phase: Phase::Done,
            clock: false,
            reset: false,
            stop_when_done: true,
            reads: Vec::new(),
            writes: Vec::new(),
            posedges: 0,
            reset_posedges: 0,
            irq: IrqLines::default(),
            time: 0,
        };
        master.begin_next();
        master
    }

    /// Keeps the master running after its last access.
    #[must_use]
    pub fn run_forever(mut self) -> Self {
        self.stop_when_done = false;
        self
    }

    /// True once every access has completed.
    pub fn done(&self) -> bool {
        self.phase == Phase::Done
    }

    fn begin_next(&mut self) {
        self.phase = match self.ops.front() {
            Some(Op::Read { .. }) => Phase::ReadAddr,
            Some(Op::Write { .. }) => Phase::WriteAddr,
            None => Phase::Done,
        };
    }

    fn complete(&mut self) {
        let _ = self.ops.pop_front();
        self.begin_next();
    }

    fn addr_channel(addr: u64, size: u8) -> AddrChannel {
        AddrChannel {
            valid: true,
            addr,
            size,
            burst: Burst::Incr.bits(),
            id: 0x2,
            ..AddrChannel::default()
        }
    }
}

impl CpuModel for ScriptedMaster {
    fn set_clock(&mut self, high: bool) {
        if high && !self.clock {
            self.posedges += 1;
            if self.reset {
                self.reset_posedges += 1;
            }
        }
        self.clock = high;
    }

    fn set_reset(&mut self, asserted: bool) {
        self.reset = asserted;
    }

    fn eval(&mut self) {}

    fn finished(&self) -> bool {
        self.stop_when_done && self.done()
    }

    fn sample_bus(&self, sig: &mut AxiSignals) {
        match (self.phase, self.ops.front()) {
            (Phase::ReadAddr, Some(&Op::Read { addr, size })) => {
                sig.ar = Self::addr_channel(addr, size);
            }
            (Phase::ReadData, _) => sig.r.ready = true,
            (Phase::WriteAddr, Some(&Op::Write { addr, size, .. })) => {
                sig.aw = Self::addr_channel(addr, size);
            }
            (Phase::WriteData, Some(&Op::Write { data, strb, .. })) => {
                sig.w = WriteDataChannel {
                    valid: true,
                    last: true,
                    data,
                    strb,
                    ..WriteDataChannel::default()
                };
            }
            (Phase::WriteResp, _) => sig.b.ready = true,
            _ => {}
        }
    }

    fn drive_bus(&mut self, sig: &AxiSignals) {
        match self.phase {
            Phase::ReadAddr if sig.ar.ready => self.phase = Phase::ReadData,
            Phase::ReadData if sig.r.valid => {
                self.reads.push((sig.r.data, sig.r.resp));
                if sig.r.last {
                    self.complete();
                }
            }
            Phase::WriteAddr if sig.aw.ready => self.phase = Phase::WriteData,
            Phase::WriteData if sig.w.ready => self.phase = Phase::WriteResp,
            Phase::WriteResp if sig.b.valid => {
                self.writes.push(sig.b.resp);
                self.complete();
            }
            _ => {}
        }
    }

    fn drive_interrupts(&mut self, irq: &IrqLines) {
        self.irq = irq.clone();
    }

    fn set_time(&mut self, seconds: u64) {
        self.time = seconds;
    }
}
