//! AXI signal set exchanged with the CPU model once per clock edge.
//!
//! The harness samples the master-driven wires of all five channels into a fresh
//! `AxiSignals`, the fabric fills in the slave-driven wires, and the harness drives
//! them back into the model. Nothing in this struct survives the edge it was built for.
//!
//! # Channels
//!
//! * `aw` / `ar`: write-address and read-address requests.
//! * `w`: write data beats.
//! * `b`: write responses.
//! * `r`: read data beats and their responses.

use std::fmt;

/// AXI response code carried on the `b` and `r` channels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Resp {
    /// Normal access success.
    #[default]
    Okay = 0,
    /// Exclusive access success.
    ExOkay = 1,
    /// Slave error. Never produced by this fabric.
    SlvErr = 2,
    /// Decode error: no slave at the address, or the beat left the burst's 4 KiB page.
    DecErr = 3,
}

impl Resp {
    /// Returns the two-bit wire encoding.
    #[inline]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Decodes a two-bit wire value; the upper bits are ignored.
    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Self::Okay,
            1 => Self::ExOkay,
            2 => Self::SlvErr,
            _ => Self::DecErr,
        }
    }
}

/// Burst mode of a transaction as sampled from the `axburst` wires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Burst {
    /// Every beat uses the start address.
    Fixed,
    /// The address advances by the beat size every beat.
    Incr,
    /// The address advances and wraps within an aligned window of `(len + 1)` beats.
    Wrap,
    /// The reserved encoding (or any out-of-range value); carried verbatim for logging.
    Reserved(u8),
}

impl Burst {
    /// Returns the wire encoding.
    pub const fn bits(self) -> u8 {
        match self {
            Self::Fixed => 0,
            Self::Incr => 1,
            Self::Wrap => 2,
            Self::Reserved(v) => v,
        }
    }
}

impl From<u8> for Burst {
    fn from(bits: u8) -> Self {
        match bits {
            0 => Self::Fixed,
            1 => Self::Incr,
            2 => Self::Wrap,
            other => Self::Reserved(other),
        }
    }
}

/// Address channel (`aw` or `ar`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AddrChannel {
    /// Master: request is valid.
    pub valid: bool,
    /// Slave: fabric can accept a request.
    pub ready: bool,
    /// Master: start address of the burst.
    pub addr: u64,
    /// Master: beat size as log2 bytes (3 bits).
    pub size: u8,
    /// Master: burst mode encoding (2 bits).
    pub burst: u8,
    /// Master: cache hints (4 bits). Not interpreted.
    pub cache: u8,
    /// Master: protection hints (3 bits). Not interpreted.
    pub prot: u8,
    /// Master: transaction id.
    pub id: u16,
    /// Master: number of beats minus one.
    pub len: u8,
    /// Master: exclusive access.
    pub lock: bool,
    /// Master: quality of service (4 bits). Not interpreted.
    pub qos: u8,
    /// Master: region identifier (4 bits). Not interpreted.
    pub region: u8,
}

impl AddrChannel {
    /// True when both sides agree on a transfer this edge.
    #[inline]
    pub const fn fire(&self) -> bool {
        self.valid && self.ready
    }
}

/// Write data channel (`w`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriteDataChannel {
    /// Master: data beat is valid.
    pub valid: bool,
    /// Slave: fabric can accept the beat.
    pub ready: bool,
    /// Master: final beat of the burst.
    pub last: bool,
    /// Master: beat payload.
    pub data: u64,
    /// Master: byte enables, bit `i` selects byte `i` of `data`.
    pub strb: u8,
}

/// Write response channel (`b`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriteRespChannel {
    /// Slave: response is valid.
    pub valid: bool,
    /// Master: response accepted.
    pub ready: bool,
    /// Slave: response code.
    pub resp: Resp,
    /// Slave: id of the transaction being answered.
    pub id: u16,
}

/// Read data channel (`r`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReadDataChannel {
    /// Slave: data beat is valid.
    pub valid: bool,
    /// Master: beat accepted.
    pub ready: bool,
    /// Slave: final beat of the burst.
    pub last: bool,
    /// Slave: beat payload.
    pub data: u64,
    /// Slave: response code.
    pub resp: Resp,
    /// Slave: id of the transaction being answered.
    pub id: u16,
}

/// All wires of the five AXI channels for one clock edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AxiSignals {
    /// Write address channel.
    pub aw: AddrChannel,
    /// Write data channel.
    pub w: WriteDataChannel,
    /// Write response channel.
    pub b: WriteRespChannel,
    /// Read address channel.
    pub ar: AddrChannel,
    /// Read data channel.
    pub r: ReadDataChannel,
}

impl fmt::Display for AxiSignals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "aw: valid={} ready={} addr={:#018x} size={} burst={} id={:#x} len={} lock={} prot={:#04x}",
            self.aw.valid,
            self.aw.ready,
            self.aw.addr,
            self.aw.size,
            self.aw.burst,
            self.aw.id,
            self.aw.len,
            self.aw.lock,
            self.aw.prot
        )?;
        writeln!(
            f,
            "w:  valid={} ready={} last={} data={:#018x} strb={:#04x}",
            self.w.valid, self.w.ready, self.w.last, self.w.data, self.w.strb
        )?;
        writeln!(
            f,
            "b:  valid={} ready={} resp={:?} id={:#x}",
            self.b.valid, self.b.ready, self.b.resp, self.b.id
        )?;
        writeln!(
            f,
            "ar: valid={} ready={} addr={:#018x} size={} burst={} id={:#x} len={} lock={} prot={:#04x}",
            self.ar.valid,
            self.ar.ready,
            self.ar.addr,
            self.ar.size,
            self.ar.burst,
            self.ar.id,
            self.ar.len,
            self.ar.lock,
            self.ar.prot
        )?;
        write!(
            f,
            "r:  valid={} ready={} last={} data={:#018x} resp={:?} id={:#x}",
            self.r.valid, self.r.ready, self.r.last, self.r.data, self.r.resp, self.r.id
        )
    }
}
