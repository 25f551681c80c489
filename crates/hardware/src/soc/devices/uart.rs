//! Universal Asynchronous Receiver-Transmitter (UART).
//!
//! Implements the register file of a 16550 UART for console I/O. Transmitted bytes are
//! buffered and flushed to a sink (stdout unless replaced) at each newline. Received
//! bytes come from an optional channel, which `Uart::stdin_reader` can feed from the
//! host terminal.
//!
//! Registers are one byte wide and packed at consecutive offsets. A wider access
//! touches `offset + i` for every byte `i` it covers (writes only where the strobe is set).

use std::collections::VecDeque;
use std::fmt;
use std::io::{self, Read, Write};
use std::sync::mpsc::{Receiver, TryRecvError, channel};
use std::thread;

use crate::common::data::access_bytes;
use crate::soc::traits::{Device, IrqLines};

/// Receiver Buffer Register (Read) / Divisor Latch Low (DLAB=1).
const REG_RBR: u64 = 0;
/// Transmitter Holding Register (Write) / Divisor Latch Low (DLAB=1).
const REG_THR: u64 = 0;
/// Interrupt Enable Register / Divisor Latch High (DLAB=1).
const REG_IER: u64 = 1;
/// Interrupt Identity Register (Read).
const REG_IIR: u64 = 2;
/// FIFO Control Register (Write).
const REG_FCR: u64 = 2;
/// Line Control Register.
const REG_LCR: u64 = 3;
/// Modem Control Register.
const REG_MCR: u64 = 4;
/// Line Status Register.
const REG_LSR: u64 = 5;
/// Scratch Register.
const REG_SCR: u64 = 7;

/// Size of the register window.
pub const UART_SIZE: u64 = 0x100;

const IIR_NO_INTERRUPT: u8 = 0x01;
const IIR_THRE: u8 = 0x02;
const IIR_RDA: u8 = 0x04;
/// FIFOs-enabled bits reported in IIR.
const IIR_FIFO_BITS: u8 = 0xC0;

const LSR_DATA_READY: u8 = 0x01;
const LSR_THRE: u8 = 0x20;
const LSR_TEMT: u8 = 0x40;
const LSR_DEFAULT: u8 = LSR_THRE | LSR_TEMT;

const LCR_DLAB: u8 = 0x80;
const LCR_RESET: u8 = 0x03;

const IER_RDA: u8 = 0x01;
const IER_THRE: u8 = 0x02;
const IER_MASK: u8 = 0xCF;
const FCR_MASK: u8 = 0xDF;
const FCR_FIFO_ENABLE: u8 = 0x01;
const MCR_MASK: u8 = 0x1F;

/// Flush threshold for output without a newline.
const TX_BUFFER_FLUSH_THRESHOLD: usize = 4096;

/// UART device structure.
pub struct Uart {
    base_addr: u64,
    irq_id: u16,
    rx_queue: VecDeque<u8>,
    input: Option<Receiver<u8>>,
    ier: u8,
    fcr: u8,
    lcr: u8,
    mcr: u8,
    scr: u8,
    div: u16,
    /// Transmitter Holding Register Empty interrupt pending.
    thre_ip: bool,
    tx_buffer: Vec<u8>,
    sink: Box<dyn Write + Send>,
}

impl fmt::Debug for Uart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Uart")
            .field("base_addr", &self.base_addr)
            .field("irq_id", &self.irq_id)
            .field("rx_queued", &self.rx_queue.len())
            .field("ier", &self.ier)
            .field("lcr", &self.lcr)
            .field("tx_buffered", &self.tx_buffer.len())
            .finish_non_exhaustive()
    }
}

impl Uart {
    /// Creates a UART writing to stdout with no input source.
    ///
    /// # Arguments
    ///
    /// * `base_addr` - The base physical address of the UART device.
    /// * `irq_id` - Interrupt source id raised at the interrupt controller.
    pub fn new(base_addr: u64, irq_id: u16) -> Self {
        Self {
            base_addr,
            irq_id,
            rx_queue: VecDeque::new(),
            input: None,
            ier: 0,
            fcr: 0,
            lcr: LCR_RESET,
            mcr: 0,
            scr: 0,
            div: 0,
            thre_ip: false,
            tx_buffer: Vec::new(),
            sink: Box::new(io::stdout()),
        }
    }

    /// Replaces the output sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Box<dyn Write + Send>) -> Self {
        self.sink = sink;
        self
    }

    /// Attaches an input byte source, polled once per clock edge.
    #[must_use]
    pub fn with_input(mut self, input: Receiver<u8>) -> Self {
        self.input = Some(input);
        self
    }

    /// Spawns a thread forwarding host stdin byte by byte; returns its receiving end.
    pub fn stdin_reader() -> Receiver<u8> {
        let (tx, rx) = channel();
        let _reader = thread::spawn(move || {
            let mut buffer = [0u8; 1];
            let mut handle = io::stdin().lock();
            while handle.read_exact(&mut buffer).is_ok() {
                if tx.send(buffer[0]).is_err() {
                    break;
                }
            }
        });
        rx
    }

    /// Bytes received but not yet read by the program.
    pub fn rx_pending(&self) -> usize {
        self.rx_queue.len()
    }

    fn poll_input(&mut self) {
        let Some(rx) = &self.input else {
            return;
        };
        loop {
            match rx.try_recv() {
                Ok(byte) => self.rx_queue.push_back(byte),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.input = None;
                    break;
                }
            }
        }
    }

    /// Highest-priority pending interrupt, as an IIR identity.
    fn interrupt_id(&self) -> u8 {
        if self.ier & IER_RDA != 0 && !self.rx_queue.is_empty() {
            IIR_RDA
        } else if self.ier & IER_THRE != 0 && self.thre_ip {
            IIR_THRE
        } else {
            IIR_NO_INTERRUPT
        }
    }

    fn flush_buffer(&mut self) {
        if self.tx_buffer.is_empty() {
            return;
        }
        if let Err(e) = self
            .sink
            .write_all(&self.tx_buffer)
            .and_then(|()| self.sink.flush())
        {
            tracing::warn!("UART output lost: {e}");
        }
        self.tx_buffer.clear();
    }

    fn dlab_set(&self) -> bool {
        self.lcr & LCR_DLAB != 0
    }

    fn read_reg(&mut self, reg: u64) -> u8 {
        match reg {
            REG_RBR if self.dlab_set() => self.div as u8,
            REG_RBR => self.rx_queue.pop_front().unwrap_or(0),
            REG_IER if self.dlab_set() => (self.div >> 8) as u8,
            REG_IER => self.ier,
            REG_IIR => {
                let id = self.interrupt_id();
                if id == IIR_THRE {
                    self.thre_ip = false;
                }
                let fifo = if self.fcr & FCR_FIFO_ENABLE != 0 {
                    IIR_FIFO_BITS
                } else {
                    0
                };
                fifo | id
            }
            REG_LCR => self.lcr,
            REG_MCR => self.mcr,
            REG_LSR => {
                if self.rx_queue.is_empty() {
                    LSR_DEFAULT
                } else {
                    LSR_DEFAULT | LSR_DATA_READY
                }
            }
            REG_SCR => self.scr,
            // Modem status (offset 6) has no lines to report.
            _ => 0,
        }
    }

    fn write_reg(&mut self, reg: u64, val: u8) {
        match reg {
            REG_THR if self.dlab_set() => self.div = (self.div & 0xFF00) | u16::from(val),
            REG_THR => {
                self.tx_buffer.push(val);
                if val == b'\n' || self.tx_buffer.len() >= TX_BUFFER_FLUSH_THRESHOLD {
                    self.flush_buffer();
                }
                self.thre_ip = true;
            }
            REG_IER if self.dlab_set() => {
                self.div = (self.div & 0x00FF) | (u16::from(val) << 8);
            }
            REG_IER => {
                self.ier = val & IER_MASK;
                if self.ier & IER_THRE != 0 {
                    self.thre_ip = true;
                }
            }
            REG_FCR => self.fcr = val & FCR_MASK,
            REG_LCR => self.lcr = val,
            REG_MCR => self.mcr = val & MCR_MASK,
            REG_SCR => self.scr = val,
            _ => {}
        }
    }
}

impl Drop for Uart {
    fn drop(&mut self) {
        self.flush_buffer();
    }
}

impl Device for Uart {
    fn name(&self) -> &'static str {
        "UART0"
    }

    fn address_range(&self) -> (u64, u64) {
        (self.base_addr, UART_SIZE)
    }

    fn read(&mut self, offset: u64, size: u8) -> u64 {
        (0..access_bytes(size)).fold(0, |acc, i| {
            acc | (u64::from(self.read_reg(offset + i)) << (8 * i))
        })
    }

    fn write(&mut self, offset: u64, value: u64, size: u8, strobe: u8) {
        for i in 0..access_bytes(size) {
            if strobe & (1 << i) != 0 {
                self.write_reg(offset + i, (value >> (8 * i)) as u8);
            }
        }
    }

    /// Drains the input source and drives this UART's interrupt source level.
    fn step(&mut self, irq: &mut IrqLines) {
        self.poll_input();
        irq.set_source_level(self.irq_id, self.interrupt_id() != IIR_NO_INTERRUPT);
    }
}
