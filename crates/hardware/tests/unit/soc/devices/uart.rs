//! UART (16550) Unit Tests.
//!
//! Verifies transmit buffering and flushing, receive through the input channel, the
//! line/interrupt status registers, the divisor latch, and the interrupt source level.

use std::sync::mpsc::channel;

use axisim_core::soc::devices::Uart;
use axisim_core::soc::devices::uart::UART_SIZE;
use axisim_core::soc::traits::{Device, IrqLines};
use pretty_assertions::assert_eq;

use crate::common::mocks::sink::SharedSink;

const THR: u64 = 0;
const IER: u64 = 1;
const IIR: u64 = 2;
const LCR: u64 = 3;
const MCR: u64 = 4;
const LSR: u64 = 5;
const SCR: u64 = 7;

const IRQ: u16 = 10;

fn uart() -> (Uart, SharedSink) {
    let sink = SharedSink::new();
    let uart = Uart::new(0x1000_0000, IRQ).with_sink(Box::new(sink.clone()));
    (uart, sink)
}

fn put(uart: &mut Uart, reg: u64, val: u8) {
    uart.write(reg, u64::from(val), 0, 0x1);
}

fn get(uart: &mut Uart, reg: u64) -> u8 {
    uart.read(reg, 0) as u8
}

fn source_level(uart: &mut Uart) -> bool {
    let mut irq = IrqLines::default();
    uart.step(&mut irq);
    assert_eq!(irq.sources.len(), 1);
    assert_eq!(irq.sources[0].0, IRQ);
    irq.sources[0].1
}

// ══════════════════════════════════════════════════════════
// 1. Transmit
// ══════════════════════════════════════════════════════════

#[test]
fn uart_identity() {
    let (uart, _) = uart();
    assert_eq!(uart.name(), "UART0");
    assert_eq!(uart.address_range(), (0x1000_0000, UART_SIZE));
}

#[test]
fn uart_output_is_flushed_at_newline() {
    let (mut uart, sink) = uart();
    for b in b"hi" {
        put(&mut uart, THR, *b);
    }
    assert_eq!(sink.contents(), "");

    put(&mut uart, THR, b'\n');
    assert_eq!(sink.contents(), "hi\n");
    assert!(sink.flushes() >= 1);
}

#[test]
fn uart_pending_output_is_flushed_on_drop() {
    let (mut uart, sink) = uart();
    put(&mut uart, THR, b'x');
    drop(uart);
    assert_eq!(sink.contents(), "x");
}

#[test]
fn uart_large_output_flushes_without_newline() {
    let (mut uart, sink) = uart();
    for _ in 0..4096 {
        put(&mut uart, THR, b'a');
    }
    assert_eq!(sink.contents().len(), 4096);
}

#[test]
fn uart_wide_write_sends_enabled_bytes_in_order() {
    let (mut uart, sink) = uart();
    // Byte i goes to register offset + i; only THR (byte 0) and SCR (byte 7) are enabled.
    uart.write(THR, 0x4200_0000_0000_0041, 3, 0b1000_0001);
    assert_eq!(get(&mut uart, SCR), 0x42);
    drop(uart);
    assert_eq!(sink.contents(), "A");
}

// ══════════════════════════════════════════════════════════
// 2. Status and control registers
// ══════════════════════════════════════════════════════════

#[test]
fn uart_reset_state() {
    let (mut uart, _) = uart();
    assert_eq!(get(&mut uart, LCR), 0x03);
    assert_eq!(get(&mut uart, LSR), 0x60);
    assert_eq!(get(&mut uart, IIR), 0x01);
    assert_eq!(get(&mut uart, IER), 0x00);
}

#[test]
fn uart_register_masks() {
    let (mut uart, _) = uart();
    put(&mut uart, IER, 0xFF);
    assert_eq!(get(&mut uart, IER), 0xCF);
    put(&mut uart, MCR, 0xFF);
    assert_eq!(get(&mut uart, MCR), 0x1F);
    put(&mut uart, SCR, 0x5A);
    assert_eq!(get(&mut uart, SCR), 0x5A);
}

#[test]
fn uart_fifo_enable_sets_iir_high_bits() {
    let (mut uart, _) = uart();
    put(&mut uart, IIR, 0x01);
    assert_eq!(get(&mut uart, IIR), 0xC1);
}

#[test]
fn uart_divisor_latch() {
    let (mut uart, sink) = uart();
    put(&mut uart, LCR, 0x83);
    put(&mut uart, THR, 0x34);
    put(&mut uart, IER, 0x12);
    assert_eq!(get(&mut uart, THR), 0x34);
    assert_eq!(get(&mut uart, IER), 0x12);

    put(&mut uart, LCR, 0x03);
    assert_eq!(get(&mut uart, IER), 0x00);
    drop(uart);
    assert_eq!(sink.contents(), "");
}

#[test]
fn uart_thre_interrupt_clears_on_iir_read() {
    let (mut uart, _) = uart();
    put(&mut uart, IER, 0x02);
    assert!(source_level(&mut uart));

    assert_eq!(get(&mut uart, IIR), 0x02);
    assert!(!source_level(&mut uart));
    assert_eq!(get(&mut uart, IIR), 0x01);

    put(&mut uart, THR, b'.');
    assert!(source_level(&mut uart));
}

// ══════════════════════════════════════════════════════════
// 3. Receive
// ══════════════════════════════════════════════════════════

#[test]
fn uart_receives_from_input_channel() {
    let (tx, rx) = channel();
    let (uart, _) = uart();
    let mut uart = uart.with_input(rx);

    for b in b"ok" {
        tx.send(*b).unwrap();
    }
    assert!(!source_level(&mut uart));
    assert_eq!(uart.rx_pending(), 2);
    assert_eq!(get(&mut uart, LSR) & 0x01, 0x01);

    assert_eq!(get(&mut uart, THR), b'o');
    assert_eq!(get(&mut uart, THR), b'k');
    assert_eq!(get(&mut uart, LSR) & 0x01, 0x00);
    assert_eq!(get(&mut uart, THR), 0);
}

#[test]
fn uart_rx_interrupt_follows_queue() {
    let (tx, rx) = channel();
    let (uart, _) = uart();
    let mut uart = uart.with_input(rx);
    put(&mut uart, IER, 0x01);

    assert!(!source_level(&mut uart));
    tx.send(b'z').unwrap();
    assert!(source_level(&mut uart));
    assert_eq!(get(&mut uart, IIR), 0x04);

    let _ = get(&mut uart, THR);
    assert!(!source_level(&mut uart));
}

#[test]
fn uart_closed_input_is_tolerated() {
    let (tx, rx) = channel::<u8>();
    let (uart, _) = uart();
    let mut uart = uart.with_input(rx);
    tx.send(b'q').unwrap();
    drop(tx);

    let _ = source_level(&mut uart);
    let _ = source_level(&mut uart);
    assert_eq!(get(&mut uart, THR), b'q');
}
