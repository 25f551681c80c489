//! Write Engine Unit Tests.
//!
//! Drives the `aw`/`w`/`b` channels of a fabric edge by edge and checks handshakes,
//! strobes, decode errors, response hold, and store-conditional semantics.

use axisim_core::AxiFabric;
use axisim_core::soc::memory::Memory;
use axisim_core::soc::signals::{AxiSignals, Burst, Resp};
use axisim_core::soc::write::WriteState;
use pretty_assertions::assert_eq;

use crate::common::bus::{
    issue_write, locked, read_burst, request, send_beats, take_response, write_burst,
    write_locked, write_one,
};
use crate::common::mocks::device::{CountingDevice, WriteRecord};

const RAM: u64 = 0x8000_0000;

fn fabric_with_ram(size: u64) -> AxiFabric {
    let mut fabric = AxiFabric::new(2);
    let _ = fabric.register(Box::new(Memory::new("RAM", RAM, size).unwrap()));
    fabric
}

// ══════════════════════════════════════════════════════════
// 1. Handshakes and data
// ══════════════════════════════════════════════════════════

#[test]
fn idle_engine_asserts_awready_only() {
    let mut fabric = fabric_with_ram(0x1000);
    let mut sig = AxiSignals::default();
    fabric.step(&mut sig);
    assert!(sig.aw.ready);
    assert!(!sig.w.ready);
    assert!(!sig.b.valid);
}

#[test]
fn accepting_data_asserts_wready_only() {
    let mut fabric = fabric_with_ram(0x1000);
    issue_write(&mut fabric, request(RAM, 3, Burst::Incr, 0));
    assert_eq!(fabric.write_engine().state(), WriteState::AcceptingData);

    let mut sig = AxiSignals::default();
    fabric.step(&mut sig);
    assert!(!sig.aw.ready);
    assert!(sig.w.ready);
    assert!(!sig.b.valid);
}

#[test]
fn single_beat_write_lands_in_memory() {
    let mut fabric = fabric_with_ram(0x1000);
    let mut req = request(RAM + 0x40, 3, Burst::Incr, 0);
    req.id = 0x11;

    issue_write(&mut fabric, req);
    assert_eq!(send_beats(&mut fabric, &[(0xDEAD_BEEF_CAFE_F00D, 0xFF)]), 1);
    let (resp, id) = take_response(&mut fabric);

    assert_eq!(resp, Resp::Okay);
    assert_eq!(id, 0x11);
    assert_eq!(fabric.backdoor_read(RAM + 0x40, 3), Some(0xDEAD_BEEF_CAFE_F00D));
    assert_eq!(fabric.write_engine().state(), WriteState::Idle);
}

#[test]
fn strobe_limits_written_bytes() {
    let mut fabric = fabric_with_ram(0x1000);
    assert!(fabric.backdoor_write(RAM, 0x1111_1111_1111_1111, 3));

    let resp = write_burst(
        &mut fabric,
        request(RAM, 3, Burst::Incr, 0),
        &[(0xAABB_CCDD_EEFF_0011, 0b1000_0001)],
    );

    assert_eq!(resp, Resp::Okay);
    assert_eq!(fabric.backdoor_read(RAM, 3), Some(0xAA11_1111_1111_1111));
}

#[test]
fn incr_burst_writes_each_beat() {
    let mut fabric = fabric_with_ram(0x1000);
    let beats: Vec<(u64, u8)> = (0..4u64).map(|i| (0x100 + i, 0xFF)).collect();

    let resp = write_burst(&mut fabric, request(RAM + 0x20, 3, Burst::Incr, 3), &beats);

    assert_eq!(resp, Resp::Okay);
    for i in 0..4u64 {
        assert_eq!(fabric.backdoor_read(RAM + 0x20 + i * 8, 3), Some(0x100 + i));
    }
    assert_eq!(fabric.stats().write_beats, 4);
}

#[test]
fn device_sees_offset_size_and_strobe() {
    let mut fabric = AxiFabric::new(2);
    let (dev, probe) = CountingDevice::new(0x4000, 0x1000);
    let _ = fabric.register(Box::new(dev));

    let _ = write_burst(
        &mut fabric,
        request(0x4010, 2, Burst::Fixed, 1),
        &[(0x1, 0x3), (0x2, 0xF)],
    );

    assert_eq!(
        probe.writes(),
        vec![
            WriteRecord {
                offset: 0x10,
                value: 0x1,
                size: 2,
                strobe: 0x3,
            },
            WriteRecord {
                offset: 0x10,
                value: 0x2,
                size: 2,
                strobe: 0xF,
            },
        ]
    );
}

#[test]
fn response_is_held_until_bready() {
    let mut fabric = fabric_with_ram(0x1000);
    let mut req = request(RAM, 3, Burst::Incr, 0);
    req.id = 0x7;
    issue_write(&mut fabric, req);
    let _ = send_beats(&mut fabric, &[(1, 0xFF)]);

    for _ in 0..4 {
        let mut sig = AxiSignals::default();
        fabric.step(&mut sig);
        assert!(sig.b.valid);
        assert_eq!(sig.b.id, 0x7);
        assert!(!sig.aw.ready);
        assert!(!sig.w.ready);
    }
    assert_eq!(fabric.write_engine().state(), WriteState::Responding);
    let (resp, _) = take_response(&mut fabric);
    assert_eq!(resp, Resp::Okay);
    assert_eq!(fabric.write_engine().state(), WriteState::Idle);
}

#[test]
fn early_wlast_ends_data_phase() {
    let mut fabric = fabric_with_ram(0x1000);
    issue_write(&mut fabric, request(RAM + 0x40, 3, Burst::Incr, 3));

    // Two beats of four, wlast on the second.
    let taken = send_beats(&mut fabric, &[(0x11, 0xFF), (0x22, 0xFF)]);

    assert_eq!(taken, 2);
    assert_eq!(fabric.write_engine().state(), WriteState::Responding);
    let mut sig = AxiSignals::default();
    fabric.step(&mut sig);
    assert!(!sig.w.ready);
    assert!(sig.b.valid);

    let (resp, id) = take_response(&mut fabric);
    assert_eq!((resp, id), (Resp::Okay, 0x5));
    assert_eq!(fabric.write_engine().state(), WriteState::Idle);
    assert_eq!(fabric.backdoor_read(RAM + 0x40, 3), Some(0x11));
    assert_eq!(fabric.backdoor_read(RAM + 0x48, 3), Some(0x22));
    assert_eq!(fabric.backdoor_read(RAM + 0x50, 3), Some(0));
    assert_eq!(fabric.stats().write_beats, 2);
}

// ══════════════════════════════════════════════════════════
// 2. Decode errors
// ══════════════════════════════════════════════════════════

#[test]
fn unmapped_write_answers_decerr_after_first_beat() {
    let mut fabric = fabric_with_ram(0x1000);
    issue_write(&mut fabric, request(0x10, 3, Burst::Incr, 3));

    let taken = send_beats(&mut fabric, &[(1, 0xFF), (2, 0xFF), (3, 0xFF), (4, 0xFF)]);
    let (resp, _) = take_response(&mut fabric);

    assert_eq!(taken, 1);
    assert_eq!(resp, Resp::DecErr);
    assert_eq!(fabric.stats().write_decode_errors, 1);
}

#[test]
fn page_crossing_write_stops_at_boundary() {
    let mut fabric = AxiFabric::new(2);
    let _ = fabric.register(Box::new(Memory::new("RAM", 0x1000, 0x2000).unwrap()));

    issue_write(&mut fabric, request(0x1FF8, 3, Burst::Incr, 2));
    let taken = send_beats(&mut fabric, &[(0xA, 0xFF), (0xB, 0xFF), (0xC, 0xFF)]);
    let (resp, _) = take_response(&mut fabric);

    assert_eq!(taken, 2);
    assert_eq!(resp, Resp::DecErr);
    assert_eq!(fabric.backdoor_read(0x1FF8, 3), Some(0xA));
    assert_eq!(fabric.backdoor_read(0x2000, 3), Some(0));
}

// ══════════════════════════════════════════════════════════
// 3. Exclusive writes
// ══════════════════════════════════════════════════════════

#[test]
fn exclusive_pair_succeeds() {
    let mut fabric = fabric_with_ram(0x1000);
    let _ = read_burst(&mut fabric, locked(RAM, 3));

    let resp = write_locked(&mut fabric, RAM, 0x42, 3);

    assert_eq!(resp, Resp::ExOkay);
    assert_eq!(fabric.backdoor_read(RAM, 3), Some(0x42));
    assert!(!fabric.monitor().hit(RAM));
    assert_eq!(fabric.stats().exclusive_write_success, 1);
}

#[test]
fn intervening_write_breaks_reservation() {
    let mut fabric = fabric_with_ram(0x1000);
    let _ = read_burst(&mut fabric, locked(RAM, 3));

    assert_eq!(write_one(&mut fabric, RAM, 0x1, 3), Resp::Okay);
    let resp = write_locked(&mut fabric, RAM, 0x2, 3);

    assert_eq!(resp, Resp::Okay);
    assert_eq!(fabric.backdoor_read(RAM, 3), Some(0x1));
    assert_eq!(fabric.stats().exclusive_write_failure, 1);
}

#[test]
fn overlapping_narrow_write_breaks_reservation() {
    let mut fabric = fabric_with_ram(0x1000);
    let _ = read_burst(&mut fabric, locked(RAM, 3));

    assert_eq!(write_one(&mut fabric, RAM + 6, 0xFF, 0), Resp::Okay);

    assert!(!fabric.monitor().hit(RAM));
    assert_eq!(write_locked(&mut fabric, RAM, 0x2, 3), Resp::Okay);
}

#[test]
fn adjacent_write_keeps_reservation() {
    let mut fabric = fabric_with_ram(0x1000);
    let _ = read_burst(&mut fabric, locked(RAM, 3));

    assert_eq!(write_one(&mut fabric, RAM + 8, 0xFF, 3), Resp::Okay);

    assert_eq!(write_locked(&mut fabric, RAM, 0x2, 3), Resp::ExOkay);
}

#[test]
fn locked_write_without_reservation_is_dropped() {
    let mut fabric = fabric_with_ram(0x1000);
    assert!(fabric.backdoor_write(RAM + 0x10, 0x99, 3));

    let resp = write_locked(&mut fabric, RAM + 0x10, 0x5, 3);

    assert_eq!(resp, Resp::Okay);
    assert_eq!(fabric.backdoor_read(RAM + 0x10, 3), Some(0x99));
}

#[test]
fn locked_write_needs_exact_start_address() {
    let mut fabric = fabric_with_ram(0x1000);
    let _ = read_burst(&mut fabric, locked(RAM, 3));

    let resp = write_locked(&mut fabric, RAM + 4, 0x5, 2);

    assert_eq!(resp, Resp::Okay);
    assert_eq!(fabric.backdoor_read(RAM + 4, 2), Some(0));
    assert!(!fabric.monitor().conflicts(RAM, 3));
}

#[test]
fn evicted_reservation_fails_store_conditional() {
    let mut fabric = fabric_with_ram(0x1000);
    for addr in [RAM, RAM + 0x40, RAM + 0x80] {
        let _ = read_burst(&mut fabric, locked(addr, 3));
    }
    assert_eq!(fabric.stats().reservations_evicted, 1);

    assert_eq!(write_locked(&mut fabric, RAM, 0x1, 3), Resp::Okay);
    assert_eq!(write_locked(&mut fabric, RAM + 0x40, 0x1, 3), Resp::ExOkay);
    assert_eq!(write_locked(&mut fabric, RAM + 0x80, 0x1, 3), Resp::ExOkay);
}
