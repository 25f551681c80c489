//! Configuration Unit Tests.
//!
//! Verifies defaults, partial JSON documents, unknown-field rejection, validation, and
//! loading from files.

use std::io::Write;
use std::path::PathBuf;

use axisim_core::{Config, SimError};
use pretty_assertions::assert_eq;
use rstest::rstest;
use tempfile::NamedTempFile;

#[test]
fn default_platform_map() {
    let config = Config::default();
    assert_eq!(config.system.rom_base, 0x1000);
    assert_eq!(config.system.rom_size, 32 * 1024);
    assert_eq!(config.system.ram_base, 0x8000_0000);
    assert_eq!(config.system.ram_size, 8 * 1024 * 1024);
    assert_eq!(config.system.uart_base, 0x1000_0000);
    assert_eq!(config.system.clint_base, 0x0200_0000);
    assert_eq!(config.system.plic_base, 0x0C00_0000);
    assert_eq!(config.system.uart_irq, 10);
    assert!(!config.system.uart_stdin);
    assert_eq!(config.bus.max_reservations, 2);
    assert!(!config.bus.reject_overlapping_ranges);
    assert_eq!(config.sim.max_clock, 0x400);
    assert_eq!(config.sim.reset_cycles, 4);
    assert!(config.sim.ram_dump.is_none());
    config.validate().unwrap();
}

#[test]
fn empty_document_is_the_default() {
    let config = Config::from_json_str("{}").unwrap();
    assert_eq!(config.system.ram_base, Config::default().system.ram_base);
    assert_eq!(config.sim.max_clock, Config::default().sim.max_clock);
}

#[test]
fn partial_sections_keep_other_defaults() {
    let config = Config::from_json_str(
        r#"{
            "system": { "uart_base": 268435712, "clint_divider": 8 },
            "sim": { "max_clock": 5000, "ram_dump": "out/ram.bin" }
        }"#,
    )
    .unwrap();

    assert_eq!(config.system.uart_base, 0x1000_0100);
    assert_eq!(config.system.clint_divider, 8);
    assert_eq!(config.system.ram_base, 0x8000_0000);
    assert_eq!(config.sim.max_clock, 5000);
    assert_eq!(config.sim.reset_cycles, 4);
    assert_eq!(config.sim.ram_dump, Some(PathBuf::from("out/ram.bin")));
}

#[rstest]
#[case(r#"{ "system": { "ram_sz": 4096 } }"#)]
#[case(r#"{ "cpu": {} }"#)]
#[case(r#"{ "bus": { "max_reservations": -1 } }"#)]
#[case("{ not json")]
fn malformed_documents_are_parse_errors(#[case] json: &str) {
    let err = Config::from_json_str(json).unwrap_err();
    assert!(matches!(err, SimError::ConfigParse(_)), "{err}");
}

#[rstest]
#[case(r#"{ "system": { "ram_size": 0 } }"#)]
#[case(r#"{ "system": { "ram_size": 6000 } }"#)]
#[case(r#"{ "system": { "rom_size": 2048 } }"#)]
#[case(r#"{ "bus": { "max_reservations": 0 } }"#)]
fn unusable_values_fail_validation(#[case] json: &str) {
    let err = Config::from_json_str(json).unwrap_err();
    assert!(matches!(err, SimError::InvalidConfig(_)), "{err}");
}

#[test]
fn from_file_reads_json() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{ "bus": {{ "max_reservations": 8 }} }}"#).unwrap();

    let config = Config::from_file(file.path()).unwrap();

    assert_eq!(config.bus.max_reservations, 8);
}

#[test]
fn from_file_missing_is_io_error() {
    let err = Config::from_file("/nonexistent/axisim.json").unwrap_err();
    match err {
        SimError::Io { path, .. } => assert_eq!(path, PathBuf::from("/nonexistent/axisim.json")),
        other => panic!("unexpected error: {other}"),
    }
}
