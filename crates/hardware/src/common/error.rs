//! Harness Error Definitions.
//!
//! Faults on the simulated bus never surface here: a bad address or a page-crossing beat is
//! answered on the bus with a decode-error response and the simulation keeps running.
//! `SimError` covers the host side of the harness instead:
//! 1. **Configuration:** Malformed JSON or values the fabric cannot honour.
//! 2. **Images:** Unreadable files, malformed ELF, segments that do not fit their memory.
//! 3. **Registration:** Overlapping ranges when checked registration is requested.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while configuring, loading, or tearing down a simulation.
#[derive(Debug, Error)]
pub enum SimError {
    /// A file could not be read or written.
    #[error("i/o error on '{}': {source}", path.display())]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// A configuration value is outside what the harness supports.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The program image is not a well-formed ELF file.
    #[error("malformed ELF image: {0}")]
    Elf(#[from] object::read::Error),

    /// The program image parses but its contents are inconsistent.
    #[error("malformed ELF image: {0}")]
    BadImage(String),

    /// The program image was built for another architecture.
    #[error("ELF machine type {0:#x} is not RISC-V")]
    WrongMachine(u16),

    /// A loadable segment does not fit inside the target memory.
    #[error(
        "segment at {addr:#x} ({len:#x} bytes) is outside memory {base:#x}..{end:#x}"
    )]
    SegmentOutOfBounds {
        /// Physical address of the segment.
        addr: u64,
        /// File size of the segment.
        len: u64,
        /// Base address of the target memory.
        base: u64,
        /// End address (exclusive) of the target memory.
        end: u64,
    },

    /// The host could not provide backing storage for a memory device.
    #[error("cannot allocate {size:#x} bytes of device memory: {source}")]
    Alloc {
        /// Requested size in bytes.
        size: usize,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// A device was registered over a range another device already claims.
    #[error("device '{name}' at {base:#x}+{len:#x} overlaps '{existing}'")]
    OverlappingRange {
        /// Name of the device being registered.
        name: String,
        /// Base address of the rejected range.
        base: u64,
        /// Length of the rejected range.
        len: u64,
        /// Name of the device already owning part of the range.
        existing: String,
    },
}

impl SimError {
    /// Wraps an IO error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
