//! Program Image Loader.
//!
//! This module places RISC-V ELF64 images into memory devices. It performs:
//! 1. **Validation:** Rejects non-ELF64 files and machines other than RISC-V.
//! 2. **Segment copy:** Copies each `PT_LOAD` segment's file bytes to its physical address.
//! 3. **Bounds:** Refuses segments that do not fit inside the target memory.
//!
//! Bytes between a segment's file size and memory size are left as they are; a freshly
//! created memory is already zero.

use std::fs;
use std::path::Path;

use object::Endianness;
use object::elf::{EM_RISCV, FileHeader64, PT_LOAD};
use object::read::elf::{FileHeader, ProgramHeader};

use crate::common::SimError;
use crate::soc::memory::Memory;
use crate::soc::traits::Device;

/// Loads the ELF image in `bytes` into `memory`; returns the entry point.
///
/// # Errors
///
/// * [`SimError::Elf`] if the bytes are not an ELF64 file.
/// * [`SimError::WrongMachine`] if the image is not for RISC-V.
/// * [`SimError::BadImage`] if a segment's file range lies outside the file.
/// * [`SimError::SegmentOutOfBounds`] if a segment does not fit in `memory`.
pub fn load_elf(memory: &mut Memory, bytes: &[u8]) -> Result<u64, SimError> {
    let header = FileHeader64::<Endianness>::parse(bytes)?;
    let endian = header.endian()?;

    let machine = header.e_machine(endian);
    if machine != EM_RISCV {
        return Err(SimError::WrongMachine(machine));
    }

    for ph in header.program_headers(endian, bytes)? {
        if ph.p_type(endian) != PT_LOAD {
            continue;
        }
        let paddr = ph.p_paddr(endian);
        let offset = ph.p_offset(endian);
        let filesz = ph.p_filesz(endian);
        if filesz == 0 {
            tracing::debug!("skipping empty segment at {paddr:#x}");
            continue;
        }
        let segment = usize::try_from(offset)
            .ok()
            .zip(usize::try_from(filesz).ok())
            .and_then(|(start, len)| bytes.get(start..start.checked_add(len)?))
            .ok_or_else(|| {
                SimError::BadImage(format!(
                    "segment file range {offset:#x}+{filesz:#x} exceeds image size {:#x}",
                    bytes.len()
                ))
            })?;
        memory.load_at(paddr, segment)?;
        tracing::debug!("loaded segment {paddr:#x}+{filesz:#x}");
    }

    Ok(header.e_entry(endian))
}

/// Reads the ELF file at `path` and loads it into `memory`; returns the entry point.
///
/// # Errors
///
/// [`SimError::Io`] if the file cannot be read, otherwise as [`load_elf`].
pub fn load_elf_file(memory: &mut Memory, path: &Path) -> Result<u64, SimError> {
    let bytes = fs::read(path).map_err(|e| SimError::io(path, e))?;
    let entry = load_elf(memory, &bytes)?;
    tracing::info!(
        "loaded {} into {} (entry {entry:#x})",
        path.display(),
        memory.name()
    );
    Ok(entry)
}
