//! Backing storage for memory devices.
//!
//! On Unix the bytes live in an anonymous private `mmap`, so an 8 MiB RAM only costs
//! host memory for the pages the program actually touches. Other platforms (and empty
//! buffers) fall back to a zeroed heap allocation. The buffer is owned exclusively by its
//! memory device and is exposed as ordinary slices.

use std::ptr::NonNull;
use std::slice;

use crate::common::SimError;

/// Zero-initialised, fixed-size byte buffer.
#[derive(Debug)]
pub struct MemBuffer {
    ptr: NonNull<u8>,
    size: usize,
    is_mmap: bool,
}

// SAFETY: the buffer is uniquely owned; access goes through `&self`/`&mut self` slices.
unsafe impl Send for MemBuffer {}
// SAFETY: shared access only hands out `&[u8]`.
unsafe impl Sync for MemBuffer {}

impl MemBuffer {
    /// Allocates `size` zeroed bytes.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Alloc`] if the host refuses the mapping.
    pub fn new(size: usize) -> Result<Self, SimError> {
        #[cfg(unix)]
        {
            if size > 0 {
                // SAFETY: anonymous private mapping with no address hint; the result is
                // checked against MAP_FAILED before use.
                let ptr = unsafe {
                    libc::mmap(
                        std::ptr::null_mut(),
                        size,
                        libc::PROT_READ | libc::PROT_WRITE,
                        libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                        -1,
                        0,
                    )
                };
                if ptr == libc::MAP_FAILED {
                    return Err(SimError::Alloc {
                        size,
                        source: std::io::Error::last_os_error(),
                    });
                }
                if let Some(ptr) = NonNull::new(ptr.cast::<u8>()) {
                    return Ok(Self {
                        ptr,
                        size,
                        is_mmap: true,
                    });
                }
            }
        }

        let boxed: Box<[u8]> = vec![0u8; size].into_boxed_slice();
        let raw = Box::into_raw(boxed).cast::<u8>();
        // SAFETY: Box::into_raw never returns null.
        let ptr = unsafe { NonNull::new_unchecked(raw) };
        Ok(Self {
            ptr,
            size,
            is_mmap: false,
        })
    }

    /// Size of the buffer in bytes.
    pub fn len(&self) -> usize {
        self.size
    }

    /// True for a zero-sized buffer.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// The whole buffer.
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: `ptr` is valid for `size` initialised bytes for the life of `self`.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.size) }
    }

    /// The whole buffer, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: as above, and `&mut self` guarantees exclusive access.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.size) }
    }

    /// Zeroes every byte.
    pub fn clear(&mut self) {
        self.as_mut_slice().fill(0);
    }
}

impl Drop for MemBuffer {
    fn drop(&mut self) {
        if self.is_mmap {
            #[cfg(unix)]
            // SAFETY: `ptr`/`size` are exactly what mmap returned and it is unmapped once.
            unsafe {
                let _ = libc::munmap(self.ptr.as_ptr().cast(), self.size);
            }
        } else {
            // SAFETY: rebuilds the boxed slice leaked in `new`, with its original length.
            unsafe {
                let raw = std::ptr::slice_from_raw_parts_mut(self.ptr.as_ptr(), self.size);
                drop(Box::from_raw(raw));
            }
        }
    }
}
