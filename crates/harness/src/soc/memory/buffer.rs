//! Flat Memory Buffer.
//!
//! This module provides a safe wrapper around raw memory allocation for the
//! flat backing stores (RAM and boot flash). It uses `mmap` on Unix systems
//! for lazy, page-aligned allocation: pages are only materialized by the OS
//! when first touched, so a multi-hundred-megabyte store costs nothing until
//! the guest actually uses it.

use std::slice;

/// A wrapper around a raw page-aligned memory buffer.
///
/// On Unix systems this uses `mmap` to allocate anonymous memory; on other
/// platforms it falls back to a heap `Vec`.
pub struct PmemBuffer {
    ptr: *mut u8,
    size: usize,
    is_mmap: bool,
}

// SAFETY: the buffer owns its allocation exclusively; all access goes
// through bounds-checked methods.
unsafe impl Send for PmemBuffer {}
unsafe impl Sync for PmemBuffer {}

impl PmemBuffer {
    /// Creates a new zero-filled buffer of the specified size.
    ///
    /// On Unix, uses `mmap` for lazy allocation; panics if `mmap` fails.
    ///
    /// # Arguments
    ///
    /// * `size` - Size of the buffer in bytes.
    pub fn new(size: usize) -> Self {
        #[cfg(unix)]
        {
            use std::ptr;
            // SAFETY: anonymous private mapping with no file descriptor;
            // the result is checked against MAP_FAILED before use.
            let ptr = unsafe {
                libc::mmap(
                    ptr::null_mut(),
                    size,
                    libc::PROT_READ | libc::PROT_WRITE,
                    libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                    -1,
                    0,
                )
            };

            assert!(
                ptr != libc::MAP_FAILED,
                "failed to mmap memory buffer of size {}",
                size
            );

            Self {
                ptr: ptr.cast::<u8>(),
                size,
                is_mmap: true,
            }
        }

        #[cfg(not(unix))]
        {
            let mut vec = vec![0u8; size];
            let ptr = vec.as_mut_ptr();
            std::mem::forget(vec);
            Self {
                ptr,
                size,
                is_mmap: false,
            }
        }
    }

    /// Returns the size of the buffer in bytes.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns `true` if the buffer has zero size.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Reads a single byte.
    pub fn read_u8(&self, offset: usize) -> u8 {
        assert!(offset < self.size, "pmem read out of bounds: {:#x}", offset);
        // SAFETY: offset checked against the allocation size above.
        unsafe { *self.ptr.add(offset) }
    }

    /// Writes a single byte.
    pub fn write_u8(&self, offset: usize, val: u8) {
        assert!(offset < self.size, "pmem write out of bounds: {:#x}", offset);
        // SAFETY: offset checked against the allocation size above.
        unsafe {
            *self.ptr.add(offset) = val;
        }
    }

    /// Reads a little-endian doubleword at any (also unaligned) offset.
    pub fn read_u64(&self, offset: usize) -> u64 {
        assert!(
            offset + 8 <= self.size,
            "pmem read out of bounds: {:#x}",
            offset
        );
        // SAFETY: the full 8-byte span is in bounds; read_unaligned places
        // no alignment requirement on the pointer.
        u64::from_le(unsafe { self.ptr.add(offset).cast::<u64>().read_unaligned() })
    }

    /// Reads a little-endian word at any (also unaligned) offset.
    pub fn read_u32(&self, offset: usize) -> u32 {
        assert!(
            offset + 4 <= self.size,
            "pmem read out of bounds: {:#x}",
            offset
        );
        // SAFETY: the full 4-byte span is in bounds; read_unaligned places
        // no alignment requirement on the pointer.
        u32::from_le(unsafe { self.ptr.add(offset).cast::<u32>().read_unaligned() })
    }

    /// Reads a slice of memory.
    pub fn read_slice(&self, offset: usize, len: usize) -> &[u8] {
        assert!(
            offset + len <= self.size,
            "pmem read out of bounds: {:#x}",
            offset
        );
        // SAFETY: the span is in bounds and the buffer outlives the borrow.
        unsafe { slice::from_raw_parts(self.ptr.add(offset), len) }
    }

    /// Writes a slice of memory.
    pub fn write_slice(&self, offset: usize, data: &[u8]) {
        assert!(
            offset + data.len() <= self.size,
            "pmem write out of bounds: {:#x}",
            offset
        );
        // SAFETY: the span is in bounds and source/destination cannot
        // overlap (data is a safe Rust slice from elsewhere).
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), self.ptr.add(offset), data.len());
        }
    }
}

impl Drop for PmemBuffer {
    /// Deallocates the buffer (munmap on Unix, Vec reconstruction otherwise).
    fn drop(&mut self) {
        if self.is_mmap {
            #[cfg(unix)]
            // SAFETY: ptr/size are exactly the values returned by mmap.
            unsafe {
                libc::munmap(self.ptr.cast(), self.size);
            }
        } else {
            #[cfg(not(unix))]
            // SAFETY: ptr/size were produced by a forgotten Vec of this size.
            unsafe {
                let _ = Vec::from_raw_parts(self.ptr, self.size, self.size);
            }
        }
    }
}
