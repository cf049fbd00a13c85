//! Physical System Memory.
//!
//! This module implements the flat byte-addressable store backing the
//! simulated design's RAM. It provides:
//! 1. **Buffer:** A page-aligned, lazily allocated backing buffer.
//! 2. **Ram:** The device implementation with unaligned doubleword reads,
//!    per-byte masked stores, and open-bus sentinel semantics.
//! 3. **Image loading:** Boot image at offset zero plus an optional ramdisk
//!    image placed in the dedicated region above RAM.

/// Page-aligned flat buffer (mmap-backed on Unix).
pub mod buffer;

use self::buffer::PmemBuffer;
use crate::common::constants::{PMEM_SIZE, RAM_SIZE, UNMAPPED_SENTINEL};
use crate::loader;
use crate::soc::traits::Device;
use std::fs;
use tracing::debug;

/// Byte-addressable system RAM with an appended ramdisk region.
///
/// The store is allocated once at construction with a compile-time size and
/// never reallocates. Reads of offsets past the end return the open-bus
/// sentinel; writes past the end are dropped.
pub struct Ram {
    /// Backing buffer (RAM followed by the ramdisk region).
    buffer: PmemBuffer,
    /// The base physical address where this memory is mapped.
    base_addr: u64,
}

impl Ram {
    /// Creates system RAM mapped at the given base address.
    ///
    /// # Arguments
    ///
    /// * `base_addr` - Starting physical address of the RAM window.
    pub fn new(base_addr: u64) -> Self {
        Self {
            buffer: PmemBuffer::new(PMEM_SIZE),
            base_addr,
        }
    }

    /// Loads the boot image at offset zero; aborts if the image is missing.
    ///
    /// Also looks for a companion `<stem>-ramdisk.img` next to the primary
    /// image and, when present, places it at the start of the ramdisk region
    /// above RAM. A missing ramdisk is not an error.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the primary boot image.
    ///
    /// # Returns
    ///
    /// The size of the primary image in bytes.
    pub fn load_image(&mut self, path: &str) -> usize {
        let image = loader::load_binary(path);
        self.buffer.write_slice(0, &image);

        if let Some(ramdisk_path) = loader::companion_path(path, "-ramdisk.img") {
            if let Ok(ramdisk) = fs::read(&ramdisk_path) {
                debug!(path = %ramdisk_path, size = ramdisk.len(), "found ramdisk");
                self.buffer.write_slice(RAM_SIZE, &ramdisk);
            }
        }

        image.len()
    }
}

impl Device for Ram {
    /// Returns the device name.
    fn name(&self) -> &str {
        "PMEM"
    }

    /// Returns the address range (Base, Size).
    fn address_range(&self) -> (u64, u64) {
        (self.base_addr, self.buffer.len() as u64)
    }

    /// Reads a byte; returns the sentinel when out of range.
    fn read_u8(&mut self, offset: u64) -> u8 {
        let i = offset as usize;
        if i < self.buffer.len() {
            self.buffer.read_u8(i)
        } else {
            UNMAPPED_SENTINEL as u8
        }
    }

    /// Reads a word (little-endian); returns the sentinel when out of range.
    fn read_u32(&mut self, offset: u64) -> u32 {
        let i = offset as usize;
        if i + 4 <= self.buffer.len() {
            self.buffer.read_u32(i)
        } else {
            UNMAPPED_SENTINEL as u32
        }
    }

    /// Reads a doubleword (little-endian) at any alignment; returns the
    /// sentinel when the 8-byte span is out of range.
    fn read_u64(&mut self, offset: u64) -> u64 {
        let i = offset as usize;
        if i + 8 <= self.buffer.len() {
            self.buffer.read_u64(i)
        } else {
            UNMAPPED_SENTINEL
        }
    }

    /// Writes a byte; out-of-range writes are dropped.
    fn write_u8(&mut self, offset: u64, val: u8) {
        let i = offset as usize;
        if i < self.buffer.len() {
            self.buffer.write_u8(i, val);
        }
    }

    /// Writes a word (little-endian); out-of-range writes are dropped.
    fn write_u32(&mut self, offset: u64, val: u32) {
        self.write_u64_masked(offset, u64::from(val), 0x0F);
    }

    /// Writes a doubleword (little-endian); out-of-range writes are dropped.
    fn write_u64(&mut self, offset: u64, val: u64) {
        self.write_u64_masked(offset, val, 0xFF);
    }

    /// Stores byte `i` of `val` at `offset + i` iff bit `i` of `mask` is
    /// set, independent of alignment. Bytes falling past the end of the
    /// store are dropped.
    fn write_u64_masked(&mut self, offset: u64, val: u64, mask: u8) {
        let base = offset as usize;
        if base >= self.buffer.len() {
            return;
        }
        for i in 0..8 {
            if mask & (1 << i) != 0 && base + i < self.buffer.len() {
                self.buffer.write_u8(base + i, (val >> (i * 8)) as u8);
            }
        }
    }

    /// Writes a slice of bytes; spans past the end are dropped entirely.
    fn write_bytes(&mut self, offset: u64, data: &[u8]) {
        let i = offset as usize;
        if i + data.len() <= self.buffer.len() {
            self.buffer.write_slice(i, data);
        }
    }
}
