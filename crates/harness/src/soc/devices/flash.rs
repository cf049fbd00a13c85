//! Read-Only Boot Flash.
//!
//! Flash-like device holding the boot image. Unlike RAM, an out-of-range
//! read here is a harness bug, not a guest error: the image loader defines
//! every address the design can legally fetch, so the read path asserts
//! instead of returning the open-bus sentinel.

use crate::common::constants::FLASH_SIZE;
use crate::loader;
use crate::soc::memory::buffer::PmemBuffer;
use crate::soc::traits::Device;
use tracing::warn;

/// Read-only boot flash backed by a loaded image.
pub struct BootFlash {
    /// Backing buffer holding the flash image.
    buffer: PmemBuffer,
    /// The base physical address where this window is mapped.
    base_addr: u64,
}

impl BootFlash {
    /// Creates boot flash mapped at the given base address.
    ///
    /// # Arguments
    ///
    /// * `base_addr` - Starting physical address of the flash window.
    pub fn new(base_addr: u64) -> Self {
        Self {
            buffer: PmemBuffer::new(FLASH_SIZE),
            base_addr,
        }
    }

    /// Loads the flash image at offset zero; aborts if the image is missing.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the flash image.
    ///
    /// # Returns
    ///
    /// The size of the image in bytes.
    pub fn load_image(&mut self, path: &str) -> usize {
        let image = loader::load_binary(path);
        self.buffer.write_slice(0, &image);
        image.len()
    }

    fn check_bounds(&self, offset: u64, len: u64) {
        assert!(
            offset + len <= self.buffer.len() as u64,
            "flash read out of bounds: {:#x}",
            offset
        );
    }
}

impl Device for BootFlash {
    /// Returns the device name.
    fn name(&self) -> &str {
        "FLASH"
    }

    /// Returns the address range (Base, Size).
    fn address_range(&self) -> (u64, u64) {
        (self.base_addr, self.buffer.len() as u64)
    }

    /// Reads a byte; out-of-range access is fatal.
    fn read_u8(&mut self, offset: u64) -> u8 {
        self.check_bounds(offset, 1);
        self.buffer.read_u8(offset as usize)
    }

    /// Reads a word (little-endian); out-of-range access is fatal.
    fn read_u32(&mut self, offset: u64) -> u32 {
        self.check_bounds(offset, 4);
        self.buffer.read_u32(offset as usize)
    }

    /// Reads a doubleword (little-endian); out-of-range access is fatal.
    fn read_u64(&mut self, offset: u64) -> u64 {
        self.check_bounds(offset, 8);
        self.buffer.read_u64(offset as usize)
    }

    /// Writes are ignored; the backing image is never modified.
    fn write_u8(&mut self, offset: u64, _val: u8) {
        warn!(offset, "write to read-only flash ignored");
    }

    /// Writes are ignored; the backing image is never modified.
    fn write_u32(&mut self, offset: u64, _val: u32) {
        warn!(offset, "write to read-only flash ignored");
    }

    /// Writes are ignored; the backing image is never modified.
    fn write_u64(&mut self, offset: u64, _val: u64) {
        warn!(offset, "write to read-only flash ignored");
    }
}
