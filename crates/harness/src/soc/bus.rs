//! System bus for memory and MMIO access.
//!
//! This module routes physical-address accesses to devices. It provides:
//! 1. **Device registration:** Devices are added by address range and sorted
//!    for lookup.
//! 2. **Access routing:** Read/write by address with a last-device hint.
//! 3. **Open-bus semantics:** Reads outside every device window return a
//!    fixed sentinel; writes there are dropped. Unmapped access is defined
//!    behavior, not an error.

use crate::common::constants::UNMAPPED_SENTINEL;
use crate::soc::traits::Device;

/// System bus connecting the stepping engine's memory port to devices.
///
/// Holds a sorted list of devices (RAM, flash, storage, UART) and routes
/// each access to the device whose window contains the address.
pub struct Bus {
    /// Registered devices (boxed for dynamic dispatch).
    devices: Vec<Box<dyn Device + Send + Sync>>,
    last_device_idx: usize,
}

impl Bus {
    /// Creates an empty bus; add devices with `add_device`.
    pub fn new() -> Self {
        Self {
            devices: Vec::new(),
            last_device_idx: 0,
        }
    }

    /// Registers a device on the bus; devices are sorted by base address.
    ///
    /// # Arguments
    ///
    /// * `dev` - The device to add (must implement `Device` and be `Send + Sync`).
    pub fn add_device(&mut self, dev: Box<dyn Device + Send + Sync>) {
        self.devices.push(dev);
        self.devices.sort_by_key(|d| d.address_range().0);
        self.last_device_idx = 0;
    }

    /// Returns whether any device's window contains the given address.
    pub fn is_mapped(&self, paddr: u64) -> bool {
        self.devices.iter().any(|d| {
            let (start, size) = d.address_range();
            paddr >= start && paddr < start + size
        })
    }

    /// Returns whether any device asserts its interrupt line.
    pub fn interrupt_pending(&self) -> bool {
        self.devices.iter().any(|d| d.interrupt_pending())
    }

    fn find_device(&mut self, paddr: u64) -> Option<(&mut Box<dyn Device + Send + Sync>, u64)> {
        if self.last_device_idx < self.devices.len() {
            let (start, size) = self.devices[self.last_device_idx].address_range();
            if paddr >= start && paddr < start + size {
                return Some((&mut self.devices[self.last_device_idx], paddr - start));
            }
        }

        for (i, dev) in self.devices.iter_mut().enumerate() {
            let (start, size) = dev.address_range();
            if paddr >= start && paddr < start + size {
                self.last_device_idx = i;
                return Some((dev, paddr - start));
            }
        }
        None
    }

    /// Reads one byte; returns the sentinel if no device claims the address.
    pub fn read_u8(&mut self, paddr: u64) -> u8 {
        if let Some((dev, offset)) = self.find_device(paddr) {
            dev.read_u8(offset)
        } else {
            UNMAPPED_SENTINEL as u8
        }
    }

    /// Reads four bytes (little-endian); returns the sentinel if unclaimed.
    pub fn read_u32(&mut self, paddr: u64) -> u32 {
        if let Some((dev, offset)) = self.find_device(paddr) {
            dev.read_u32(offset)
        } else {
            UNMAPPED_SENTINEL as u32
        }
    }

    /// Reads eight bytes (little-endian); returns the sentinel if unclaimed.
    pub fn read_u64(&mut self, paddr: u64) -> u64 {
        if let Some((dev, offset)) = self.find_device(paddr) {
            dev.read_u64(offset)
        } else {
            UNMAPPED_SENTINEL
        }
    }

    /// Writes one byte; dropped if no device claims the address.
    pub fn write_u8(&mut self, paddr: u64, val: u8) {
        if let Some((dev, offset)) = self.find_device(paddr) {
            dev.write_u8(offset, val);
        }
    }

    /// Writes four bytes (little-endian); dropped if unclaimed.
    pub fn write_u32(&mut self, paddr: u64, val: u32) {
        if let Some((dev, offset)) = self.find_device(paddr) {
            dev.write_u32(offset, val);
        }
    }

    /// Writes eight bytes (little-endian); dropped if unclaimed.
    pub fn write_u64(&mut self, paddr: u64, val: u64) {
        if let Some((dev, offset)) = self.find_device(paddr) {
            dev.write_u64(offset, val);
        }
    }

    /// Writes up to eight bytes under a byte-lane mask; dropped if unclaimed.
    pub fn write_u64_masked(&mut self, paddr: u64, val: u64, mask: u8) {
        if let Some((dev, offset)) = self.find_device(paddr) {
            dev.write_u64_masked(offset, val, mask);
        }
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}
