//! Peripheral subsystem and top-level `System` type.
//!
//! This module assembles the address space the simulated design sees. It
//! performs:
//! 1. **Bus setup:** Creates the interconnect and registers devices at the
//!    configured base addresses.
//! 2. **Image loading:** Boot image into RAM (with optional ramdisk),
//!    optional flash image, and storage-card binding by filename convention.

/// System bus routing accesses by physical address.
pub mod bus;

/// Memory-mapped peripherals (flash, storage, serial).
pub mod devices;

/// Flat byte-addressable system RAM.
pub mod memory;

/// The `Device` trait implemented by all peripherals.
pub mod traits;

use crate::config::Config;
use crate::soc::bus::Bus;
use crate::soc::devices::{BootFlash, SdCard, Uart};
use crate::soc::memory::Ram;

pub use traits::Device;

/// Top-level peripheral subsystem: the bus with all devices registered.
pub struct System {
    /// System interconnect; routes accesses to RAM and MMIO devices.
    pub bus: Bus,
}

impl System {
    /// Builds a system from configuration with no images loaded.
    ///
    /// # Arguments
    ///
    /// * `config` - Harness configuration (memory map, UART options).
    pub fn new(config: &Config) -> Self {
        let mut bus = Bus::new();
        bus.add_device(Box::new(Ram::new(config.system.ram_base)));
        bus.add_device(Box::new(BootFlash::new(config.system.flash_base)));
        bus.add_device(Box::new(SdCard::new(config.system.sdcard_base)));
        bus.add_device(Box::new(Uart::new(
            config.system.uart_base,
            config.system.uart_to_stderr,
        )));
        Self { bus }
    }

    /// Builds a booted system: loads the RAM image (plus optional ramdisk),
    /// binds the storage card derived from the RAM image path, and loads
    /// the flash image when given.
    ///
    /// A missing required image aborts the process; missing companion
    /// images are tolerated.
    ///
    /// # Arguments
    ///
    /// * `config` - Harness configuration.
    /// * `ram_image` - Path to the primary boot image (required).
    /// * `flash_image` - Optional path to the boot flash image.
    pub fn boot(config: &Config, ram_image: &str, flash_image: Option<&str>) -> Self {
        let mut bus = Bus::new();

        let mut ram = Ram::new(config.system.ram_base);
        let _ = ram.load_image(ram_image);
        bus.add_device(Box::new(ram));

        let mut flash = BootFlash::new(config.system.flash_base);
        if let Some(path) = flash_image {
            let _ = flash.load_image(path);
        }
        bus.add_device(Box::new(flash));

        let mut sdcard = SdCard::new(config.system.sdcard_base);
        sdcard.bind_image(ram_image);
        bus.add_device(Box::new(sdcard));

        bus.add_device(Box::new(Uart::new(
            config.system.uart_base,
            config.system.uart_to_stderr,
        )));

        Self { bus }
    }
}
