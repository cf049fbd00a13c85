//! Memory-Mapped Peripherals.
//!
//! This module contains the devices the simulated design issues
//! memory-mapped accesses against: the read-only boot flash, the SD/MMC
//! storage controller, and the serial port.

/// Read-only boot flash.
pub mod flash;

/// SD/MMC storage controller.
pub mod sdcard;

/// 16550-style serial port.
pub mod uart;

pub use flash::BootFlash;
pub use sdcard::SdCard;
pub use uart::Uart;

pub use crate::soc::traits::Device;
