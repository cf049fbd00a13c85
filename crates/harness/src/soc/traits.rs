//! Device trait for memory-mapped I/O.
//!
//! This module defines the `Device` trait implemented by all bus-attached
//! peripherals. It provides:
//! 1. **Identification:** `name` and `address_range` for bus routing.
//! 2. **Access:** Byte, word, and doubleword read/write at device-relative offsets.
//! 3. **Masked stores:** A per-byte masked doubleword write, the store form
//!    the design's memory port issues.
//! 4. **Interrupts:** An optional level-sensitive interrupt line.
//!
//! All implementors must be `Send + Sync`: the serial device shares its
//! receive queue with a background input thread.

/// Trait for memory-mapped I/O devices attached to the system bus.
///
/// Devices provide a name, an address range, and read/write methods at
/// device-relative offsets. Every access executes synchronously inside the
/// caller and must never block.
pub trait Device: Send + Sync {
    /// Returns a short name for this device (e.g., `"UART0"`, `"PMEM"`).
    fn name(&self) -> &str;
    /// Returns (base_address, size_in_bytes) for this device's window.
    fn address_range(&self) -> (u64, u64);
    /// Reads one byte at the given device-relative offset.
    fn read_u8(&mut self, offset: u64) -> u8;
    /// Reads four bytes (little-endian) at the given offset.
    fn read_u32(&mut self, offset: u64) -> u32;
    /// Reads eight bytes (little-endian) at the given offset.
    fn read_u64(&mut self, offset: u64) -> u64;
    /// Writes one byte at the given offset.
    fn write_u8(&mut self, offset: u64, val: u8);
    /// Writes four bytes (little-endian) at the given offset.
    fn write_u32(&mut self, offset: u64, val: u32);
    /// Writes eight bytes (little-endian) at the given offset.
    fn write_u64(&mut self, offset: u64, val: u64);

    /// Writes up to eight bytes under a byte-lane mask: byte `i` of `val`
    /// is stored at `offset + i` iff bit `i` of `mask` is set
    /// (default: byte-by-byte).
    fn write_u64_masked(&mut self, offset: u64, val: u64, mask: u8) {
        for i in 0..8u64 {
            if mask & (1 << i) != 0 {
                self.write_u8(offset + i, (val >> (i * 8)) as u8);
            }
        }
    }

    /// Writes a contiguous byte slice at the given offset (default: byte-by-byte).
    fn write_bytes(&mut self, offset: u64, data: &[u8]) {
        for (i, byte) in data.iter().enumerate() {
            self.write_u8(offset + i as u64, *byte);
        }
    }

    /// Returns `true` while this device asserts its interrupt line. Edge
    /// detection is the caller's responsibility.
    fn interrupt_pending(&self) -> bool {
        false
    }
}
