//! Global Harness Constants.
//!
//! This module defines constants used across the harness. It includes:
//! 1. **Address-space constants:** The unmapped-read sentinel and page geometry.
//! 2. **Memory geometry:** RAM, ramdisk region, and boot flash sizes.
//! 3. **Architectural constants:** Instruction sizes and privilege levels.
//! 4. **Simulation constants:** The liveness-guard threshold.

/// Value returned for reads of addresses no device claims ("open bus").
pub const UNMAPPED_SENTINEL: u64 = 0xBB;

/// Page size in bytes (4 KiB). Backing buffers are page-aligned.
pub const PAGE_SIZE: usize = 4096;

/// Size of main system RAM (128 MiB).
pub const RAM_SIZE: usize = 128 * 1024 * 1024;

/// Block size of the appended ramdisk region in bytes.
pub const DISK_BLOCK_SIZE: usize = 1024;

/// Number of blocks in the appended ramdisk region.
pub const DISK_BLOCK_COUNT: usize = 1000;

/// Size of the ramdisk region appended above RAM.
pub const DISK_REGION_SIZE: usize = DISK_BLOCK_SIZE * DISK_BLOCK_COUNT;

/// Total physical memory backing the RAM device (RAM plus ramdisk region).
pub const PMEM_SIZE: usize = RAM_SIZE + DISK_REGION_SIZE;

/// Size of the read-only boot flash window (128 MiB).
pub const FLASH_SIZE: usize = 128 * 1024 * 1024;

/// Size of a compressed (16-bit) instruction in bytes.
pub const INSTRUCTION_SIZE_16: u64 = 2;

/// Size of a standard (32-bit) instruction in bytes.
pub const INSTRUCTION_SIZE_32: u64 = 4;

/// Machine privilege level encoding.
pub const PRIV_MACHINE: u64 = 0b11;

/// Supervisor privilege level encoding.
pub const PRIV_SUPERVISOR: u64 = 0b01;

/// Default number of consecutive commit-less clock edges before the
/// design is declared stuck.
pub const STUCK_THRESHOLD: u64 = 1_000_000;
