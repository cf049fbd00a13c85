//! Boot Flash Unit Tests.
//!
//! Verifies image round-trips, the read-only contract, and the fatal
//! out-of-range read path (an overrun here is a harness bug, not a guest
//! error, so it must never resolve to a sentinel).

use rvcosim_core::common::constants::FLASH_SIZE;
use rvcosim_core::soc::devices::BootFlash;
use rvcosim_core::soc::traits::Device;
use std::fs;

// ══════════════════════════════════════════════════════════
// 1. Image loading and reads
// ══════════════════════════════════════════════════════════

#[test]
fn image_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let image_path = dir.path().join("fw.bin");
    let pattern: Vec<u8> = (0..512u32).map(|i| (i * 13) as u8).collect();
    fs::write(&image_path, &pattern).expect("write image");

    let mut flash = BootFlash::new(0x3000_0000);
    let size = flash.load_image(image_path.to_str().expect("utf8 path"));
    assert_eq!(size, pattern.len());
    for (i, &expected) in pattern.iter().enumerate() {
        assert_eq!(flash.read_u8(i as u64), expected, "offset {}", i);
    }
}

#[test]
fn doubleword_read_is_little_endian() {
    let dir = tempfile::tempdir().expect("tempdir");
    let image_path = dir.path().join("fw.bin");
    fs::write(&image_path, [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]).expect("write image");

    let mut flash = BootFlash::new(0x3000_0000);
    let _ = flash.load_image(image_path.to_str().expect("utf8 path"));
    assert_eq!(flash.read_u64(0), 0x0807_0605_0403_0201);
    assert_eq!(flash.read_u32(4), 0x0807_0605);
}

// ══════════════════════════════════════════════════════════
// 2. Read-only contract
// ══════════════════════════════════════════════════════════

#[test]
fn writes_never_corrupt_backing_image() {
    crate::common::init_tracing();
    let dir = tempfile::tempdir().expect("tempdir");
    let image_path = dir.path().join("fw.bin");
    fs::write(&image_path, [0x5A; 16]).expect("write image");

    let mut flash = BootFlash::new(0x3000_0000);
    let _ = flash.load_image(image_path.to_str().expect("utf8 path"));
    flash.write_u8(0, 0x00);
    flash.write_u32(4, 0xDEAD_BEEF);
    flash.write_u64(8, 0x1122_3344_5566_7788);
    for i in 0..16u64 {
        assert_eq!(flash.read_u8(i), 0x5A);
    }
}

// ══════════════════════════════════════════════════════════
// 3. Fatal out-of-range reads
// ══════════════════════════════════════════════════════════

#[test]
#[should_panic(expected = "flash read out of bounds")]
fn byte_read_past_end_is_fatal() {
    let mut flash = BootFlash::new(0x3000_0000);
    let _ = flash.read_u8(FLASH_SIZE as u64);
}

#[test]
#[should_panic(expected = "flash read out of bounds")]
fn doubleword_read_straddling_end_is_fatal() {
    let mut flash = BootFlash::new(0x3000_0000);
    let _ = flash.read_u64(FLASH_SIZE as u64 - 4);
}
