//! Image Loading.
//!
//! This module reads raw flat binary images from disk. It provides:
//! 1. **Required loads:** `load_binary` aborts the process when the image is
//!    missing, since nothing meaningful can run without it.
//! 2. **Companion images:** Optional secondary images (ramdisk, storage card)
//!    derived from the primary image path by filename convention.

use std::fs;
use std::process;

/// Loads a binary file from disk into a byte vector.
///
/// Exits the process with an error message if the file cannot be read.
///
/// # Arguments
///
/// * `path` - Path to the binary image.
///
/// # Returns
///
/// The raw bytes of the file.
pub fn load_binary(path: &str) -> Vec<u8> {
    fs::read(path).unwrap_or_else(|e| {
        eprintln!("\n[!] FATAL: Could not read image '{}': {}", path, e);
        process::exit(1);
    })
}

/// Derives a companion image path from the primary image path.
///
/// The primary image is expected to carry a `.bin` suffix; the companion
/// replaces that suffix with `tag` (e.g. `kernel.bin` + `-ramdisk.img`
/// becomes `kernel-ramdisk.img`). Returns `None` when the primary path does
/// not end in `.bin`, in which case no companion lookup is attempted.
///
/// # Arguments
///
/// * `primary` - Path of the primary boot image.
/// * `tag` - Replacement suffix, including its own extension.
pub fn companion_path(primary: &str, tag: &str) -> Option<String> {
    primary
        .strip_suffix(".bin")
        .map(|stem| format!("{}{}", stem, tag))
}
