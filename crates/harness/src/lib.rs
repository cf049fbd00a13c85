//! Differential co-simulation testbench core.
//!
//! This crate implements the verification environment for a RISC-V
//! processor design under cycle-accurate simulation:
//! 1. **Peripherals:** The memory-mapped address space the design issues
//!    accesses against — RAM, boot flash, SD/MMC storage, and a serial port.
//! 2. **Difftest:** The differential comparator cross-checking the design's
//!    committed architectural state against a reference model every
//!    instruction, with diagnosable divergence reports.
//! 3. **Configuration:** Memory map, skip-class CSR allowlist, and liveness
//!    threshold, deserialized from JSON or built from defaults.
//!
//! The cycle-stepping engine that drives the design is an external
//! collaborator: it calls the bus for every memory-mapped access and offers
//! the monitor a committed-instruction snapshot once per clock edge.

/// Common types and constants (sentinels, geometry, errors).
pub mod common;
/// Harness configuration (defaults, JSON loading).
pub mod config;
/// Differential execution checking (comparator, monitor, reference model).
pub mod difftest;
/// Raw binary image loading.
pub mod loader;
/// Peripheral subsystem (bus, RAM, flash, storage, serial).
pub mod soc;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Per-edge differential comparator.
pub use crate::difftest::Comparator;
/// Run monitor classifying how a run ended.
pub use crate::difftest::Monitor;
/// Top-level peripheral subsystem; construct with `System::new` or `System::boot`.
pub use crate::soc::System;
