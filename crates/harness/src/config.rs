//! Configuration system for the harness.
//!
//! This module defines the configuration structures used to parameterize a
//! run. It provides:
//! 1. **Defaults:** Baseline memory map and difftest constants.
//! 2. **Structures:** Hierarchical config for the system memory map and the
//!    differential comparator.
//! 3. **Loading:** JSON deserialization with per-field defaults, so partial
//!    config files work and `Config::default()` is a complete runnable config.

use crate::common::ConfigError;
use serde::Deserialize;
use std::fs;

/// Default configuration constants.
mod defaults {
    /// Base address of main system RAM.
    pub const RAM_BASE: u64 = 0x8000_0000;

    /// Base address of the read-only boot flash window.
    pub const FLASH_BASE: u64 = 0x3000_0000;

    /// Base address of the UART register window.
    pub const UART_BASE: u64 = 0x1000_0000;

    /// Base address of the SD/MMC controller register window.
    pub const SDCARD_BASE: u64 = 0xA300_0000;
}

/// An inclusive range of CSR addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CsrRange {
    /// First CSR address in the range.
    pub first: u16,
    /// Last CSR address in the range (inclusive).
    pub last: u16,
}

impl CsrRange {
    /// A single-address range.
    pub const fn single(addr: u16) -> Self {
        Self {
            first: addr,
            last: addr,
        }
    }

    /// An inclusive span of addresses.
    pub const fn span(first: u16, last: u16) -> Self {
        Self { first, last }
    }

    /// Returns whether the range contains the given CSR address.
    pub fn contains(&self, addr: u16) -> bool {
        addr >= self.first && addr <= self.last
    }
}

/// System memory map configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemConfig {
    /// Main RAM base address.
    #[serde(default = "SystemConfig::default_ram_base")]
    pub ram_base: u64,

    /// Boot flash base address.
    #[serde(default = "SystemConfig::default_flash_base")]
    pub flash_base: u64,

    /// UART register window base address.
    #[serde(default = "SystemConfig::default_uart_base")]
    pub uart_base: u64,

    /// SD/MMC controller register window base address.
    #[serde(default = "SystemConfig::default_sdcard_base")]
    pub sdcard_base: u64,

    /// When true, UART output goes to stderr instead of stdout.
    #[serde(default)]
    pub uart_to_stderr: bool,
}

impl SystemConfig {
    /// Returns the default RAM base address.
    fn default_ram_base() -> u64 {
        defaults::RAM_BASE
    }

    /// Returns the default boot flash base address.
    fn default_flash_base() -> u64 {
        defaults::FLASH_BASE
    }

    /// Returns the default UART base address.
    fn default_uart_base() -> u64 {
        defaults::UART_BASE
    }

    /// Returns the default SD/MMC controller base address.
    fn default_sdcard_base() -> u64 {
        defaults::SDCARD_BASE
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            ram_base: defaults::RAM_BASE,
            flash_base: defaults::FLASH_BASE,
            uart_base: defaults::UART_BASE,
            sdcard_base: defaults::SDCARD_BASE,
            uart_to_stderr: false,
        }
    }
}

/// Differential comparator configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DifftestConfig {
    /// CSR addresses whose accesses are skip-class: harness- or
    /// platform-specific registers the reference model does not implement
    /// identically, synchronized from the design instead of compared.
    #[serde(default = "DifftestConfig::default_skip_csrs")]
    pub skip_csrs: Vec<CsrRange>,

    /// Consecutive commit-less clock edges before the design is declared
    /// stuck.
    #[serde(default = "DifftestConfig::default_stuck_threshold")]
    pub stuck_threshold: u64,
}

impl DifftestConfig {
    /// Returns the default skip-class CSR allowlist: misa (0x301),
    /// mip (0x344), the pmpaddr file (0x3B0-0x3BF), the platform's custom
    /// counters (0xBFE-0xBFF), and time (0xC01).
    fn default_skip_csrs() -> Vec<CsrRange> {
        vec![
            CsrRange::single(0x301),
            CsrRange::single(0x344),
            CsrRange::span(0x3B0, 0x3BF),
            CsrRange::span(0xBFE, 0xBFF),
            CsrRange::single(0xC01),
        ]
    }

    /// Returns the default liveness threshold.
    fn default_stuck_threshold() -> u64 {
        crate::common::constants::STUCK_THRESHOLD
    }
}

impl Default for DifftestConfig {
    fn default() -> Self {
        Self {
            skip_csrs: Self::default_skip_csrs(),
            stuck_threshold: Self::default_stuck_threshold(),
        }
    }
}

/// Root configuration type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// System memory map.
    #[serde(default)]
    pub system: SystemConfig,

    /// Differential comparator settings.
    #[serde(default)]
    pub difftest: DifftestConfig,
}

impl Config {
    /// Loads configuration from a JSON file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the JSON config file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the file cannot be read or parsed.
    pub fn from_json_file(path: &str) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }
}
