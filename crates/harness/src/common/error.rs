//! Recoverable error types.
//!
//! Fatal harness conditions (missing required images, out-of-range boot
//! flash access, a storage transfer with no backing card) abort the process
//! at the point of detection and never appear here. The only errors that
//! propagate as values are configuration-loading failures.

use thiserror::Error;

/// Errors produced while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("could not read config file '{path}': {source}")]
    Io {
        /// Path of the file that failed to load.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file was not valid JSON for the config schema.
    #[error("could not parse config file '{path}': {source}")]
    Parse {
        /// Path of the file that failed to parse.
        path: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}
