//! Error types for the light-control crate.

use std::time::Duration;

/// Errors surfaced by light drivers and switch devices.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// No light with this name is configured
    #[error("unknown light: {0}")]
    UnknownLight(String),

    /// A light's spec points at a device that does not exist
    #[error("light {light} references unknown device {device}")]
    UnknownDevice {
        /// The light whose spec is broken
        light: String,
        /// The device name it referenced
        device: String,
    },

    /// Socket-level failure talking to a device
    #[error("device {device} i/o failure: {source}")]
    Io {
        /// The device being addressed
        device: String,
        /// The underlying socket error
        #[source]
        source: std::io::Error,
    },

    /// The device did not answer a query in time
    #[error("device {device} did not reply within {timeout:?}")]
    Timeout {
        /// The device being addressed
        device: String,
        /// The reply deadline that elapsed
        timeout: Duration,
    },

    /// The device answered, but not in a way we can act on
    #[error("device {device} protocol error: {reason}")]
    Protocol {
        /// The device being addressed
        device: String,
        /// What was wrong with the exchange
        reason: String,
    },
}

/// Convenience type alias for Results using DriverError.
pub type Result<T> = std::result::Result<T, DriverError>;
