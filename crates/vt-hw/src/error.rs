//! Driver-level errors.

use thiserror::Error;
use vt_core::VesselId;

/// Result type for hardware operations.
pub type HwResult<T> = Result<T, HwError>;

/// Communication failures reported by sensor and actuator drivers.
///
/// Drivers never retry; every failure reaches the caller as one of these.
#[derive(Error, Debug)]
pub enum HwError {
    #[error("I/O error on {device}: {source}")]
    Io {
        device: String,
        source: std::io::Error,
    },

    #[error("Bus error on {device}: {message}")]
    Bus { device: String, message: String },

    #[error("Malformed reading from {device}: {what}")]
    Parse { device: String, what: &'static str },

    #[error("No {what} mapped for {id}")]
    UnknownVessel { id: VesselId, what: &'static str },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },
}

impl HwError {
    pub fn io(device: impl Into<String>, source: std::io::Error) -> Self {
        HwError::Io {
            device: device.into(),
            source,
        }
    }

    pub fn bus(device: impl Into<String>, message: impl Into<String>) -> Self {
        HwError::Bus {
            device: device.into(),
            message: message.into(),
        }
    }
}
