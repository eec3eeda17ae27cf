//! Error types for control operations.

use thiserror::Error;

/// Result type for control operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur while configuring a controller.
///
/// Computation itself never fails; only construction and reconfiguration
/// validate their inputs.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// Invalid argument provided to a control function.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// A numeric input was NaN or infinite.
    #[error("Non-finite value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },
}

impl From<vt_core::VtError> for ControlError {
    fn from(e: vt_core::VtError) -> Self {
        match e {
            vt_core::VtError::NonFinite { what, value } => ControlError::NonFinite { what, value },
            vt_core::VtError::InvalidArg { what } => ControlError::InvalidArg { what },
        }
    }
}
