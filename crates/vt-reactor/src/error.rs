//! Error types for reactor control.

use thiserror::Error;
use vt_controls::ControlError;
use vt_hw::HwError;
use vt_sim::SimError;

use crate::config::ValidationError;

pub type ReactorResult<T> = Result<T, ReactorError>;

#[derive(Error, Debug)]
pub enum ReactorError {
    /// Sensor or actuator failure, passed through unchanged.
    #[error(transparent)]
    Hw(#[from] HwError),

    #[error(transparent)]
    Control(#[from] ControlError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Simulation error: {0}")]
    Sim(#[from] SimError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
