//! Sampling configuration for digital controllers.
//!
//! A controller computes at most once per sample period. Requests arriving
//! sooner are answered with the held output (zero-order hold).

use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};

/// Sample configuration for a controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleConfig {
    /// Minimum time between two computations, seconds. Zero disables the hold.
    pub period_s: f64,
}

impl SampleConfig {
    /// Create a new sample configuration.
    ///
    /// # Errors
    ///
    /// Returns error if `period_s` is negative or not finite.
    pub fn new(period_s: f64) -> ControlResult<Self> {
        if !period_s.is_finite() || period_s < 0.0 {
            return Err(ControlError::InvalidArg {
                what: "sample period must be finite and non-negative",
            });
        }
        Ok(Self { period_s })
    }

    /// Create a sample configuration from frequency in Hz.
    pub fn from_frequency(freq_hz: f64) -> ControlResult<Self> {
        if !freq_hz.is_finite() || freq_hz <= 0.0 {
            return Err(ControlError::InvalidArg {
                what: "frequency must be positive",
            });
        }
        Ok(Self {
            period_s: 1.0 / freq_hz,
        })
    }

    /// No hold: every request computes.
    pub fn continuous() -> Self {
        Self { period_s: 0.0 }
    }

    /// True if `elapsed_s` is too short for a new sample.
    pub fn should_hold(&self, elapsed_s: f64) -> bool {
        elapsed_s < self.period_s
    }
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self { period_s: 1.0 }
    }
}
