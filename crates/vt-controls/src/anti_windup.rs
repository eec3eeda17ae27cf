//! Anti-windup policy layered around [`PidController`].
//!
//! The guard looks at the components of the *previous* computation. If their
//! sum lies outside the output limits the controller was saturated, and the
//! integral gain is forced to zero for the next computation; otherwise the
//! nominal gain is restored. The decision therefore lags saturation by one
//! sample.

use serde::{Deserialize, Serialize};

use crate::pid::PidController;

/// Outcome of one anti-windup decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindupState {
    /// Previous output was inside the limits; nominal `Ki` in effect.
    Nominal,
    /// Previous output saturated; `Ki` forced to zero.
    Frozen,
}

/// Integral freeze on saturation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SaturationGuard {
    nominal_ki: f64,
}

impl SaturationGuard {
    /// Guard restoring `nominal_ki` whenever the controller is not saturated.
    pub fn new(nominal_ki: f64) -> Self {
        Self { nominal_ki }
    }

    /// Guard for the controller's current integral gain.
    pub fn for_controller(pid: &PidController) -> Self {
        Self::new(pid.ki())
    }

    pub fn nominal_ki(&self) -> f64 {
        self.nominal_ki
    }

    /// Decide from the last components and set the controller's `Ki`.
    ///
    /// Must be called before `compute`.
    pub fn apply(&self, pid: &mut PidController) -> WindupState {
        let sum = pid.components().sum();
        if pid.limits().contains(sum) {
            pid.set_ki(self.nominal_ki);
            WindupState::Nominal
        } else {
            if pid.ki() != 0.0 {
                tracing::trace!(sum, "controller saturated, freezing integral");
            }
            pid.set_ki(0.0);
            WindupState::Frozen
        }
    }
}
