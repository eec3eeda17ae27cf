use crate::VtError;

/// Floating point type used throughout the system
pub type Real = f64;

/// Integer domain accepted by actuators.
pub type Command = i32;

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, VtError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(VtError::NonFinite { what, value: v })
    }
}

/// Convert a controller output to the actuator's integer domain.
///
/// Truncates toward zero, so `99.9 -> 99` and `-0.7 -> 0`. This widens the
/// steady-state deadband to (-1, 1) compared with rounding. NaN maps to 0
/// and out-of-range values saturate.
pub fn truncate_to_command(value: Real) -> Command {
    if value.is_nan() {
        return 0;
    }
    value.trunc() as Command
}
