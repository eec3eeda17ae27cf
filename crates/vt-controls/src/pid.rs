//! Sampled PID feedback law.
//!
//! - Proportional on error (or on measurement, see [`PidConfig`])
//! - Integral accumulated as `Ki * e * dt`, clamped to the output limits
//! - Derivative on measurement, so setpoint steps do not kick the output
//! - Output clamped to the output limits
//!
//! The controller never fails once constructed: `compute` always returns a
//! finite value inside the limits.

use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};
use crate::sampled::SampleConfig;

/// Replacement for a zero or negative elapsed time.
const MIN_DT_S: f64 = 1e-16;

/// PID gains.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain (per second).
    pub ki: f64,
    /// Derivative gain (seconds).
    pub kd: f64,
}

impl PidGains {
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd }
    }
}

impl Default for PidGains {
    fn default() -> Self {
        Self {
            kp: 80.0,
            ki: 0.2,
            kd: 10.0,
        }
    }
}

/// Closed output interval of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputLimits {
    pub min: f64,
    pub max: f64,
}

impl OutputLimits {
    /// # Errors
    ///
    /// Returns error if either bound is not finite or `min >= max`.
    pub fn new(min: f64, max: f64) -> ControlResult<Self> {
        if !min.is_finite() || !max.is_finite() {
            return Err(ControlError::InvalidArg {
                what: "output limits must be finite",
            });
        }
        if min >= max {
            return Err(ControlError::InvalidArg {
                what: "output min must be less than output max",
            });
        }
        Ok(Self { min, max })
    }

    /// `[-bound, bound]`.
    pub fn symmetric(bound: f64) -> ControlResult<Self> {
        Self::new(-bound, bound)
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl Default for OutputLimits {
    fn default() -> Self {
        Self {
            min: -100.0,
            max: 100.0,
        }
    }
}

/// Controller configuration as it appears in plant config files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PidConfig {
    pub gains: PidGains,
    /// Minimum time between computations, seconds.
    pub sample_period_s: f64,
    pub output_limits: OutputLimits,
    /// When false the controller holds its last output.
    pub auto_mode: bool,
    /// Integrate the proportional term on measurement changes instead of error.
    pub proportional_on_measurement: bool,
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            gains: PidGains::default(),
            sample_period_s: 1.0,
            output_limits: OutputLimits::default(),
            auto_mode: true,
            proportional_on_measurement: false,
        }
    }
}

impl PidConfig {
    /// Check every field, returning the first violation.
    pub fn validate(&self) -> ControlResult<()> {
        let PidGains { kp, ki, kd } = self.gains;
        if !(kp.is_finite() && ki.is_finite() && kd.is_finite()) {
            return Err(ControlError::InvalidArg {
                what: "gains must be finite",
            });
        }
        SampleConfig::new(self.sample_period_s)?;
        OutputLimits::new(self.output_limits.min, self.output_limits.max)?;
        Ok(())
    }
}

/// Contribution of each term to the last computed output.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Components {
    pub p: f64,
    pub i: f64,
    pub d: f64,
}

impl Components {
    /// Unclamped controller output these components add up to.
    pub fn sum(&self) -> f64 {
        self.p + self.i + self.d
    }
}

/// Stateful PID controller.
#[derive(Debug, Clone)]
pub struct PidController {
    gains: PidGains,
    setpoint: f64,
    sample: SampleConfig,
    limits: OutputLimits,
    auto_mode: bool,
    proportional_on_measurement: bool,

    proportional: f64,
    integral: f64,
    derivative: f64,
    last_output: Option<f64>,
    last_input: Option<f64>,
    last_time: Option<f64>,
}

impl PidController {
    /// Create a controller whose time base starts at `now_s`.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid or the setpoint is not finite.
    pub fn new(config: &PidConfig, setpoint: f64, now_s: f64) -> ControlResult<Self> {
        config.validate()?;
        if !setpoint.is_finite() {
            return Err(ControlError::NonFinite {
                what: "setpoint",
                value: setpoint,
            });
        }
        Ok(Self {
            gains: config.gains,
            setpoint,
            sample: SampleConfig::new(config.sample_period_s)?,
            limits: config.output_limits,
            auto_mode: config.auto_mode,
            proportional_on_measurement: config.proportional_on_measurement,
            proportional: 0.0,
            integral: 0.0,
            derivative: 0.0,
            last_output: None,
            last_input: None,
            last_time: now_s.is_finite().then_some(now_s),
        })
    }

    /// Compute a new output for `measurement` taken at `now_s`.
    ///
    /// Returns the previous output unchanged when less than one sample period
    /// has elapsed, when the controller is in manual mode, or when the
    /// measurement is not finite.
    pub fn compute(&mut self, measurement: f64, now_s: f64) -> f64 {
        if !self.auto_mode || !measurement.is_finite() || !now_s.is_finite() {
            return self.held_output();
        }

        let dt = match self.last_time {
            Some(last) if now_s - last > 0.0 => now_s - last,
            Some(_) => MIN_DT_S,
            None => self.sample.period_s.max(MIN_DT_S),
        };
        if let Some(held) = self.last_output
            && self.sample.should_hold(dt)
        {
            return held;
        }

        let error = self.setpoint - measurement;
        let d_input = measurement - self.last_input.unwrap_or(measurement);

        let proportional = if self.proportional_on_measurement {
            self.proportional - self.gains.kp * d_input
        } else {
            self.gains.kp * error
        };
        let integral = self.limits.clamp(self.integral + self.gains.ki * error * dt);
        let derivative = -self.gains.kd * d_input / dt;

        let output = self.limits.clamp(proportional + integral + derivative);
        if output.is_nan() {
            return self.held_output();
        }

        self.proportional = proportional;
        self.integral = integral;
        self.derivative = derivative;
        self.last_output = Some(output);
        self.last_input = Some(measurement);
        self.last_time = Some(now_s);
        output
    }

    /// Contributions of the last computation, `(0, 0, 0)` before the first.
    pub fn components(&self) -> Components {
        Components {
            p: self.proportional,
            i: self.integral,
            d: self.derivative,
        }
    }

    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    /// Change the target. Takes effect on the next computation.
    pub fn set_setpoint(&mut self, setpoint: f64) {
        self.setpoint = setpoint;
    }

    pub fn gains(&self) -> PidGains {
        self.gains
    }

    pub fn ki(&self) -> f64 {
        self.gains.ki
    }

    /// Override the integral gain without touching the accumulated integral.
    pub fn set_ki(&mut self, ki: f64) {
        self.gains.ki = ki;
    }

    pub fn limits(&self) -> OutputLimits {
        self.limits
    }

    pub fn sample(&self) -> SampleConfig {
        self.sample
    }

    pub fn auto_mode(&self) -> bool {
        self.auto_mode
    }

    /// Switch between automatic and manual mode.
    ///
    /// Entering automatic mode resets the controller and seeds the integral
    /// with `last_output`, so the output does not jump on the first sample.
    pub fn set_auto_mode(&mut self, enabled: bool, last_output: Option<f64>) {
        if enabled && !self.auto_mode {
            self.reset();
            self.integral = self.limits.clamp(last_output.unwrap_or(0.0));
        }
        self.auto_mode = enabled;
    }

    /// Output of the last computation, if any.
    pub fn last_output(&self) -> Option<f64> {
        self.last_output
    }

    /// Clear the accumulators and history.
    pub fn reset(&mut self) {
        self.proportional = 0.0;
        self.integral = 0.0;
        self.derivative = 0.0;
        self.last_output = None;
        self.last_input = None;
        self.last_time = None;
    }

    fn held_output(&self) -> f64 {
        self.last_output.unwrap_or(0.0)
    }
}
