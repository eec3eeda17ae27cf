//! Per-vessel control orchestration.
//!
//! One tick reads the sensor, adjusts the integral gain from the previous
//! computation's saturation state, computes a new output, writes it to the
//! actuator and only then records the sample. A failure at any step returns
//! the driver error untouched; nothing is retried.

use tracing::{debug, info, warn};
use vt_controls::{PidConfig, PidController, SaturationGuard, WindupState};
use vt_core::{Clock, VesselId, truncate_to_command};
use vt_hw::{ActuatorPort, SensorPort};

use crate::error::ReactorResult;
use crate::telemetry::{ControlSample, TelemetryLog};

/// Result of one call to [`ReactorController::tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Command written and sample recorded.
    Applied(ControlSample),
    /// Controller disabled; no I/O was performed.
    Disabled,
}

/// Closed-loop temperature control for one vessel.
///
/// The controller owns its sensor and actuator handles. Handles that share a
/// physical bus must have been built from the same `BusLock`.
///
/// Dropping a controller whose last actuator action was not a stop forces
/// a stop. Call [`finalize`](Self::finalize) explicitly to observe errors.
pub struct ReactorController<S: SensorPort, A: ActuatorPort, C: Clock> {
    id: VesselId,
    sensor: S,
    actuator: A,
    clock: C,
    pid: PidController,
    guard: SaturationGuard,
    target_temperature: f64,
    enabled: bool,
    telemetry: TelemetryLog,
    last_outcome: Option<TickOutcome>,
    stopped: bool,
}

impl<S: SensorPort, A: ActuatorPort, C: Clock> ReactorController<S, A, C> {
    /// Build a controller. A controller constructed disabled stops its
    /// actuator before returning.
    ///
    /// # Errors
    ///
    /// Returns error if the PID configuration or setpoint is invalid, or if
    /// the initial stop fails.
    pub fn new(
        id: VesselId,
        sensor: S,
        actuator: A,
        clock: C,
        pid_config: &PidConfig,
        target_temperature: f64,
        enabled: bool,
    ) -> ReactorResult<Self> {
        let pid = PidController::new(pid_config, target_temperature, clock.now_s())?;
        let guard = SaturationGuard::for_controller(&pid);
        let mut controller = Self {
            id,
            sensor,
            actuator,
            clock,
            pid,
            guard,
            target_temperature,
            enabled,
            telemetry: TelemetryLog::new(),
            last_outcome: None,
            stopped: false,
        };
        if !enabled {
            controller.force_stop()?;
        }
        Ok(controller)
    }

    pub fn id(&self) -> VesselId {
        self.id
    }

    pub fn target_temperature(&self) -> f64 {
        self.target_temperature
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn pid(&self) -> &PidController {
        &self.pid
    }

    pub fn telemetry(&self) -> &TelemetryLog {
        &self.telemetry
    }

    pub fn last_outcome(&self) -> Option<&TickOutcome> {
        self.last_outcome.as_ref()
    }

    /// Change the target temperature for this controller and its PID.
    pub fn set_target_temperature(&mut self, temperature: f64) -> ReactorResult<()> {
        vt_core::ensure_finite(temperature, "target temperature")
            .map_err(vt_controls::ControlError::from)?;
        self.target_temperature = temperature;
        self.pid.set_setpoint(temperature);
        info!(vessel = %self.id, temperature, "target temperature set");
        Ok(())
    }

    /// Allow ticks to drive the actuator. Performs no I/O.
    pub fn enable(&mut self) {
        self.enabled = true;
        info!(vessel = %self.id, "control enabled");
    }

    /// Clear the enabled flag, then stop the actuator.
    pub fn disable(&mut self) -> ReactorResult<()> {
        self.enabled = false;
        info!(vessel = %self.id, "control disabled");
        self.force_stop()
    }

    /// Last call on every shutdown path. Same as [`disable`](Self::disable);
    /// safe to repeat.
    pub fn finalize(&mut self) -> ReactorResult<()> {
        self.disable()
    }

    /// Run one control step.
    ///
    /// A disabled controller logs a warning and returns
    /// [`TickOutcome::Disabled`] without touching hardware or telemetry.
    pub fn tick(&mut self) -> ReactorResult<TickOutcome> {
        if !self.enabled {
            warn!(vessel = %self.id, "tick invoked while disabled");
            self.last_outcome = Some(TickOutcome::Disabled);
            return Ok(TickOutcome::Disabled);
        }

        let temperature = self.sensor.read_temperature()?;

        let windup = self.guard.apply(&mut self.pid);
        let output = self.pid.compute(temperature, self.clock.now_s());
        let control_value = truncate_to_command(output);

        self.stopped = false;
        self.actuator.write(control_value)?;

        let c = self.pid.components();
        let sample = ControlSample {
            temperature,
            control_value,
            p_term: c.p,
            i_term: c.i,
            d_term: c.d,
        };
        self.telemetry.push(sample);
        debug!(
            vessel = %self.id,
            temperature,
            control_value,
            p = c.p,
            i = c.i,
            d = c.d,
            frozen = windup == WindupState::Frozen,
            "tick"
        );

        let outcome = TickOutcome::Applied(sample);
        self.last_outcome = Some(outcome);
        Ok(outcome)
    }

    fn force_stop(&mut self) -> ReactorResult<()> {
        self.actuator.stop()?;
        self.stopped = true;
        Ok(())
    }
}

impl<S: SensorPort, A: ActuatorPort, C: Clock> Drop for ReactorController<S, A, C> {
    fn drop(&mut self) {
        if self.stopped {
            return;
        }
        warn!(vessel = %self.id, "controller dropped without finalize, stopping actuator");
        if let Err(e) = self.actuator.stop() {
            tracing::error!(vessel = %self.id, error = %e, "safety stop failed");
        }
    }
}

impl<S: SensorPort, A: ActuatorPort, C: Clock> std::fmt::Debug for ReactorController<S, A, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactorController")
            .field("id", &self.id)
            .field("target_temperature", &self.target_temperature)
            .field("enabled", &self.enabled)
            .field("samples", &self.telemetry.len())
            .finish_non_exhaustive()
    }
}
