//! Lumped thermal model of one vessel.
//!
//! Dynamics:
//!
//! ```text
//! du/dt = (cmd - u) / tau                      actuator lag
//! C dT/dt = P_max * u / 100 - k (T - T_amb)    heat balance
//! ```
//!
//! `u` is the effective actuator level in `[-100, 100]`: positive heats,
//! negative cools. Integration is explicit Euler with bounded sub-steps.

use serde::{Deserialize, Serialize};
use vt_core::Command;

use crate::error::{SimError, SimResult};

/// Physical parameters of a simulated vessel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantParams {
    pub initial_temperature_c: f64,
    pub ambient_temperature_c: f64,
    /// Heat capacity of vessel plus contents, J/K.
    pub heat_capacity_j_per_k: f64,
    /// Heat loss coefficient to ambient, W/K.
    pub loss_w_per_k: f64,
    /// Heating/cooling power at full command, W.
    pub max_power_w: f64,
    /// Actuator time constant, seconds. Zero means instantaneous.
    pub actuator_tau_s: f64,
    /// Largest Euler sub-step, seconds.
    pub max_substep_s: f64,
}

impl Default for PlantParams {
    fn default() -> Self {
        Self {
            initial_temperature_c: 25.0,
            ambient_temperature_c: 22.0,
            heat_capacity_j_per_k: 2093.0,
            loss_w_per_k: 1.5,
            max_power_w: 60.0,
            actuator_tau_s: 2.0,
            max_substep_s: 0.1,
        }
    }
}

impl PlantParams {
    pub fn validate(&self) -> SimResult<()> {
        let all_finite = [
            self.initial_temperature_c,
            self.ambient_temperature_c,
            self.heat_capacity_j_per_k,
            self.loss_w_per_k,
            self.max_power_w,
            self.actuator_tau_s,
            self.max_substep_s,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !all_finite {
            return Err(SimError::InvalidArg {
                what: "plant parameters must be finite",
            });
        }
        if self.heat_capacity_j_per_k <= 0.0 {
            return Err(SimError::NonPhysical {
                what: "heat capacity must be positive",
            });
        }
        if self.loss_w_per_k < 0.0 || self.max_power_w < 0.0 {
            return Err(SimError::NonPhysical {
                what: "loss coefficient and power must be non-negative",
            });
        }
        if self.actuator_tau_s < 0.0 {
            return Err(SimError::InvalidArg {
                what: "actuator tau must be non-negative",
            });
        }
        if self.max_substep_s <= 0.0 {
            return Err(SimError::InvalidArg {
                what: "max substep must be positive",
            });
        }
        Ok(())
    }
}

/// State of one simulated vessel.
#[derive(Debug, Clone, PartialEq)]
pub struct VesselPlant {
    params: PlantParams,
    temperature_c: f64,
    level: f64,
    command: Command,
    time_s: Option<f64>,
}

impl VesselPlant {
    pub fn new(params: PlantParams) -> SimResult<Self> {
        params.validate()?;
        Ok(Self {
            temperature_c: params.initial_temperature_c,
            params,
            level: 0.0,
            command: 0,
            time_s: None,
        })
    }

    pub fn params(&self) -> &PlantParams {
        &self.params
    }

    pub fn temperature_c(&self) -> f64 {
        self.temperature_c
    }

    /// Effective actuator level after the lag, `[-100, 100]`.
    pub fn actuator_level(&self) -> f64 {
        self.level
    }

    /// Last commanded value.
    pub fn command(&self) -> Command {
        self.command
    }

    /// Change the command from `now_s` on.
    pub fn set_command(&mut self, command: Command, now_s: f64) {
        self.advance_to(now_s);
        self.command = command.clamp(-100, 100);
    }

    /// Integrate up to `now_s`. Going backwards is ignored.
    pub fn advance_to(&mut self, now_s: f64) {
        let Some(last) = self.time_s else {
            self.time_s = Some(now_s);
            return;
        };
        let span = now_s - last;
        if !(span > 0.0) {
            return;
        }
        let steps = (span / self.params.max_substep_s).ceil().max(1.0) as usize;
        let h = span / steps as f64;
        for _ in 0..steps {
            self.step(h);
        }
        self.time_s = Some(now_s);
    }

    fn step(&mut self, h: f64) {
        let p = &self.params;
        let target = f64::from(self.command);
        self.level = if p.actuator_tau_s <= h {
            target
        } else {
            self.level + (target - self.level) * h / p.actuator_tau_s
        };
        let heat_w = p.max_power_w * self.level / 100.0;
        let loss_w = p.loss_w_per_k * (self.temperature_c - p.ambient_temperature_c);
        self.temperature_c += (heat_w - loss_w) * h / p.heat_capacity_j_per_k;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_plant_relaxes_to_ambient() {
        let params = PlantParams {
            initial_temperature_c: 40.0,
            ambient_temperature_c: 20.0,
            heat_capacity_j_per_k: 100.0,
            loss_w_per_k: 10.0,
            ..PlantParams::default()
        };
        let mut plant = VesselPlant::new(params).unwrap();
        plant.advance_to(0.0);
        plant.advance_to(100.0);
        assert!((plant.temperature_c() - 20.0).abs() < 1e-3);
    }

    #[test]
    fn heating_raises_temperature() {
        let mut plant = VesselPlant::new(PlantParams::default()).unwrap();
        plant.advance_to(0.0);
        plant.set_command(100, 0.0);
        plant.advance_to(60.0);
        assert!(plant.temperature_c() > 25.0);
        assert!((plant.actuator_level() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn cooling_lowers_temperature() {
        let mut plant = VesselPlant::new(PlantParams::default()).unwrap();
        plant.advance_to(0.0);
        plant.set_command(-100, 0.0);
        plant.advance_to(60.0);
        assert!(plant.temperature_c() < 25.0);
    }

    #[test]
    fn command_is_clamped_and_time_never_rewinds() {
        let mut plant = VesselPlant::new(PlantParams::default()).unwrap();
        plant.advance_to(10.0);
        plant.set_command(500, 10.0);
        assert_eq!(plant.command(), 100);
        let before = plant.clone();
        plant.advance_to(5.0);
        assert_eq!(plant, before);
    }

    #[test]
    fn invalid_params_rejected() {
        let mut params = PlantParams::default();
        params.heat_capacity_j_per_k = 0.0;
        assert!(VesselPlant::new(params).is_err());
        let mut params = PlantParams::default();
        params.max_substep_s = f64::NAN;
        assert!(VesselPlant::new(params).is_err());
    }
}
