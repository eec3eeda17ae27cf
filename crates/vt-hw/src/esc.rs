//! Bidirectional heating/cooling actuator driven by an ESC.
//!
//! The ESC takes a servo-style pulse: 1500 µs is neutral, 1000 µs full
//! reverse (cooling), 2000 µs full forward (heating). Commands in
//! `[-100, 100]` map linearly onto that range; larger commands saturate.

use embedded_hal::i2c::I2c;
use tracing::debug;
use vt_core::{Command, VesselId};

use crate::bus::BusArbiter;
use crate::error::HwResult;
use crate::pca9685::{Pca9685, pulse_to_duty};
use crate::ports::ActuatorPort;

pub const NEUTRAL_PULSE_US: f64 = 1500.0;
/// Pulse offset per command unit.
pub const US_PER_COMMAND: f64 = 5.0;
pub const COMMAND_RANGE: Command = 100;

/// Pulse width for a command.
pub fn command_to_pulse_us(command: Command) -> f64 {
    let clamped = command.clamp(-COMMAND_RANGE, COMMAND_RANGE);
    NEUTRAL_PULSE_US + f64::from(clamped) * US_PER_COMMAND
}

/// ESC on one PCA9685 channel.
#[derive(Debug)]
pub struct EscActuator<I2C> {
    id: VesselId,
    channel: u8,
    bus: BusArbiter<Pca9685<I2C>>,
}

impl<I2C: I2c> EscActuator<I2C> {
    /// Bind to `channel`, initialising the expander if nobody has yet.
    pub fn new(id: VesselId, channel: u8, bus: BusArbiter<Pca9685<I2C>>) -> HwResult<Self> {
        bus.transaction(|pca| pca.init())?;
        Ok(Self { id, channel, bus })
    }

    pub fn id(&self) -> VesselId {
        self.id
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    fn set_pulse(&mut self, pulse_us: f64) -> HwResult<()> {
        let channel = self.channel;
        self.bus.transaction(|pca| {
            let duty = pulse_to_duty(pulse_us, pca.frequency_hz());
            pca.set_pwm(channel, duty)
        })
    }
}

impl<I2C: I2c> ActuatorPort for EscActuator<I2C> {
    fn write(&mut self, command: Command) -> HwResult<()> {
        let pulse_us = command_to_pulse_us(command);
        debug!(vessel = %self.id, command, pulse_us, "esc write");
        self.set_pulse(pulse_us)
    }

    fn stop(&mut self) -> HwResult<()> {
        debug!(vessel = %self.id, "esc stop");
        self.set_pulse(NEUTRAL_PULSE_US)
    }
}
