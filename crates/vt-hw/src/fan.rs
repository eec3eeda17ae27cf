//! Enclosure fan on a PCA9685 channel.

use embedded_hal::i2c::I2c;
use vt_core::VesselId;

use crate::bus::BusArbiter;
use crate::error::HwResult;
use crate::pca9685::Pca9685;

/// 16-bit duty for a speed in percent, truncating.
pub fn speed_to_duty(percent: u8) -> u16 {
    let fraction = f64::from(percent.min(100)) / 100.0;
    (fraction * f64::from(u16::MAX)) as u16
}

#[derive(Debug)]
pub struct PcFan<I2C> {
    id: VesselId,
    channel: u8,
    bus: BusArbiter<Pca9685<I2C>>,
}

impl<I2C: I2c> PcFan<I2C> {
    pub fn new(id: VesselId, channel: u8, bus: BusArbiter<Pca9685<I2C>>) -> HwResult<Self> {
        bus.transaction(|pca| pca.init())?;
        Ok(Self { id, channel, bus })
    }

    pub fn id(&self) -> VesselId {
        self.id
    }

    /// Speed in percent; values above 100 are treated as 100.
    pub fn set_speed(&mut self, percent: u8) -> HwResult<()> {
        let channel = self.channel;
        let duty = speed_to_duty(percent);
        self.bus.transaction(|pca| pca.set_pwm(channel, duty))
    }

    pub fn start(&mut self) -> HwResult<()> {
        self.set_speed(100)
    }

    pub fn stop(&mut self) -> HwResult<()> {
        self.set_speed(0)
    }
}
