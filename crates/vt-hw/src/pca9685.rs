//! PCA9685 16-channel, 12-bit PWM expander.
//!
//! Duty cycles are given as 16-bit values (`0..=0xFFFF`) and reduced to the
//! chip's 12-bit resolution. `0` and `0xFFFF` use the dedicated full-off and
//! full-on bits so the extremes are exact.

use embedded_hal::i2c::I2c;

use crate::error::{HwError, HwResult};

/// Factory-default I2C address.
pub const DEFAULT_ADDRESS: u8 = 0x40;
/// Servo-style update rate used for ESCs.
pub const DEFAULT_FREQUENCY_HZ: f64 = 50.0;
pub const CHANNELS: u8 = 16;

const OSCILLATOR_HZ: f64 = 25_000_000.0;

const MODE1: u8 = 0x00;
const MODE2: u8 = 0x01;
const LED0_ON_L: u8 = 0x06;
const PRESCALE: u8 = 0xFE;

const MODE1_SLEEP: u8 = 0x10;
const MODE1_AUTO_INCREMENT: u8 = 0x20;
const MODE2_OUTDRV: u8 = 0x04;

const FULL_BIT: u16 = 0x1000;

/// PCA9685 driver over any `embedded-hal` I2C bus.
#[derive(Debug)]
pub struct Pca9685<I2C> {
    i2c: I2C,
    address: u8,
    frequency_hz: f64,
    initialised: bool,
}

impl<I2C: I2c> Pca9685<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            frequency_hz: DEFAULT_FREQUENCY_HZ,
            initialised: false,
        }
    }

    /// Set the PWM frequency applied by the next [`init`](Self::init).
    pub fn with_frequency(mut self, frequency_hz: f64) -> Self {
        self.frequency_hz = frequency_hz;
        self
    }

    pub fn frequency_hz(&self) -> f64 {
        self.frequency_hz
    }

    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    /// Prescaler register value for the configured frequency.
    pub fn prescale(&self) -> u8 {
        let raw = (OSCILLATOR_HZ / (4096.0 * self.frequency_hz)).round() - 1.0;
        raw.clamp(3.0, 255.0) as u8
    }

    /// Configure mode registers and prescaler. Later calls are no-ops.
    pub fn init(&mut self) -> HwResult<()> {
        if self.initialised {
            return Ok(());
        }
        if !(self.frequency_hz.is_finite() && self.frequency_hz > 0.0) {
            return Err(HwError::InvalidArg {
                what: "PWM frequency must be positive",
            });
        }
        // The prescaler can only be written while the oscillator sleeps.
        self.write_register(MODE1, MODE1_SLEEP)?;
        self.write_register(PRESCALE, self.prescale())?;
        self.write_register(MODE1, MODE1_AUTO_INCREMENT)?;
        self.write_register(MODE2, MODE2_OUTDRV)?;
        self.initialised = true;
        Ok(())
    }

    /// Set one channel to a 16-bit duty cycle.
    pub fn set_pwm(&mut self, channel: u8, duty: u16) -> HwResult<()> {
        if channel >= CHANNELS {
            return Err(HwError::InvalidArg {
                what: "PCA9685 channel out of range",
            });
        }
        let (on, off) = match duty {
            0 => (0, FULL_BIT),
            u16::MAX => (FULL_BIT, 0),
            d => (0, d >> 4),
        };
        let register = LED0_ON_L + 4 * channel;
        let [on_l, on_h] = on.to_le_bytes();
        let [off_l, off_h] = off.to_le_bytes();
        self.write(&[register, on_l, on_h, off_l, off_h])
    }

    /// Give the I2C bus back.
    pub fn release(self) -> I2C {
        self.i2c
    }

    fn write_register(&mut self, register: u8, value: u8) -> HwResult<()> {
        self.write(&[register, value])
    }

    fn write(&mut self, bytes: &[u8]) -> HwResult<()> {
        self.i2c
            .write(self.address, bytes)
            .map_err(|e| HwError::bus(format!("pca9685@{:#04x}", self.address), format!("{e:?}")))
    }
}

/// 16-bit duty for a pulse of `pulse_us` at `frequency_hz`.
pub fn pulse_to_duty(pulse_us: f64, frequency_hz: f64) -> u16 {
    let period_us = 1_000_000.0 / frequency_hz;
    let fraction = (pulse_us / period_us).clamp(0.0, 1.0);
    (fraction * f64::from(u16::MAX)).round() as u16
}
