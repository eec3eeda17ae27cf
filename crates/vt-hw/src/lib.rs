//! Hardware boundary for vessel temperature control.
//!
//! ```text
//!   driver ──▶ BusArbiter ──▶ physical bus
//!     ▲
//!     └── SensorPort / ActuatorPort ◀── reactor core
//! ```
//!
//! The reactor core only sees the port traits in [`ports`]. Drivers implement
//! them and route every transaction through a [`BusArbiter`], so devices
//! sharing one physical bus never interleave partial transactions.
//!
//! Drivers:
//! - [`w1`]: DS18B20 probes on the one-wire bus (Linux sysfs)
//! - [`pca9685`]: 16-channel PWM expander on I2C
//! - [`esc`]: bidirectional heating/cooling actuator on an expander channel
//! - [`fan`]: PC fan on an expander channel

pub mod bus;
pub mod device_map;
pub mod error;
pub mod esc;
pub mod fan;
pub mod pca9685;
pub mod ports;
pub mod w1;

pub use bus::{BusArbiter, BusLock};
pub use device_map::DeviceMap;
pub use error::{HwError, HwResult};
pub use esc::EscActuator;
pub use fan::PcFan;
pub use pca9685::Pca9685;
pub use ports::{ActuatorPort, SensorPort};
pub use w1::{W1Bus, WaterTemperatureSensor, parse_w1_slave};
