//! Port traits consumed by the reactor core.
//!
//! Drivers (real or simulated) implement these; the core never touches a bus
//! directly. Both calls may block while the driver waits for its bus.

use vt_core::Command;

use crate::error::HwResult;

/// Read side: one temperature probe.
pub trait SensorPort {
    /// Current temperature in °C.
    fn read_temperature(&mut self) -> HwResult<f64>;
}

/// Write side: one heating/cooling actuator.
pub trait ActuatorPort {
    /// Apply a bounded command, nominally in `[-100, 100]`.
    fn write(&mut self, command: Command) -> HwResult<()>;

    /// Force the neutral output. The only safety primitive.
    fn stop(&mut self) -> HwResult<()>;
}

impl<T: SensorPort + ?Sized> SensorPort for Box<T> {
    fn read_temperature(&mut self) -> HwResult<f64> {
        (**self).read_temperature()
    }
}

impl<T: ActuatorPort + ?Sized> ActuatorPort for Box<T> {
    fn write(&mut self, command: Command) -> HwResult<()> {
        (**self).write(command)
    }

    fn stop(&mut self) -> HwResult<()> {
        (**self).stop()
    }
}
