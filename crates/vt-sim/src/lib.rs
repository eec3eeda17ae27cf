//! Simulated vessels for running the control loop without hardware.
//!
//! Provides:
//! - Lumped thermal model of one vessel with a lagged heating/cooling actuator
//! - Simulated shared bus with optional, bounded transaction recording
//! - Sensor and actuator handles implementing the hardware port traits

pub mod bus;
pub mod error;
pub mod plant;
pub mod vessel;

pub use bus::{BusRecorder, BusTransaction, SimBus};
pub use error::{SimError, SimResult};
pub use plant::{PlantParams, VesselPlant};
pub use vessel::{SimActuator, SimSensor, SimulatedVessel};
