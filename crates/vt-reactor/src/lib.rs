//! vt-reactor: per-vessel temperature control.
//!
//! A [`ReactorController`] ties one sensor, one actuator and one PID
//! controller together and records a [`ControlSample`] for every tick it
//! applies. Plant configuration and telemetry export live here as well.

pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod telemetry;

pub use config::{
    BusConfig, CONFIG_VERSION, MIN_TICK_PERIOD, PlantConfig, SimConfig, ValidationError,
    VesselConfig, load_json, load_yaml, save_yaml, validate_config,
};
pub use controller::{ReactorController, TickOutcome};
pub use error::{ReactorError, ReactorResult};
pub use export::{export_channels, export_jsonl, export_timestamp, now_timestamp};
pub use telemetry::{ControlSample, TelemetryChannel, TelemetryLog};
