//! Feedback-law primitives for vessel temperature control.
//!
//! This crate provides the PID feedback law used by every vessel and the
//! anti-windup policy the reactor orchestrator layers around it.
//!
//! # Architecture
//!
//! - [`PidController`] is a stateful, sampled controller: it owns its gains,
//!   setpoint, accumulators and output bounds, and exposes the contribution
//!   of each term after every computation.
//! - [`SaturationGuard`] is a policy object, not part of the feedback law. It
//!   inspects the controller's last components and overrides `Ki` before the
//!   next computation.
//! - Controllers operate in sampled mode: calling `compute` faster than the
//!   sample period holds the previous output.

pub mod anti_windup;
pub mod error;
pub mod pid;
pub mod sampled;

pub use anti_windup::{SaturationGuard, WindupState};
pub use error::{ControlError, ControlResult};
pub use pid::{Components, OutputLimits, PidConfig, PidController, PidGains};
pub use sampled::SampleConfig;
