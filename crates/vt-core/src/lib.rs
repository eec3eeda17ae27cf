//! vt-core: shared foundation for the vessel thermostat workspace.
//!
//! Contains:
//! - ids (vessel identity)
//! - numeric (Real, finite checks, actuator-domain conversion)
//! - clock (monotonic and manual time sources)
//! - error (shared error types)

pub mod clock;
pub mod error;
pub mod ids;
pub mod numeric;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use error::{VtError, VtResult};
pub use ids::VesselId;
pub use numeric::*;
