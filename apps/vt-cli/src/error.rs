//! Error type for the command line front end.

use vt_core::VesselId;
use vt_hw::HwError;
use vt_reactor::ReactorError;
use vt_sim::SimError;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Reactor(#[from] ReactorError),

    #[error(transparent)]
    Hw(#[from] HwError),

    #[error("Simulation error: {0}")]
    Sim(#[from] SimError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("Tick panicked for {vessel}")]
    TickPanicked { vessel: VesselId },

    #[error("Control task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("{failed} of {total} sensor reads failed")]
    SensorReads { failed: usize, total: usize },
}
