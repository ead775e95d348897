//! Discrete-time motion simulation of extracted vehicles.
//! Seeds from a telemetry extraction, dead-reckons every vehicle on a fixed
//! tick and stops on its own after a bounded run.

pub mod motion;
pub mod simulator;
pub mod state;

pub use simulator::{SimulationPhase, Simulator};
pub use state::SimulationState;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("No timer available: seed must be called inside a tokio runtime")]
    SchedulerUnavailable,
    #[error("Invalid simulation config: {0}")]
    InvalidConfig(#[from] crate::config::ConfigError),
}
