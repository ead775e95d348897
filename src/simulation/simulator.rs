//! Per-session motion simulator: one working set, at most one ticker.

use crate::config::SimulationConfig;
use crate::simulation::{state::SimulationState, SimulationError};
use crate::telemetry::VehicleRecord;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationPhase {
    Idle,
    Running,
}

pub struct Simulator {
    config: SimulationConfig,
    pub(super) state: Arc<Mutex<SimulationState>>,
    ticker: Option<JoinHandle<()>>,
}

impl Simulator {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(SimulationState::default())),
            ticker: None,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Replaces the working set with `records` and starts a fresh run.
    ///
    /// Any previous run is cancelled first. The run ticks every
    /// `tick_interval` and stops itself `run_duration` after this call.
    pub fn seed(&mut self, records: Vec<VehicleRecord>) -> Result<(), SimulationError> {
        let runtime = Handle::try_current().map_err(|_| SimulationError::SchedulerUnavailable)?;
        self.config.validate()?;

        self.stop();

        let period = self.config.tick_interval();
        let seeded_at = Instant::now();
        let first_tick = seeded_at + period;
        let expires_at = seeded_at + self.config.run_duration();
        let vehicles = records.len();
        let generation = lock(&self.state).reseed(records, expires_at);

        self.ticker = Some(runtime.spawn(drive(
            Arc::clone(&self.state),
            generation,
            first_tick,
            period,
            expires_at,
            self.config.scale_factor,
        )));

        info!(
            generation,
            vehicles,
            tick_ms = self.config.tick_interval_ms,
            duration_ms = self.config.run_duration_ms,
            "Simulation seeded"
        );
        Ok(())
    }

    /// Advances every tracked vehicle by one step.
    pub fn tick(&self) {
        lock(&self.state).step(self.config.scale_factor);
    }

    /// Owned copy of the current vehicles, in seed order.
    pub fn snapshot(&self) -> Vec<VehicleRecord> {
        lock(&self.state).snapshot()
    }

    /// Cancels the active run. A no-op when nothing is running.
    pub fn stop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
            debug!("Simulation ticker cancelled");
        }
        lock(&self.state).halt();
    }

    pub fn phase(&self) -> SimulationPhase {
        if lock(&self.state).is_running() {
            SimulationPhase::Running
        } else {
            SimulationPhase::Idle
        }
    }

    /// Steps taken since the last seed.
    pub fn ticks(&self) -> u64 {
        lock(&self.state).ticks()
    }

    pub fn expires_at(&self) -> Option<Instant> {
        lock(&self.state).expires_at()
    }
}

impl Drop for Simulator {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Ticker body. Ticks run sequentially inside this one task, so a slow
/// step delays the next one instead of overlapping it. Expiry wins a tie.
/// The schedule is anchored at seed time, not at the task's first poll.
async fn drive(
    state: Arc<Mutex<SimulationState>>,
    generation: u64,
    first_tick: Instant,
    period: Duration,
    expires_at: Instant,
    scale: f64,
) {
    let mut interval = time::interval_at(first_tick, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let expiry = time::sleep_until(expires_at);
    tokio::pin!(expiry);

    loop {
        tokio::select! {
            biased;
            _ = &mut expiry => break,
            _ = interval.tick() => {
                if !lock(&state).step_run(generation, scale) {
                    return;
                }
            }
        }
    }

    let mut guard = lock(&state);
    guard.finish_run(generation);
    debug!(generation, ticks = guard.ticks(), "Simulation expired");
}

fn lock(state: &Mutex<SimulationState>) -> MutexGuard<'_, SimulationState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
