//! Working set owned by one simulator.

use crate::simulation::motion::advance;
use crate::telemetry::VehicleRecord;
use std::collections::HashMap;
use tokio::time::Instant;

#[derive(Debug, Default)]
pub struct SimulationState {
    vehicles: Vec<VehicleRecord>,
    generation: u64,
    ticks: u64,
    expires_at: Option<Instant>,
    running: bool,
}

impl SimulationState {
    /// Replaces the working set and opens a new run. Returns the run's
    /// generation; ticks carrying an older generation are ignored.
    ///
    /// A repeated id overwrites the earlier record in place.
    pub fn reseed(&mut self, records: Vec<VehicleRecord>, expires_at: Instant) -> u64 {
        let mut positions: HashMap<String, usize> = HashMap::with_capacity(records.len());
        let mut vehicles: Vec<VehicleRecord> = Vec::with_capacity(records.len());
        for record in records {
            match positions.get(&record.id) {
                Some(&at) => vehicles[at] = record,
                None => {
                    positions.insert(record.id.clone(), vehicles.len());
                    vehicles.push(record);
                }
            }
        }

        self.vehicles = vehicles;
        self.generation += 1;
        self.ticks = 0;
        self.expires_at = Some(expires_at);
        self.running = true;
        self.generation
    }

    pub fn step(&mut self, scale: f64) {
        for vehicle in self.vehicles.iter_mut() {
            *vehicle = advance(vehicle, scale);
        }
        self.ticks += 1;
    }

    /// Steps only if `generation` is still the current run.
    pub fn step_run(&mut self, generation: u64, scale: f64) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.step(scale);
        true
    }

    /// Marks the run idle if it is still the current one.
    pub fn finish_run(&mut self, generation: u64) {
        if self.is_current(generation) {
            self.running = false;
        }
    }

    pub fn halt(&mut self) {
        self.running = false;
    }

    pub fn snapshot(&self) -> Vec<VehicleRecord> {
        self.vehicles.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    fn is_current(&self, generation: u64) -> bool {
        self.running && self.generation == generation
    }
}
