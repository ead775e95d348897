//! One conversation: its transcript and the single simulator it owns.

use crate::chat::{ChatBackend, ChatMessage};
use crate::config::SimulationConfig;
use crate::simulation::{SimulationError, SimulationPhase, Simulator};
use crate::telemetry::{Extractor, VehicleRecord};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

pub struct ChatSession {
    id: Uuid,
    transcript: Vec<ChatMessage>,
    backend: Arc<dyn ChatBackend>,
    simulator: Simulator,
    closed: bool,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn ChatBackend>, config: SimulationConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            transcript: Vec::new(),
            backend,
            simulator: Simulator::new(config),
            closed: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// Sends `text` to the backend and records both sides of the turn.
    ///
    /// Blank input is ignored and yields `None`. A failing backend becomes
    /// an `Error: ...` bot message rather than an error for the caller.
    #[instrument(skip(self, text), fields(session = %self.id))]
    pub async fn send(&mut self, text: &str) -> Result<Option<ChatMessage>, SimulationError> {
        let Some(backend) = self.begin_turn(text) else {
            return Ok(None);
        };
        let reply = Self::fetch_reply(backend.as_ref(), text).await;
        self.finish_turn(reply)
    }

    /// First half of a turn: records the user message and hands out the
    /// backend, so the caller can await the reply without holding the session.
    pub fn begin_turn(&mut self, text: &str) -> Option<Arc<dyn ChatBackend>> {
        if text.trim().is_empty() {
            return None;
        }
        self.transcript.push(ChatMessage::user(text));
        Some(self.backend.clone())
    }

    pub async fn fetch_reply(backend: &dyn ChatBackend, text: &str) -> String {
        match backend.reply(text).await {
            Ok(content) => content,
            Err(e) => {
                error!(error = %e, "Chat backend call failed");
                format!("Error: {}", e)
            }
        }
    }

    /// Second half of a turn: records the reply and returns it.
    pub fn finish_turn(&mut self, reply: String) -> Result<Option<ChatMessage>, SimulationError> {
        self.receive_reply(reply)?;
        Ok(self.transcript.last().cloned())
    }

    /// Records an already-resolved bot reply and re-seeds the simulator if
    /// the reply carries telemetry. Returns how many vehicles were found.
    /// A closed session records the reply but never restarts its simulator.
    pub fn receive_reply(&mut self, reply: impl Into<String>) -> Result<usize, SimulationError> {
        let message = ChatMessage::bot(reply);
        let vehicles = Extractor::extract(&message.text);
        self.transcript.push(message);

        if vehicles.is_empty() {
            debug!(session = %self.id, "Reply carries no telemetry");
            return Ok(0);
        }

        let found = vehicles.len();
        if self.closed {
            debug!(session = %self.id, vehicles = found, "Session closed, not seeding");
            return Ok(0);
        }
        self.simulator.seed(vehicles)?;
        info!(session = %self.id, vehicles = found, "Vehicle simulation started");
        Ok(found)
    }

    /// Vehicles embedded in the bot message at `index`, as first reported.
    pub fn vehicles_in(&self, index: usize) -> Vec<VehicleRecord> {
        self.transcript
            .get(index)
            .filter(|message| message.is_bot())
            .map(|message| Extractor::extract(&message.text))
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> Vec<VehicleRecord> {
        self.simulator.snapshot()
    }

    pub fn phase(&self) -> SimulationPhase {
        self.simulator.phase()
    }

    /// Session teardown: no ticker survives this call.
    pub fn close(&mut self) {
        self.closed = true;
        self.simulator.stop();
        info!(session = %self.id, "Session closed");
    }
}
