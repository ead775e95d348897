use crate::chat::{ChatBackend, ChatMessage, ChatSession};
use crate::config::AppConfig;
use crate::simulation::SimulationPhase;
use crate::telemetry::VehicleRecord;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

// Session registry shared by every front-end call
pub struct AppState {
    pub config: AppConfig,
    backend: Arc<dyn ChatBackend>,
    sessions: RwLock<HashMap<Uuid, Arc<Mutex<ChatSession>>>>,
}

/// Payload handed to the map renderer.
#[derive(Serialize, Debug)]
pub struct VehicleSnapshot {
    pub session_id: Uuid,
    pub phase: SimulationPhase,
    pub vehicles: Vec<VehicleRecord>,
}

impl AppState {
    pub fn new(config: AppConfig, backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            config,
            backend,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    async fn session(&self, session_id: &str) -> Result<Arc<Mutex<ChatSession>>, String> {
        let id = Uuid::parse_str(session_id).map_err(|_| "Invalid session id!".to_string())?;
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| format!("Unknown session {}", id))
    }
}

/* ---------- 1.  SESSION LIFECYCLE ---------- */

pub async fn open_session(state: &AppState) -> Result<String, String> {
    let session = ChatSession::new(state.backend.clone(), state.config.simulation.clone());
    let id = session.id();
    state
        .sessions
        .write()
        .await
        .insert(id, Arc::new(Mutex::new(session)));
    Ok(id.to_string())
}

pub async fn close_session(state: &AppState, session_id: &str) -> Result<String, String> {
    let session = state.session(session_id).await?;
    let mut guard = session.lock().await;
    state.sessions.write().await.remove(&guard.id());
    guard.close();
    Ok("Session closed".to_string())
}

/* ---------- 2.  CONVERSATION ---------- */

pub async fn send_message(
    state: &AppState,
    session_id: &str,
    message: String,
) -> Result<Option<ChatMessage>, String> {
    let session = state.session(session_id).await?;
    // the session stays unlocked while the backend is thinking
    let backend = match session.lock().await.begin_turn(&message) {
        Some(backend) => backend,
        None => return Ok(None),
    };
    let reply = ChatSession::fetch_reply(backend.as_ref(), &message).await;
    let result = session
        .lock()
        .await
        .finish_turn(reply)
        .map_err(|e| e.to_string());
    result
}

pub async fn receive_reply(
    state: &AppState,
    session_id: &str,
    reply: String,
) -> Result<usize, String> {
    let session = state.session(session_id).await?;
    let mut guard = session.lock().await;
    guard.receive_reply(reply).map_err(|e| e.to_string())
}

/* ---------- 3.  MAP STATE ---------- */

pub async fn simulation_phase(
    state: &AppState,
    session_id: &str,
) -> Result<SimulationPhase, String> {
    let session = state.session(session_id).await?;
    let phase = session.lock().await.phase();
    Ok(phase)
}

/// Current vehicle positions of a session, serialized for the renderer.
pub async fn vehicle_snapshot(state: &AppState, session_id: &str) -> Result<String, String> {
    let session = state.session(session_id).await?;
    let guard = session.lock().await;
    let snapshot = VehicleSnapshot {
        session_id: guard.id(),
        phase: guard.phase(),
        vehicles: guard.snapshot(),
    };
    serde_json::to_string(&snapshot).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatError;
    use async_trait::async_trait;
    use std::time::Duration;

    struct EchoBackend;

    #[async_trait]
    impl ChatBackend for EchoBackend {
        async fn reply(&self, message: &str) -> Result<String, ChatError> {
            Ok(format!("Vehicle ID: 1 Location: 10.0, 20.0 Heading: 0 Speed: 100 ({})", message))
        }
    }

    struct SlowBackend;

    #[async_trait]
    impl ChatBackend for SlowBackend {
        async fn reply(&self, _message: &str) -> Result<String, ChatError> {
            tokio::time::sleep(Duration::from_secs(20)).await;
            Ok("Vehicle ID: 2 Location: 3.0, 4.0 Speed: 5".to_string())
        }
    }

    fn app() -> AppState {
        AppState::new(AppConfig::default(), Arc::new(EchoBackend))
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_round_trip_through_commands() {
        let state = app();
        let id = open_session(&state).await.unwrap();

        let reply = send_message(&state, &id, "where?".to_string()).await.unwrap();
        assert!(reply.unwrap().text.ends_with("(where?)"));

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        let json: serde_json::Value =
            serde_json::from_str(&vehicle_snapshot(&state, &id).await.unwrap()).unwrap();

        assert_eq!(json["phase"], "Running");
        assert_eq!(json["vehicles"][0]["id"], "1");
        let latitude = json["vehicles"][0]["location"][0].as_f64().unwrap();
        assert!((latitude - 10.1).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn receive_reply_reports_vehicle_count() {
        let state = app();
        let id = open_session(&state).await.unwrap();

        let found = receive_reply(&state, &id, "nothing here".to_string()).await.unwrap();
        assert_eq!(found, 0);
        let found = receive_reply(&state, &id, "Vehicle ID: 3 Location: 1, 1".to_string())
            .await
            .unwrap();
        assert_eq!(found, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_session_is_forgotten() {
        let state = app();
        let id = open_session(&state).await.unwrap();
        receive_reply(&state, &id, "Vehicle ID: 3 Location: 1, 1".to_string())
            .await
            .unwrap();

        assert_eq!(close_session(&state, &id).await.unwrap(), "Session closed");
        assert!(vehicle_snapshot(&state, &id).await.is_err());
        assert!(close_session(&state, &id).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn pending_reply_does_not_block_the_session() {
        let state = Arc::new(AppState::new(AppConfig::default(), Arc::new(SlowBackend)));
        let id = open_session(&state).await.unwrap();
        receive_reply(&state, &id, "Vehicle ID: 1 Location: 0, 0".to_string())
            .await
            .unwrap();
        let session = state.session(&id).await.unwrap();

        let pending = tokio::spawn({
            let state = state.clone();
            let id = id.clone();
            async move { send_message(&state, &id, "anyone there?".to_string()).await }
        });
        tokio::task::yield_now().await;

        let wait = Duration::from_millis(500);
        let snapshot = tokio::time::timeout(wait, vehicle_snapshot(&state, &id)).await;
        assert!(snapshot.expect("snapshot while a reply is pending").is_ok());
        let closed = tokio::time::timeout(wait, close_session(&state, &id)).await;
        assert_eq!(closed.expect("close while a reply is pending").unwrap(), "Session closed");

        // the late telemetry reply is recorded but does not restart the closed session
        let reply = pending.await.unwrap().unwrap().unwrap();
        assert!(reply.is_bot());
        let session = session.lock().await;
        assert_eq!(session.transcript().len(), 3);
        assert_eq!(session.phase(), SimulationPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn phase_is_reported_as_a_typed_value() {
        let state = app();
        let id = open_session(&state).await.unwrap();
        assert_eq!(simulation_phase(&state, &id).await.unwrap(), SimulationPhase::Idle);

        send_message(&state, &id, "where?".to_string()).await.unwrap();
        assert_eq!(simulation_phase(&state, &id).await.unwrap(), SimulationPhase::Running);

        tokio::time::sleep(Duration::from_millis(10_500)).await;
        assert_eq!(simulation_phase(&state, &id).await.unwrap(), SimulationPhase::Idle);
        assert!(simulation_phase(&state, "not-a-uuid").await.is_err());
    }

    #[tokio::test]
    async fn malformed_session_id_is_rejected() {
        let state = app();
        let err = vehicle_snapshot(&state, "not-a-uuid").await.unwrap_err();
        assert_eq!(err, "Invalid session id!");
    }
}
