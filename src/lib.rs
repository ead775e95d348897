pub mod chat;
pub mod commands;
pub mod config;
pub mod simulation;
pub mod telemetry;

use crate::chat::HttpChatBackend;
use crate::commands::*;
use crate::config::AppConfig;
use crate::simulation::SimulationPhase;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Canned first exchange shown when the widget opens.
pub const DEMO_PROMPT: &str =
    "Find me the vehicle statuses within 5 miles of location 1669 Euclid Ave, Boulder, CO 80309";

pub const DEMO_REPLY: &str = "Here are the vehicle statuses within 5 miles of 1669 Euclid Ave, Boulder, CO 80309:

1. Vehicle ID: 100905
  - Location: 40.00666427612305, -105.28015899658203
  - Heading: 226
  - Onboard quantity: 1000
  - Speed: 11.384
  - Last reported timestamp: 2024-10-01T09:35:18.000Z

2. Vehicle ID: 100258
  - Location: 40.04490661621094, -105.26258850097656
  - Heading: 166
  - Onboard quantity: 1364
  - Speed: 7.3385
  - Last reported timestamp: 2024-10-01T09:39:21.000Z

3. Vehicle ID: 100492
  - Location: 40.04677200317383, -105.26612854003906
  - Heading: 302
  - Onboard quantity: 967
  - Speed: 25.5408
  - Last reported timestamp: 2024-10-01T09:39:11.000Z

4. Vehicle ID: 100401
  - Location: 40.04257781982422, -105.2877133178711
  - Heading: 266
  - Onboard quantity: 809
  - Speed: 34.6396
  - Last reported timestamp: 2024-10-01T09:05:52.000Z";

/// Runs one session and prints the simulated fleet on every tick until
/// the run expires. With `prompt` the reply comes from the chat backend,
/// otherwise the canned demo exchange is used.
pub async fn run(prompt: Option<String>) -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();

    let config = AppConfig::from_env()?;
    let backend = HttpChatBackend::new(&config.backend)?;
    let tick = config.simulation.tick_interval();
    let state = AppState::new(config, Arc::new(backend));

    let session = open_session(&state).await.map_err(anyhow::Error::msg)?;
    match prompt {
        Some(prompt) => {
            let reply = send_message(&state, &session, prompt)
                .await
                .map_err(anyhow::Error::msg)?;
            if let Some(reply) = reply {
                println!("{}", reply.text);
            }
        }
        None => {
            tokio::time::sleep(Duration::from_secs(1)).await;
            println!("> {}\n{}", DEMO_PROMPT, DEMO_REPLY);
            let found = receive_reply(&state, &session, DEMO_REPLY.to_string())
                .await
                .map_err(anyhow::Error::msg)?;
            info!(vehicles = found, "Demo conversation loaded");
        }
    }

    let mut interval = tokio::time::interval(tick);
    loop {
        interval.tick().await;
        let snapshot = vehicle_snapshot(&state, &session)
            .await
            .map_err(anyhow::Error::msg)?;
        println!("{}", snapshot);
        let phase = simulation_phase(&state, &session)
            .await
            .map_err(anyhow::Error::msg)?;
        if phase != SimulationPhase::Running {
            break;
        }
    }

    close_session(&state, &session).await.map_err(anyhow::Error::msg)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::Extractor;

    #[test]
    fn demo_reply_carries_the_whole_fleet() {
        let vehicles = Extractor::extract(DEMO_REPLY);
        let ids: Vec<&str> = vehicles.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, ["100905", "100258", "100492", "100401"]);
        assert_eq!(vehicles[3].onboard_quantity, 809);
    }
}
