use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid simulation setting: {0}")]
    Simulation(String),
    #[error("Invalid backend endpoint {endpoint}: {reason}")]
    Endpoint { endpoint: String, reason: String },
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub simulation: SimulationConfig,
    pub backend: BackendConfig,
}

/// Tunables for the motion simulator.
///
/// `scale_factor` turns a speed in source units into map-coordinate
/// displacement per tick. It is picked for a pleasant animation on the map,
/// not derived from any physical unit conversion.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    pub tick_interval_ms: u64,
    pub run_duration_ms: u64,
    pub scale_factor: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            run_duration_ms: 10_000,
            scale_factor: 0.001,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000/chat".to_string(),
            timeout_secs: 30,
        }
    }
}

impl SimulationConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn run_duration(&self) -> Duration {
        Duration::from_millis(self.run_duration_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Simulation(
                "tick interval must be greater than zero".to_string(),
            ));
        }
        if self.run_duration_ms == 0 {
            return Err(ConfigError::Simulation(
                "run duration must be greater than zero".to_string(),
            ));
        }
        if !self.scale_factor.is_finite() {
            return Err(ConfigError::Simulation(format!(
                "scale factor must be finite, got {}",
                self.scale_factor
            )));
        }
        Ok(())
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.endpoint).map_err(|e| ConfigError::Endpoint {
            endpoint: self.endpoint.clone(),
            reason: e.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::Endpoint {
                endpoint: self.endpoint.clone(),
                reason: format!("unsupported scheme '{}'", other),
            }),
        }
    }
}

impl AppConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `.env` / process environment.
    /// ENV vars: FLEETCHAT_TICK_MS, FLEETCHAT_DURATION_MS, FLEETCHAT_SCALE,
    /// FLEETCHAT_ENDPOINT, FLEETCHAT_TIMEOUT_SECS
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let mut config = AppConfig::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulation.validate()?;
        self.backend.validate()?;
        Ok(())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let sim = &mut self.simulation;
        sim.tick_interval_ms = parse_or(lookup("FLEETCHAT_TICK_MS"), sim.tick_interval_ms);
        sim.run_duration_ms = parse_or(lookup("FLEETCHAT_DURATION_MS"), sim.run_duration_ms);
        sim.scale_factor = parse_or(lookup("FLEETCHAT_SCALE"), sim.scale_factor);

        if let Some(endpoint) = lookup("FLEETCHAT_ENDPOINT") {
            self.backend.endpoint = endpoint;
        }
        self.backend.timeout_secs =
            parse_or(lookup("FLEETCHAT_TIMEOUT_SECS"), self.backend.timeout_secs);
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, fallback: T) -> T {
    raw.and_then(|value| value.trim().parse().ok())
        .unwrap_or(fallback)
}
