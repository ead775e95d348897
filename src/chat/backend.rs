//! Request/response client for the conversational backend.

use crate::config::BackendConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{instrument, warn};

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Request timeout - the chat backend took too long to respond")]
    Timeout,
    #[error("Connection error - unable to reach the chat backend")]
    Unreachable,
    #[error("Network error: {0}")]
    Network(String),
    #[error("HTTP error! status: {0}")]
    Status(u16),
    #[error("Failed to decode backend reply: {0}")]
    Decode(String),
    #[error("Backend configuration error: {0}")]
    Config(String),
}

#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Sends one user message and returns the reply text.
    async fn reply(&self, message: &str) -> Result<String, ChatError>;
}

#[derive(Serialize, Debug)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize, Debug)]
struct ChatReply {
    content: String,
}

pub struct HttpChatBackend {
    client: Client,
    endpoint: String,
}

impl HttpChatBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, ChatError> {
        let endpoint = config
            .validate()
            .map_err(|e| ChatError::Config(e.to_string()))?;
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ChatError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    #[instrument(skip(self, message), fields(endpoint = %self.endpoint))]
    async fn reply(&self, message: &str) -> Result<String, ChatError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ChatRequest { message })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChatError::Timeout
                } else if e.is_connect() {
                    ChatError::Unreachable
                } else {
                    ChatError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Chat backend returned an error status");
            return Err(ChatError::Status(status.as_u16()));
        }

        let reply: ChatReply = response
            .json()
            .await
            .map_err(|e| ChatError::Decode(e.to_string()))?;
        Ok(reply.content)
    }
}
