//! Push delivery of notification messages
//!
//! The scheduler talks to the [`Delivery`] trait; [`PushDelivery`] is the
//! HTTP implementation over a Telegram-style bot endpoint. Delivery
//! failures are terminal for the message: they are logged and the tick
//! moves on, no retry and no queue.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::DeliveryConfig;
use crate::domain::UserId;

/// Errors sending a push message
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("push API rejected message (status {status}): {description}")]
    Api { status: u16, description: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("delivery timed out after {0:?}")]
    Timeout(Duration),

    #[error("push token not set (env var {0})")]
    MissingToken(String),
}

/// Outbound message transport
#[async_trait]
pub trait Delivery: Send + Sync {
    async fn send(&self, user_id: UserId, text: &str) -> Result<(), DeliveryError>;
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    description: String,
}

/// HTTP push client for a bot-API endpoint
pub struct PushDelivery {
    base_url: String,
    token: String,
    http: Client,
}

impl PushDelivery {
    /// Create a client from configuration.
    ///
    /// The token comes from the environment variable named in config, so
    /// it never lands in a config file on disk.
    pub fn from_config(config: &DeliveryConfig) -> Result<Self, DeliveryError> {
        let token =
            std::env::var(&config.token_env).map_err(|_| DeliveryError::MissingToken(config.token_env.clone()))?;

        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token,
            http,
        })
    }
}

#[async_trait]
impl Delivery for PushDelivery {
    async fn send(&self, user_id: UserId, text: &str) -> Result<(), DeliveryError> {
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.token);
        debug!(user_id, chars = text.len(), "send: posting message");

        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({
                "chat_id": user_id,
                "text": text,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body: ApiErrorBody = response.json().await.unwrap_or(ApiErrorBody {
                description: String::new(),
            });
            return Err(DeliveryError::Api {
                status: status.as_u16(),
                description: body.description,
            });
        }

        debug!(user_id, "send: delivered");
        Ok(())
    }
}
