// Path: crates/alerting/src/sink.rs
use async_trait::async_trait;
use govwatch_types::{config::SlackConfig, error::SinkError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Delivers one alert to the downstream notification channel.
///
/// Errors are reported back so the engine can leave the alert eligible for the
/// next cycle. Sinks do not retry synchronously.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn send(&self, message: &str) -> Result<(), SinkError>;

    /// A short label for logs.
    fn name(&self) -> &'static str;
}

/// Posts alerts to a Slack channel through `chat.postMessage`.
pub struct SlackSink {
    client: Client,
    api_url: String,
    bot_token: String,
    channel_id: String,
}

#[derive(Serialize)]
struct PostMessage<'a> {
    channel: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct SlackResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

impl SlackSink {
    pub fn new(config: &SlackConfig, timeout: Duration) -> Result<Self, SinkError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SinkError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
            channel_id: config.channel_id.clone(),
        })
    }
}

#[async_trait]
impl AlertSink for SlackSink {
    async fn send(&self, message: &str) -> Result<(), SinkError> {
        let url = format!("{}/chat.postMessage", self.api_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.bot_token)
            .json(&PostMessage {
                channel: &self.channel_id,
                text: message,
            })
            .send()
            .await
            .map_err(|e| SinkError::Transport(format!("Slack request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::Transport(format!(
                "Slack returned HTTP {}: {}",
                status.as_u16(),
                body.chars().take(160).collect::<String>()
            )));
        }

        // Slack reports most failures as HTTP 200 with `ok: false`.
        let body: SlackResponse = response
            .json()
            .await
            .map_err(|e| SinkError::Transport(format!("Failed to parse Slack response: {e}")))?;
        if !body.ok {
            return Err(SinkError::Rejected(
                body.error.unwrap_or_else(|| "unknown_error".into()),
            ));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "slack"
    }
}

/// Writes alerts to the log instead of delivering them (dry-run mode).
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl AlertSink for LogSink {
    async fn send(&self, message: &str) -> Result<(), SinkError> {
        tracing::warn!(target: "sink", alert = %message, "governance vote alert");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
