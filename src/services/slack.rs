use anyhow::Context;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::cli::config::SlackSettings;

#[derive(Debug, Error)]
pub enum SlackError {
    /// Slack answered with `ok: false`
    #[error("Slack error: {0}")]
    Api(String),

    #[error("Slack request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// A channel the bot can see
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct ChannelList {
    ok: bool,
    #[serde(default)]
    channels: Vec<Channel>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PostedMessage {
    ok: bool,
    ts: Option<String>,
    error: Option<String>,
}

/// Slack Web API client authenticated with a bot token
#[derive(Clone)]
pub struct SlackClient {
    client: Client,
    api_url: String,
    bot_token: String,
}

impl SlackClient {
    /// Build a client, or `None` when no bot token is configured
    pub fn from_settings(settings: &SlackSettings) -> anyhow::Result<Option<Self>> {
        let Some(bot_token) = settings.bot_token.clone() else {
            return Ok(None);
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Some(Self {
            client,
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            bot_token,
        }))
    }

    /// List public and private channels
    pub async fn list_channels(&self) -> Result<Vec<Channel>, SlackError> {
        let endpoint = format!("{}/conversations.list", self.api_url);
        let list: ChannelList = self.client.get(&endpoint)
            .bearer_auth(&self.bot_token)
            .query(&[("types", "public_channel,private_channel")])
            .send()
            .await?
            .json()
            .await?;

        if !list.ok {
            return Err(SlackError::Api(list.error.unwrap_or_else(|| "unknown_error".to_string())));
        }

        Ok(list.channels)
    }

    /// Post `text` to `channel`, returning the message timestamp
    pub async fn post_message(&self, channel: &str, text: &str) -> Result<Option<String>, SlackError> {
        let endpoint = format!("{}/chat.postMessage", self.api_url);
        let posted: PostedMessage = self.client.post(&endpoint)
            .bearer_auth(&self.bot_token)
            .json(&json!({ "channel": channel, "text": text }))
            .send()
            .await?
            .json()
            .await?;

        if !posted.ok {
            return Err(SlackError::Api(posted.error.unwrap_or_else(|| "unknown_error".to_string())));
        }

        debug!("Posted message to channel {}", channel);
        Ok(posted.ts)
    }
}
