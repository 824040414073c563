//! Discord REST delivery using raw reqwest (no gateway session).
//!
//! Broadcasts and mentions are both posted to the configured channel; a
//! mention is a message that starts with the user's `<@id>` tag and only
//! allows that user to be pinged.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::Notifier;
use crate::monitor::message::OutboundMessage;
use crate::utils::error::DeliveryError;

pub const DISCORD_API_BASE: &str = "https://discord.com/api/v10";

pub struct DiscordNotifier {
    token: String,
    channel_id: u64,
    guild_id: Option<u64>,
    api_base: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ChannelInfo {
    #[serde(default)]
    guild_id: Option<String>,
}

impl DiscordNotifier {
    pub fn new(token: &str, channel_id: u64, guild_id: Option<u64>) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            token: token.to_string(),
            channel_id,
            guild_id,
            api_base: DISCORD_API_BASE.to_string(),
            client,
        })
    }

    /// Point the notifier at another API root.
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    pub(super) fn channel_url(&self) -> String {
        format!("{}/channels/{}", self.api_base, self.channel_id)
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.token)
    }

    /// Check that the channel is reachable with this token and, when a guild
    /// is configured, that it belongs to that guild.
    pub async fn verify(&self) -> Result<(), DeliveryError> {
        let response = self
            .client
            .get(self.channel_url())
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable>".to_string());
            return Err(DeliveryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let channel: ChannelInfo = response.json().await?;
        if let Some(expected) = self.guild_id {
            let matches = channel
                .guild_id
                .as_deref()
                .and_then(|g| g.parse::<u64>().ok())
                == Some(expected);
            if !matches {
                return Err(DeliveryError::WrongGuild {
                    channel_id: self.channel_id,
                    expected,
                    actual: channel.guild_id,
                });
            }
        }

        info!("discord channel {} verified", self.channel_id);
        Ok(())
    }

    pub(super) fn payload(message: &OutboundMessage) -> serde_json::Value {
        match message {
            OutboundMessage::Broadcast { text } => json!({
                "content": text,
                "allowed_mentions": { "parse": ["roles"] },
            }),
            OutboundMessage::Mention { user, text } => json!({
                "content": text,
                "allowed_mentions": { "users": [user] },
            }),
        }
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    fn name(&self) -> &str {
        "discord"
    }

    async fn deliver(&self, message: &OutboundMessage) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(format!("{}/messages", self.channel_url()))
            .header("Authorization", self.auth_header())
            .json(&Self::payload(message))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable>".to_string());
            return Err(DeliveryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
