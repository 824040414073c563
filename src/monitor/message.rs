//! Outbound notifications.
//!
//! `OutboundMessage` is what the dispatcher produces and what every
//! `Notifier` consumes:
//! - `Broadcast`: posted channel-wide, independent of subscriptions
//! - `Mention`: addressed to one user who subscribed to the callsign

use serde::{Deserialize, Serialize};

use super::registry::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutboundMessage {
    Broadcast { text: String },
    Mention { user: UserId, text: String },
}

impl OutboundMessage {
    pub fn text(&self) -> &str {
        match self {
            OutboundMessage::Broadcast { text } | OutboundMessage::Mention { text, .. } => text,
        }
    }

    /// Target user for mentions, `None` for broadcasts.
    pub fn user(&self) -> Option<&str> {
        match self {
            OutboundMessage::Broadcast { .. } => None,
            OutboundMessage::Mention { user, .. } => Some(user),
        }
    }
}
