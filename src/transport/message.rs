use serde::{Deserialize, Serialize};

use crate::monitor::message::OutboundMessage;

/// Frames sent by an adapter.
#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "monitor")]
    Monitor { user: String, callsign: String },
    #[serde(rename = "list")]
    List { user: String },
}

/// Frames sent to an adapter.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Reply to a command, meant only for `user`.
    #[serde(rename = "confirmation")]
    Confirmation { user: String, text: String },
    #[serde(rename = "broadcast")]
    Broadcast { text: String, timestamp: i64 },
    #[serde(rename = "mention")]
    Mention {
        user: String,
        text: String,
        timestamp: i64,
    },
    #[serde(rename = "error")]
    Error { message: String },
}

impl ServerMessage {
    /// Wrap a notification, stamped with the current time in milliseconds.
    pub fn notification(message: &OutboundMessage) -> Self {
        let timestamp = chrono::Utc::now().timestamp_millis();
        match message {
            OutboundMessage::Broadcast { text } => ServerMessage::Broadcast {
                text: text.clone(),
                timestamp,
            },
            OutboundMessage::Mention { user, text } => ServerMessage::Mention {
                user: user.clone(),
                text: text.clone(),
                timestamp,
            },
        }
    }
}
