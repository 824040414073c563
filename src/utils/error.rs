//! Error types for `atc-watch`.
//!
//! Each external boundary gets its own enum so callers can tell a failed
//! poll apart from a failed delivery. None of these are fatal to the poll
//! loop; only `AppError` is allowed to end the process, and only at startup.

use thiserror::Error;

/// Failure to obtain a snapshot from the data feed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("feed request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed returned status {status}")]
    Status { status: u16 },

    #[error("feed payload could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failure to hand one outbound message to the delivery channel.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("delivery request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("delivery endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("delivery channel closed")]
    Closed,

    #[error("no listeners connected")]
    NoListeners,

    #[error("channel {channel_id} belongs to guild {actual:?}, expected {expected}")]
    WrongGuild {
        channel_id: u64,
        expected: u64,
        actual: Option<String>,
    },

    #[error("all {total} sinks failed")]
    AllSinksFailed { total: usize },
}

/// Startup errors surfaced from `main`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}
