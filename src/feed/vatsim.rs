//! VATSIM data feed client.
//!
//! Fetches `vatsim-data.json` with a bounded timeout and keeps only the
//! controller callsigns on the watched list. Any failure (transport, status,
//! shape) is returned as a `FetchError`; nothing here panics.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::SnapshotSource;
use crate::monitor::callsign::{ActiveSet, Callsign};
use crate::utils::error::FetchError;

#[derive(Debug, Deserialize)]
struct FeedPayload {
    controllers: Vec<ControllerRecord>,
}

#[derive(Debug, Deserialize)]
struct ControllerRecord {
    callsign: String,
}

pub struct VatsimFeed {
    url: String,
    watched: HashSet<Callsign>,
    /// Reused across polls for connection pooling.
    client: reqwest::Client,
}

impl VatsimFeed {
    pub fn new<S: AsRef<str>>(
        url: &str,
        watched: &[S],
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.to_string(),
            watched: watched.iter().map(|s| Callsign::new(s.as_ref())).collect(),
            client,
        })
    }
}

/// Parse a feed payload and keep the watched callsigns.
///
/// The payload must be an object with a `controllers` array whose records
/// each carry a string `callsign`; anything else is a parse failure.
pub fn parse_snapshot(body: &[u8], watched: &HashSet<Callsign>) -> Result<ActiveSet, FetchError> {
    let payload: FeedPayload = serde_json::from_slice(body)?;
    Ok(payload
        .controllers
        .into_iter()
        .map(|record| Callsign::new(&record.callsign))
        .filter(|callsign| watched.contains(callsign))
        .collect())
}

#[async_trait]
impl SnapshotSource for VatsimFeed {
    fn name(&self) -> &str {
        "vatsim"
    }

    async fn fetch(&self) -> Result<ActiveSet, FetchError> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let active = parse_snapshot(&body, &self.watched)?;
        debug!("{} reported {} watched position(s) online", self.name(), active.len());
        Ok(active)
    }
}
