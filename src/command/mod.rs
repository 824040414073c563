//! User commands
//!
//! `CommandHandler` is the inbound side of the chat platform: it maps the
//! `monitor` command onto the subscription registry and renders the private
//! confirmation shown to the invoking user.

use std::collections::HashSet;

use tracing::info;

use crate::monitor::callsign::Callsign;
use crate::monitor::registry::{self, SharedRegistry, SubscribeOutcome};

#[derive(Clone)]
pub struct CommandHandler {
    registry: SharedRegistry,
    watched: HashSet<Callsign>,
}

impl CommandHandler {
    pub fn new<S: AsRef<str>>(registry: SharedRegistry, watched: &[S]) -> Self {
        Self {
            registry,
            watched: watched.iter().map(|s| Callsign::new(s.as_ref())).collect(),
        }
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// `monitor <callsign|clear>`.
    pub fn monitor(&self, user: &str, callsign_or_clear: &str) -> String {
        if callsign_or_clear.trim().is_empty() {
            return "Usage: /monitor <callsign> (or `clear` to stop all alerts)".to_string();
        }

        let outcome = registry::lock(&self.registry).subscribe(user, callsign_or_clear);

        match outcome {
            SubscribeOutcome::Cleared => {
                info!("{user} cleared their monitored positions");
                "Cleared all your monitored positions.".to_string()
            }
            SubscribeOutcome::Subscribed(callsign) => {
                info!("{user} is monitoring {callsign}");
                if self.watched.contains(&callsign) {
                    format!("You will be pinged when {callsign} logs on or off.")
                } else {
                    format!(
                        "You will be pinged when {callsign} logs on or off. Note: {callsign} is not on the watched list, so no alerts will fire for it yet."
                    )
                }
            }
        }
    }

    /// `list`: the user's current monitored positions.
    pub fn list(&self, user: &str) -> String {
        let callsigns = registry::lock(&self.registry).subscriptions_of(user);
        if callsigns.is_empty() {
            return "You are not monitoring any positions.".to_string();
        }

        let names: Vec<&str> = callsigns.iter().map(|c| c.as_str()).collect();
        format!("You are monitoring: {}", names.join(", "))
    }
}
