//! Notifier dispatcher
//!
//! Turns a `Delta` into the ordered list of messages to deliver. For each
//! callsign the broadcast comes first, followed by one mention per
//! subscriber. Logged-on callsigns are handled before logged-off ones.

use std::collections::BTreeSet;

use super::callsign::Callsign;
use super::diff::Delta;
use super::message::OutboundMessage;
use super::registry::SubscriptionRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    On,
    Off,
}

/// Rendering of broadcast and mention texts.
#[derive(Debug, Clone, Default)]
pub struct MessageFormat {
    /// Role pinged at the end of every broadcast.
    pub role_id: Option<u64>,
}

impl MessageFormat {
    pub fn new(role_id: Option<u64>) -> Self {
        Self { role_id }
    }

    pub fn broadcast(&self, callsign: &Callsign, transition: Transition) -> String {
        let base = match transition {
            Transition::On => format!(":green_circle: {callsign} has just logged **ON**!"),
            Transition::Off => format!(":red_circle: {callsign} has just logged **OFF**!"),
        };
        match self.role_id {
            Some(role) => format!("{base} <@&{role}>"),
            None => base,
        }
    }

    pub fn mention(&self, user: &str, callsign: &Callsign, transition: Transition) -> String {
        let state = match transition {
            Transition::On => "ONLINE",
            Transition::Off => "OFFLINE",
        };
        format!("<@{user}> {callsign} is now {state}")
    }
}

/// Build the messages for one delta. An empty delta produces nothing.
pub fn dispatch(
    delta: &Delta,
    registry: &SubscriptionRegistry,
    format: &MessageFormat,
) -> Vec<OutboundMessage> {
    let mut out = Vec::new();
    push_transitions(&mut out, &delta.logged_on, Transition::On, registry, format);
    push_transitions(&mut out, &delta.logged_off, Transition::Off, registry, format);
    out
}

fn push_transitions(
    out: &mut Vec<OutboundMessage>,
    callsigns: &BTreeSet<Callsign>,
    transition: Transition,
    registry: &SubscriptionRegistry,
    format: &MessageFormat,
) {
    for callsign in callsigns {
        out.push(OutboundMessage::Broadcast {
            text: format.broadcast(callsign, transition),
        });
        for user in registry.subscribers_of(callsign) {
            let text = format.mention(&user, callsign, transition);
            out.push(OutboundMessage::Mention { user, text });
        }
    }
}
