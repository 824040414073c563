//! Delivery channel
//!
//! A `Notifier` hands one `OutboundMessage` to the outside world. Delivery is
//! best-effort: `deliver_all` keeps the dispatcher's order, logs each failure
//! and moves on to the next message without retrying.

pub mod discord;
pub mod fanout;
pub mod logger;

use async_trait::async_trait;
use tracing::warn;

use crate::monitor::message::OutboundMessage;
use crate::utils::error::DeliveryError;

pub use discord::DiscordNotifier;
pub use fanout::Fanout;
pub use logger::LogNotifier;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    async fn deliver(&self, message: &OutboundMessage) -> Result<(), DeliveryError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Deliver `messages` one after another, in order.
pub async fn deliver_all(notifier: &dyn Notifier, messages: &[OutboundMessage]) -> DeliveryReport {
    let mut report = DeliveryReport::default();

    for message in messages {
        match notifier.deliver(message).await {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                warn!("{} failed to deliver {:?}: {e}", notifier.name(), message.text());
                report.failed += 1;
            }
        }
    }

    report
}
