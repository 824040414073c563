use async_trait::async_trait;
use tracing::info;

use super::Notifier;
use crate::monitor::message::OutboundMessage;
use crate::utils::error::DeliveryError;

/// Writes notifications to the log. Used when no chat target is configured.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn deliver(&self, message: &OutboundMessage) -> Result<(), DeliveryError> {
        match message {
            OutboundMessage::Broadcast { text } => info!("[broadcast] {text}"),
            OutboundMessage::Mention { user, text } => info!("[mention {user}] {text}"),
        }
        Ok(())
    }
}
