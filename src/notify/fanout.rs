use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::Notifier;
use crate::monitor::message::OutboundMessage;
use crate::utils::error::DeliveryError;

/// Delivers every message to each sink in turn.
///
/// Succeeds when at least one sink accepted the message. With no sinks every
/// message is accepted and dropped.
pub struct Fanout {
    sinks: Vec<Arc<dyn Notifier>>,
}

impl Fanout {
    pub fn new(sinks: Vec<Arc<dyn Notifier>>) -> Self {
        Self { sinks }
    }

}

#[async_trait]
impl Notifier for Fanout {
    fn name(&self) -> &str {
        "fanout"
    }

    async fn deliver(&self, message: &OutboundMessage) -> Result<(), DeliveryError> {
        let mut failed = 0;

        for sink in &self.sinks {
            match sink.deliver(message).await {
                Ok(()) => {}
                Err(DeliveryError::NoListeners) => {
                    debug!("{}: no listeners", sink.name());
                    failed += 1;
                }
                Err(e) => {
                    warn!("{} failed: {e}", sink.name());
                    failed += 1;
                }
            }
        }

        if !self.sinks.is_empty() && failed == self.sinks.len() {
            return Err(DeliveryError::AllSinksFailed { total: failed });
        }
        Ok(())
    }
}
