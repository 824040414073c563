//! Connected gateway clients.
//!
//! The hub owns the sender half of every connection. As a `Notifier` it
//! pushes each outbound message to all of them; a client whose channel has
//! closed is skipped and left for its connection task to remove.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::warn;
use tungstenite::protocol::Message as WsMessage;

use super::message::ServerMessage;
use crate::client::{Client, ClientId};
use crate::monitor::message::OutboundMessage;
use crate::notify::Notifier;
use crate::utils::error::DeliveryError;

#[derive(Debug, Default)]
pub struct GatewayHub {
    clients: Mutex<HashMap<ClientId, Client>>,
}

impl GatewayHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn clients(&self) -> MutexGuard<'_, HashMap<ClientId, Client>> {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register_client(&self, client: Client) {
        self.clients().insert(client.id.clone(), client);
    }

    pub fn remove_client(&self, client_id: &ClientId) {
        self.clients().remove(client_id);
    }

    pub fn len(&self) -> usize {
        self.clients().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients().is_empty()
    }
}

#[async_trait]
impl Notifier for GatewayHub {
    fn name(&self) -> &str {
        "gateway"
    }

    async fn deliver(&self, message: &OutboundMessage) -> Result<(), DeliveryError> {
        let frame = ServerMessage::notification(message);
        let text = match serde_json::to_string(&frame) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize notification: {e}");
                return Err(DeliveryError::Closed);
            }
        };

        let clients = self.clients();
        if clients.is_empty() {
            return Err(DeliveryError::NoListeners);
        }

        let mut sent = 0;
        for (client_id, client) in clients.iter() {
            if let Err(e) = client.sender.send(WsMessage::text(text.clone())) {
                warn!("Failed to send to {client_id}: {e}");
            } else {
                sent += 1;
            }
        }

        if sent == 0 {
            return Err(DeliveryError::Closed);
        }
        Ok(())
    }
}
