use tokio::sync::mpsc::UnboundedSender;
use tungstenite::protocol::Message as WsMessage;

pub type ClientId = String;

/// A connected gateway client.
#[derive(Debug)]
pub struct Client {
    /// Unique per connection, e.g. `client-<uuid>`.
    pub id: ClientId,

    /// Frames queued here are written to the client's socket.
    pub sender: UnboundedSender<WsMessage>,
}

impl Client {
    pub fn new(sender: UnboundedSender<WsMessage>) -> Self {
        Self {
            id: format!("client-{}", uuid::Uuid::new_v4()),
            sender,
        }
    }
}
