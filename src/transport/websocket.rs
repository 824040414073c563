//! WebSocket gateway
//!
//! Accepts adapter connections, registers each one with the `GatewayHub`,
//! and answers command frames through the `CommandHandler`. Responsibilities:
//! - Accept TCP/WebSocket connections
//! - Forward queued frames from the hub to the socket
//! - Parse command frames and reply with a confirmation or an error
//! - Remove the client from the hub when either direction closes

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::spawn;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tracing::{debug, info, warn};
use tungstenite::protocol::Message as WsMessage;

use super::hub::GatewayHub;
use super::message::{ClientMessage, ServerMessage};
use crate::client::Client;
use crate::command::CommandHandler;

/// Turn one text frame into the reply for the sending client.
pub fn handle_client_message(commands: &CommandHandler, text: &str) -> ServerMessage {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Monitor { user, callsign }) => {
            let text = commands.monitor(&user, &callsign);
            ServerMessage::Confirmation { user, text }
        }
        Ok(ClientMessage::List { user }) => {
            let text = commands.list(&user);
            ServerMessage::Confirmation { user, text }
        }
        Err(err) => ServerMessage::Error {
            message: format!("invalid command: {err}"),
        },
    }
}

fn encode(frame: &ServerMessage) -> Option<WsMessage> {
    match serde_json::to_string(frame) {
        Ok(json) => Some(WsMessage::text(json)),
        Err(e) => {
            warn!("Failed to serialize reply: {e}");
            None
        }
    }
}

/// Bind `addr` and serve gateway connections. Only a bind failure returns.
pub async fn start_gateway(
    addr: String,
    commands: CommandHandler,
    hub: Arc<GatewayHub>,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(&addr).await?;

    info!("Command gateway listening on ws://{addr}");

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("Failed to accept gateway connection: {e}");
                tokio::time::sleep(Duration::from_millis(100)).await;
                continue;
            }
        };
        let commands = commands.clone();
        let hub = hub.clone();

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    warn!("WebSocket handshake error from {peer}: {e}");
                    return;
                }
            };
            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();
            let client = Client::new(tx.clone());
            let client_id = client.id.clone();
            hub.register_client(client);
            info!("{client_id} connected from {peer}");

            let cleanup_called = Arc::new(AtomicBool::new(false));

            let do_cleanup = {
                let hub = hub.clone();
                let client_id = client_id.clone();
                let cleanup_called = cleanup_called.clone();

                move || {
                    if !cleanup_called.swap(true, Ordering::SeqCst) {
                        hub.remove_client(&client_id);
                        info!("{client_id} disconnected");
                    }
                }
            };

            {
                let client_id = client_id.clone();
                let do_cleanup = do_cleanup.clone();

                spawn(async move {
                    while let Some(msg) = rx.recv().await {
                        if let Err(e) = ws_sender.send(msg).await {
                            warn!("Failed to send message to {client_id}: {e}");
                            break;
                        }
                    }

                    do_cleanup();
                    debug!("Send loop closed for {client_id}");
                });
            }

            while let Some(Ok(msg)) = ws_receiver.next().await {
                if msg.is_close() {
                    break;
                }
                if !msg.is_text() {
                    continue;
                }
                let Ok(text) = msg.to_text() else {
                    continue;
                };

                let reply = handle_client_message(&commands, text);
                if let ServerMessage::Error { message } = &reply {
                    warn!("Invalid client message from {client_id}: {message}");
                }
                if let Some(frame) = encode(&reply) {
                    if tx.send(frame).is_err() {
                        break;
                    }
                }
            }

            do_cleanup();
        });
    }
}
