//! Command gateway
//!
//! A small WebSocket server through which a chat-platform adapter submits
//! user commands and receives the notifications to post:
//! - `message`: the JSON frames exchanged with adapters
//! - `hub`: connected adapters, and the `Notifier` that fans out to them
//! - `websocket`: the accept loop and per-connection handling

pub mod hub;
pub mod message;
pub mod websocket;

pub use hub::GatewayHub;
pub use websocket::{handle_client_message, start_gateway};
