//! The `client` module represents a platform adapter connected to the
//! command gateway: its id and the channel used to push frames to it.

pub mod connection;
pub use connection::{Client, ClientId};
