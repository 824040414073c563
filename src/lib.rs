//! # atc-watch
//!
//! `atc-watch` polls the VATSIM live data feed, notices when watched
//! air-traffic-control positions log on or off, and announces it to a chat
//! channel, with a personal mention for every user who asked to monitor that
//! position.
//!
//! ## Core Modules
//!
//! - `feed`: fetches the live snapshot and filters it to the watched callsigns.
//! - `monitor`: diffing, the subscription registry, message dispatch and the poll loop.
//! - `notify`: delivery of outbound messages (Discord, log, fan-out).
//! - `command`: the `monitor` user command.
//! - `transport`: the WebSocket gateway platform adapters connect to.
//! - `client`: a connected gateway client.
//! - `config`: loading settings from file and environment.
//! - `utils`: error types and logging setup.

pub mod client;
pub mod command;
pub mod config;
pub mod feed;
pub mod monitor;
pub mod notify;
pub mod transport;
pub mod utils;

#[cfg(test)]
mod test_support;
