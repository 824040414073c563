//! Monitor core
//!
//! - `callsign`: watched identifiers and active sets
//! - `diff`: logged-on / logged-off deltas between two snapshots
//! - `registry`: per-user subscriptions
//! - `dispatch`: delta + registry to ordered outbound messages
//! - `poll`: the periodic fetch/diff/dispatch loop

pub mod callsign;
pub mod diff;
pub mod dispatch;
pub mod message;
pub mod poll;
pub mod registry;

pub use callsign::{ActiveSet, Callsign};
pub use diff::{Delta, diff};
pub use dispatch::{MessageFormat, dispatch};
pub use message::OutboundMessage;
pub use poll::{CycleOutcome, PollHandle, PollLoop, PollState};
pub use registry::{SharedRegistry, SubscribeOutcome, SubscriptionRegistry, UserId};

#[cfg(test)]
mod tests;
