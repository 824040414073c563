//! Snapshot fetcher
//!
//! A `SnapshotSource` produces the set of watched callsigns that are live
//! right now. The production source is `VatsimFeed`; tests substitute their
//! own implementations.

pub mod vatsim;

use async_trait::async_trait;

use crate::monitor::callsign::ActiveSet;
use crate::utils::error::FetchError;

pub use vatsim::{VatsimFeed, parse_snapshot};

#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Fetch the current snapshot, filtered to the watched callsigns.
    async fn fetch(&self) -> Result<ActiveSet, FetchError>;
}
