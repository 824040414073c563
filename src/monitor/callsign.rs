//! Watched identifiers.
//!
//! A `Callsign` is always trimmed and uppercased, so `ml_twr`, ` ML_TWR ` and
//! `ML_TWR` are the same position. Ordering is lexicographic, which gives
//! every set of callsigns a stable iteration order.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Callsign(String);

/// Callsigns currently reported live by the feed.
///
/// Built fresh on every poll and never edited in place.
pub type ActiveSet = BTreeSet<Callsign>;

impl Callsign {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Callsign {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<&str> for Callsign {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<Callsign> for String {
    fn from(callsign: Callsign) -> Self {
        callsign.0
    }
}

impl fmt::Display for Callsign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build an `ActiveSet` from raw strings, normalizing each one.
pub fn active_set<I, S>(raw: I) -> ActiveSet
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter().map(|s| Callsign::new(s.as_ref())).collect()
}
