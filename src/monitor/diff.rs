//! State differ.

use std::collections::BTreeSet;

use super::callsign::{ActiveSet, Callsign};

/// Positions that came online and went offline between two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delta {
    pub logged_on: BTreeSet<Callsign>,
    pub logged_off: BTreeSet<Callsign>,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        self.logged_on.is_empty() && self.logged_off.is_empty()
    }
}

/// `logged_on = current - previous`, `logged_off = previous - current`.
pub fn diff(previous: &ActiveSet, current: &ActiveSet) -> Delta {
    Delta {
        logged_on: current.difference(previous).cloned().collect(),
        logged_off: previous.difference(current).cloned().collect(),
    }
}
