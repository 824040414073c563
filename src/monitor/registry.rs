//! Subscription registry
//!
//! Maps a platform user id to the callsigns that user wants a personal
//! mention for. Entries are created on first subscribe and emptied, never
//! removed, on clear.
//!
//! Concurrency note: the registry is shared between command handlers and the
//! poll loop as a `SharedRegistry`. Hold the lock only for in-memory work;
//! never across network I/O.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::callsign::Callsign;

pub type UserId = String;

/// Sentinel accepted by `subscribe` in place of a callsign.
pub const CLEAR_SENTINEL: &str = "CLEAR";

pub type SharedRegistry = Arc<Mutex<SubscriptionRegistry>>;

/// One user's personal watch list.
#[derive(Debug, Default)]
pub struct Subscription {
    pub user: UserId,
    pub callsigns: BTreeSet<Callsign>,
}

impl Subscription {
    pub fn new(user: &str) -> Self {
        Self {
            user: user.to_string(),
            callsigns: BTreeSet::new(),
        }
    }

    /// Duplicate adds are ignored.
    pub fn watch(&mut self, callsign: Callsign) {
        self.callsigns.insert(callsign);
    }

    pub fn clear(&mut self) {
        self.callsigns.clear();
    }

    pub fn contains(&self, callsign: &Callsign) -> bool {
        self.callsigns.contains(callsign)
    }
}

/// Result of a `subscribe` call, used to build the user's confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscribeOutcome {
    Subscribed(Callsign),
    Cleared,
}

#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    subscriptions: HashMap<UserId, Subscription>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedRegistry {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Add `identifier` to the user's list, or clear the list when the
    /// identifier is the `CLEAR` sentinel (any case).
    pub fn subscribe(&mut self, user: &str, identifier: &str) -> SubscribeOutcome {
        let callsign = Callsign::new(identifier);
        if callsign.as_str() == CLEAR_SENTINEL {
            self.clear(user);
            return SubscribeOutcome::Cleared;
        }

        self.subscriptions
            .entry(user.to_string())
            .or_insert_with(|| Subscription::new(user))
            .watch(callsign.clone());

        SubscribeOutcome::Subscribed(callsign)
    }

    /// Empty the user's list. Unknown users are a no-op.
    pub fn clear(&mut self, user: &str) {
        if let Some(subscription) = self.subscriptions.get_mut(user) {
            subscription.clear();
        }
    }

    /// Every user whose list contains `identifier`, in id order.
    pub fn subscribers_of(&self, identifier: &Callsign) -> BTreeSet<UserId> {
        self.subscriptions
            .values()
            .filter(|s| s.contains(identifier))
            .map(|s| s.user.clone())
            .collect()
    }

    /// The user's current list; empty for unknown users.
    pub fn subscriptions_of(&self, user: &str) -> BTreeSet<Callsign> {
        self.subscriptions
            .get(user)
            .map(|s| s.callsigns.clone())
            .unwrap_or_default()
    }

    pub fn contains_user(&self, user: &str) -> bool {
        self.subscriptions.contains_key(user)
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

/// Lock the shared registry, recovering the data if a holder panicked.
///
/// Registry operations cannot leave it half-updated, so a poisoned lock is
/// still safe to read.
pub fn lock(registry: &SharedRegistry) -> MutexGuard<'_, SubscriptionRegistry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}
