//! Ordered subscriber registry shared by sensor sources and the engine

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Callback invoked synchronously with each delivered value
pub type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Handle returned by a registration, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Subscribers kept in registration order
pub struct SubscriberRegistry<T> {
    next_id: u64,
    entries: Vec<(SubscriptionId, Callback<T>)>,
}

impl<T> SubscriberRegistry<T> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    /// Register a callback; ids are never reused within a registry
    pub fn add(&mut self, callback: Callback<T>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, callback));
        id
    }

    /// Remove a callback, returning whether it was registered
    pub fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clone the callbacks out so delivery can happen without holding a lock
    pub fn snapshot(&self) -> Vec<Callback<T>> {
        self.entries.iter().map(|(_, callback)| Arc::clone(callback)).collect()
    }

    /// Invoke every callback in registration order
    pub fn notify(callbacks: &[Callback<T>], value: &T) {
        for callback in callbacks {
            callback(value);
        }
    }
}

impl<T> Default for SubscriberRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
