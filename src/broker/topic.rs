//! Topic management
//!
//! A `TopicEntry` holds the subscriber endpoints of one topic name in a
//! fixed number of slots. The slot vector is sized once at creation and never
//! grows; a full entry rejects new subscribers instead of reallocating.
//!
//! Concurrency note: callers must synchronize access to `TopicEntry` (for
//! example via the broker lock) when modifying subscriptions.

use crate::broker::endpoint::Endpoint;
use crate::utils::error::BrokerError;

/// Name of the reserved topic whose subscribers receive every publish.
pub const WILDCARD_TOPIC: &str = "#";

/// Result of a subscribe that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    Subscribed,
    /// The endpoint was already registered; nothing changed.
    AlreadySubscribed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsubscribeOutcome {
    Removed,
    /// The endpoint was not registered for the topic; nothing changed.
    NotSubscribed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicEntry {
    name: String,
    subscribers: Vec<Option<Endpoint>>,
}

impl TopicEntry {
    /// Create a topic entry with `capacity` free subscriber slots.
    pub fn new(name: &str, capacity: usize) -> Self {
        Self {
            name: name.to_string(),
            subscribers: vec![None; capacity],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_wildcard(&self) -> bool {
        self.name == WILDCARD_TOPIC
    }

    /// Register `endpoint` in the first free slot.
    ///
    /// Subscribing twice is not an error and reports `AlreadySubscribed`.
    /// Returns `BrokerError::SubscriberCapacityExceeded` when every slot is taken.
    pub fn add_subscriber(&mut self, endpoint: Endpoint) -> Result<SubscribeOutcome, BrokerError> {
        if self.contains(&endpoint) {
            return Ok(SubscribeOutcome::AlreadySubscribed);
        }

        match self.subscribers.iter_mut().find(|slot| slot.is_none()) {
            Some(slot) => {
                *slot = Some(endpoint);
                Ok(SubscribeOutcome::Subscribed)
            }
            None => Err(BrokerError::SubscriberCapacityExceeded {
                topic: self.name.clone(),
                endpoint,
                max_subscribers: self.subscribers.len(),
            }),
        }
    }

    /// Free the slot holding `endpoint`, if any.
    pub fn remove_subscriber(&mut self, endpoint: &Endpoint) -> UnsubscribeOutcome {
        match self
            .subscribers
            .iter_mut()
            .find(|slot| **slot == Some(*endpoint))
        {
            Some(slot) => {
                *slot = None;
                UnsubscribeOutcome::Removed
            }
            None => UnsubscribeOutcome::NotSubscribed,
        }
    }

    pub fn contains(&self, endpoint: &Endpoint) -> bool {
        self.subscribers().any(|ep| ep == endpoint)
    }

    /// Iterate over the occupied subscriber slots.
    pub fn subscribers(&self) -> impl Iterator<Item = &Endpoint> {
        self.subscribers.iter().flatten()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers().count()
    }

    pub fn capacity(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.iter().all(Option::is_none)
    }
}
