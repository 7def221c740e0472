//! Topic directory
//!
//! A fixed number of topic slots, each either free or holding a
//! [`TopicEntry`]. Slot 0 always holds the wildcard topic `#`; it is created
//! with the directory and never reclaimed. Every other slot is claimed by the
//! first subscribe to a new topic name and freed again as soon as its last
//! subscriber leaves.
//!
//! Lookups are linear scans with full-string comparison. Capacity is small
//! and fixed, so running out of slots is a normal, reported outcome.

use tracing::warn;

use crate::broker::endpoint::Endpoint;
use crate::broker::topic::{TopicEntry, UnsubscribeOutcome, WILDCARD_TOPIC};
use crate::utils::error::BrokerError;

/// Index of the slot reserved for the wildcard topic.
pub const WILDCARD_SLOT: usize = 0;

#[derive(Debug, Clone)]
pub struct Directory {
    slots: Vec<Option<TopicEntry>>,
    subscribers_per_topic: usize,
}

impl Directory {
    /// Create a directory with `max_topics` slots (including the wildcard
    /// slot) and `subscribers_per_topic` subscriber slots per topic.
    ///
    /// A `max_topics` of zero is raised to one: the wildcard slot always exists.
    pub fn new(max_topics: usize, subscribers_per_topic: usize) -> Self {
        let mut slots = vec![None; max_topics.max(1)];
        slots[WILDCARD_SLOT] = Some(TopicEntry::new(WILDCARD_TOPIC, subscribers_per_topic));
        Self {
            slots,
            subscribers_per_topic,
        }
    }

    fn position(&self, topic: &str) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|entry| entry.name() == topic))
    }

    pub fn find(&self, topic: &str) -> Option<&TopicEntry> {
        self.position(topic).and_then(|idx| self.slots[idx].as_ref())
    }

    /// Return the entry for `topic`, claiming the first free slot for it if
    /// the topic is not registered yet.
    pub fn find_or_create(&mut self, topic: &str) -> Result<&mut TopicEntry, BrokerError> {
        let idx = match self.position(topic) {
            Some(idx) => idx,
            None => match self.slots.iter().position(Option::is_none) {
                Some(idx) => idx,
                None => {
                    warn!("No more free slots to register new topic {topic}");
                    return Err(BrokerError::TopicCapacityExceeded {
                        topic: topic.to_string(),
                        max_topics: self.slots.len(),
                    });
                }
            },
        };

        let capacity = self.subscribers_per_topic;
        Ok(self.slots[idx].get_or_insert_with(|| TopicEntry::new(topic, capacity)))
    }

    /// Remove `endpoint` from `topic` and reclaim the topic's slot if that
    /// left it without subscribers.
    pub fn remove_subscriber(&mut self, topic: &str, endpoint: &Endpoint) -> UnsubscribeOutcome {
        let Some(idx) = self.position(topic) else {
            return UnsubscribeOutcome::NotSubscribed;
        };

        let outcome = match self.slots[idx].as_mut() {
            Some(entry) => entry.remove_subscriber(endpoint),
            None => UnsubscribeOutcome::NotSubscribed,
        };
        self.reclaim(idx);
        outcome
    }

    /// Free the slot of `topic` if it has no subscribers. Returns whether a
    /// slot was freed; the wildcard topic is never freed.
    pub fn release(&mut self, topic: &str) -> bool {
        self.position(topic).is_some_and(|idx| self.reclaim(idx))
    }

    fn reclaim(&mut self, idx: usize) -> bool {
        if idx == WILDCARD_SLOT {
            return false;
        }
        let unused = self.slots[idx].as_ref().is_some_and(TopicEntry::is_empty);
        if unused {
            self.slots[idx] = None;
        }
        unused
    }

    /// The wildcard entry.
    pub fn wildcard(&self) -> &TopicEntry {
        // slot 0 is populated in `new` and `reclaim` skips it
        match &self.slots[WILDCARD_SLOT] {
            Some(entry) => entry,
            None => unreachable!("wildcard slot is never freed"),
        }
    }

    /// Iterate over occupied topic slots, wildcard first.
    pub fn topics(&self) -> impl Iterator<Item = &TopicEntry> {
        self.slots.iter().flatten()
    }

    /// Number of occupied topic slots, including the wildcard slot.
    pub fn topic_count(&self) -> usize {
        self.topics().count()
    }

    /// Total number of topic slots, including the wildcard slot.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}
