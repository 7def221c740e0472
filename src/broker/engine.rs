//! Broker engine
//!
//! This module contains the in-memory broker responsible for:
//! - registering and removing subscribers in the topic directory
//! - deciding, for each published message, which endpoints receive a copy
//!
//! Concurrency and usage notes:
//! - The API here is synchronous and designed to be held behind a lock
//!   (`Arc<Mutex<Broker>>`) by the transport layer. `handle` only computes
//!   the recipient snapshot; the actual sends happen in
//!   [`router::fan_out`](crate::broker::router::fan_out) after the lock has
//!   been released, so slow sends never block new registrations.
//! - There is no per-client state. A subscription is nothing more than a
//!   (topic, endpoint) pair in the directory.

use tracing::{debug, info, warn};

use crate::broker::directory::Directory;
use crate::broker::endpoint::Endpoint;
use crate::broker::message::Message;
use crate::broker::topic::{SubscribeOutcome, UnsubscribeOutcome};
use crate::config::BrokerSettings;
use crate::transport::message::Request;
use crate::utils::error::BrokerError;

/// What the transport has to do after a request has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Nothing to send. Requests are never answered.
    Nothing,
    /// Send `payload` to every endpoint in `recipients`, duplicates included.
    Deliver {
        payload: String,
        recipients: Vec<Endpoint>,
    },
}

#[derive(Debug)]
pub struct Broker {
    directory: Directory,
}

impl Default for Broker {
    fn default() -> Self {
        Self::new(&BrokerSettings::default())
    }
}

impl Broker {
    pub fn new(settings: &BrokerSettings) -> Self {
        Self {
            directory: Directory::new(settings.max_topics, settings.max_subscribers_per_topic),
        }
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    /// Subscribes an endpoint to a topic. Automatically creates the topic if it doesn't exist.
    ///
    /// On failure the directory is unchanged: a topic claimed by this call is
    /// released again if the subscriber could not be added to it.
    pub fn subscribe(
        &mut self,
        topic: &str,
        endpoint: Endpoint,
    ) -> Result<SubscribeOutcome, BrokerError> {
        let existed = self.directory.find(topic).is_some();
        let result = self
            .directory
            .find_or_create(topic)?
            .add_subscriber(endpoint);

        if result.is_err() && !existed {
            self.directory.release(topic);
        }
        result
    }

    /// Unsubscribes an endpoint from a topic. The topic's slot is reclaimed
    /// once it has no subscribers left, unless it is the wildcard topic.
    pub fn unsubscribe(&mut self, topic: &str, endpoint: &Endpoint) -> UnsubscribeOutcome {
        self.directory.remove_subscriber(topic, endpoint)
    }

    /// Collect every endpoint that must receive `msg`: all wildcard
    /// subscribers first, then the subscribers of the exact topic.
    ///
    /// An endpoint subscribed to both appears twice and receives two copies.
    pub fn route(&self, msg: &Message) -> Vec<Endpoint> {
        let mut recipients: Vec<Endpoint> =
            self.directory.wildcard().subscribers().copied().collect();

        match self
            .directory
            .find(&msg.topic)
            .filter(|entry| !entry.is_wildcard())
        {
            Some(entry) => recipients.extend(entry.subscribers().copied()),
            None => info!(
                "Topic {} has no subscribers, message will be discarded",
                msg.topic
            ),
        }

        recipients
    }

    /// Apply one decoded request sent by `from`.
    ///
    /// Capacity failures and no-op outcomes are logged here and never
    /// returned: the requester gets no answer either way.
    pub fn handle(&mut self, request: Request, from: Endpoint) -> Dispatch {
        match request {
            Request::Subscribe { topic } => {
                match self.subscribe(&topic, from) {
                    Ok(SubscribeOutcome::Subscribed) => {
                        info!("Subscriber {from} registered for topic {topic}")
                    }
                    Ok(SubscribeOutcome::AlreadySubscribed) => {
                        info!("Subscriber {from} is already subscribed to topic {topic}")
                    }
                    Err(e) => warn!("Subscribe from {from} rejected: {e}"),
                }
                Dispatch::Nothing
            }

            Request::Unsubscribe { topic } => {
                match self.unsubscribe(&topic, &from) {
                    UnsubscribeOutcome::Removed => {
                        info!("Subscriber {from} unsubscribed from topic {topic}")
                    }
                    UnsubscribeOutcome::NotSubscribed => {
                        info!("Subscriber {from} is not subscribed to topic {topic}")
                    }
                }
                Dispatch::Nothing
            }

            Request::Publish(msg) => {
                let recipients = self.route(&msg);
                debug!(
                    "{from} published to {} at {} ({} recipients)",
                    msg.topic,
                    msg.timestamp,
                    recipients.len()
                );
                if recipients.is_empty() {
                    Dispatch::Nothing
                } else {
                    Dispatch::Deliver {
                        payload: msg.payload,
                        recipients,
                    }
                }
            }
        }
    }
}
