use super::directory::{Directory, WILDCARD_SLOT};
use super::endpoint::Endpoint;
use super::message::Message;
use super::router::{DatagramSink, DeliveryReport, fan_out};
use super::topic::{SubscribeOutcome, TopicEntry, UnsubscribeOutcome, WILDCARD_TOPIC};
use super::{Broker, Dispatch};
use crate::config::BrokerSettings;
use crate::transport::message::Request;
use crate::utils::error::BrokerError;
use std::collections::HashSet;
use std::io;
use std::net::Ipv6Addr;
use std::sync::Mutex;

fn endpoint(port: u16) -> Endpoint {
    Endpoint::from(([127, 0, 0, 1], port))
}

fn publish(topic: &str, payload: &str) -> Message {
    Message::new(topic, payload)
}

/// Records every datagram instead of sending it. Endpoints in `failing`
/// return an I/O error.
#[derive(Default)]
struct RecordingSink {
    sent: Mutex<Vec<(Endpoint, Vec<u8>)>>,
    failing: HashSet<Endpoint>,
}

impl RecordingSink {
    fn received_by(&self, endpoint: Endpoint) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(ep, _)| *ep == endpoint)
            .map(|(_, bytes)| String::from_utf8(bytes.clone()).unwrap())
            .collect()
    }
}

impl DatagramSink for RecordingSink {
    async fn deliver_to(&self, payload: &[u8], endpoint: Endpoint) -> io::Result<usize> {
        if self.failing.contains(&endpoint) {
            return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"));
        }
        self.sent.lock().unwrap().push((endpoint, payload.to_vec()));
        Ok(payload.len())
    }
}

/// Accepts only the first byte of every datagram.
struct TruncatingSink;

impl DatagramSink for TruncatingSink {
    async fn deliver_to(&self, payload: &[u8], _endpoint: Endpoint) -> io::Result<usize> {
        Ok(payload.len().min(1))
    }
}

#[test]
fn test_endpoint_equality_needs_ip_and_port() {
    assert_eq!(endpoint(4000), endpoint(4000));
    assert_ne!(endpoint(4000), endpoint(4001));
    assert_ne!(endpoint(4000), Endpoint::from(([127, 0, 0, 2], 4000)));

    let v6 = Endpoint::from((Ipv6Addr::LOCALHOST, 4000));
    assert_eq!(v6.to_string(), "[::1]:4000");
    assert_eq!(endpoint(4000).to_string(), "127.0.0.1:4000");
}

#[test]
fn test_topic_entry_add_and_remove() {
    let mut topic = TopicEntry::new("weather", 2);
    assert_eq!(topic.name(), "weather");
    assert!(topic.is_empty());

    assert_eq!(
        topic.add_subscriber(endpoint(1)),
        Ok(SubscribeOutcome::Subscribed)
    );
    assert_eq!(
        topic.add_subscriber(endpoint(1)),
        Ok(SubscribeOutcome::AlreadySubscribed)
    );
    assert_eq!(topic.subscriber_count(), 1);

    assert_eq!(
        topic.remove_subscriber(&endpoint(1)),
        UnsubscribeOutcome::Removed
    );
    assert_eq!(
        topic.remove_subscriber(&endpoint(1)),
        UnsubscribeOutcome::NotSubscribed
    );
    assert!(topic.is_empty());
}

#[test]
fn test_topic_entry_reuses_freed_slot() {
    let mut topic = TopicEntry::new("weather", 2);
    topic.add_subscriber(endpoint(1)).unwrap();
    topic.add_subscriber(endpoint(2)).unwrap();
    topic.remove_subscriber(&endpoint(1));

    assert_eq!(
        topic.add_subscriber(endpoint(3)),
        Ok(SubscribeOutcome::Subscribed)
    );
    assert_eq!(topic.subscriber_count(), 2);
    assert_eq!(topic.capacity(), 2);
}

#[test]
fn test_directory_starts_with_wildcard_only() {
    let directory = Directory::new(10, 10);
    assert_eq!(directory.capacity(), 10);
    assert_eq!(directory.topic_count(), 1);
    assert_eq!(directory.wildcard().name(), WILDCARD_TOPIC);
    assert!(directory.find(WILDCARD_TOPIC).unwrap().is_wildcard());
    assert_eq!(WILDCARD_SLOT, 0);
}

#[test]
fn test_directory_zero_capacity_keeps_wildcard() {
    let directory = Directory::new(0, 1);
    assert_eq!(directory.capacity(), 1);
    assert_eq!(directory.wildcard().name(), WILDCARD_TOPIC);
}

#[test]
fn test_directory_lookup_compares_full_names() {
    let mut directory = Directory::new(10, 10);
    directory.find_or_create("weather_today").unwrap();
    directory.find_or_create("weather_tomorrow").unwrap();

    assert_eq!(directory.topic_count(), 3);
    assert!(directory.find("weather").is_none());
    assert!(directory.find("weather_").is_none());
    assert_eq!(
        directory.find("weather_tomorrow").unwrap().name(),
        "weather_tomorrow"
    );
}

#[test]
fn test_find_or_create_returns_existing_entry() {
    let mut directory = Directory::new(3, 10);
    directory
        .find_or_create("weather")
        .unwrap()
        .add_subscriber(endpoint(1))
        .unwrap();

    let entry = directory.find_or_create("weather").unwrap();
    assert!(entry.contains(&endpoint(1)));
    assert_eq!(directory.topic_count(), 2);
}

#[test]
fn test_release_never_frees_wildcard_or_busy_topics() {
    let mut directory = Directory::new(3, 10);
    assert!(!directory.release(WILDCARD_TOPIC));

    directory
        .find_or_create("weather")
        .unwrap()
        .add_subscriber(endpoint(1))
        .unwrap();
    assert!(!directory.release("weather"));

    directory.find_or_create("news").unwrap();
    assert!(directory.release("news"));
    assert!(directory.find("news").is_none());
    assert!(!directory.release("absent"));
}

#[test]
fn test_broker_subscribe_is_idempotent() {
    let mut broker = Broker::default();

    assert_eq!(
        broker.subscribe("weather", endpoint(1)),
        Ok(SubscribeOutcome::Subscribed)
    );
    assert_eq!(
        broker.subscribe("weather", endpoint(1)),
        Ok(SubscribeOutcome::AlreadySubscribed)
    );
    assert_eq!(
        broker
            .directory()
            .find("weather")
            .unwrap()
            .subscriber_count(),
        1
    );
}

#[test]
fn test_broker_subscriber_capacity_exceeded() {
    let settings = BrokerSettings {
        max_subscribers_per_topic: 3,
        ..BrokerSettings::default()
    };
    let mut broker = Broker::new(&settings);
    for port in 1..=3 {
        broker.subscribe("weather", endpoint(port)).unwrap();
    }

    assert_eq!(
        broker.subscribe("weather", endpoint(4)),
        Err(BrokerError::SubscriberCapacityExceeded {
            topic: "weather".to_string(),
            endpoint: endpoint(4),
            max_subscribers: 3,
        })
    );
    let entry = broker.directory().find("weather").unwrap();
    assert_eq!(entry.subscriber_count(), 3);
    assert!(!entry.contains(&endpoint(4)));

    // an existing subscriber re-subscribing to a full topic is still fine
    assert_eq!(
        broker.subscribe("weather", endpoint(2)),
        Ok(SubscribeOutcome::AlreadySubscribed)
    );
}

#[test]
fn test_broker_unsubscribe_unknown_is_noop() {
    let mut broker = Broker::default();
    broker.subscribe("weather", endpoint(2)).unwrap();
    let before = broker.directory().clone();

    assert_eq!(
        broker.unsubscribe("weather", &endpoint(1)),
        UnsubscribeOutcome::NotSubscribed
    );
    assert_eq!(
        broker.unsubscribe("absent", &endpoint(1)),
        UnsubscribeOutcome::NotSubscribed
    );

    let after = broker.directory();
    assert_eq!(after.topic_count(), before.topic_count());
    assert!(after.find("weather").unwrap().contains(&endpoint(2)));
}

#[test]
fn test_wildcard_topic_is_never_reclaimed() {
    let mut broker = Broker::default();
    broker.subscribe(WILDCARD_TOPIC, endpoint(1)).unwrap();
    assert_eq!(
        broker.unsubscribe(WILDCARD_TOPIC, &endpoint(1)),
        UnsubscribeOutcome::Removed
    );

    let wildcard = broker.directory().find(WILDCARD_TOPIC).unwrap();
    assert!(wildcard.is_empty());
    assert_eq!(broker.directory().topic_count(), 1);
}

#[test]
fn test_route_wildcard_only_when_topic_unknown() {
    let mut broker = Broker::default();
    broker.subscribe(WILDCARD_TOPIC, endpoint(9)).unwrap();

    assert_eq!(broker.route(&publish("nobody", "x")), vec![endpoint(9)]);
    assert!(broker.directory().find("nobody").is_none());
}

#[test]
fn test_route_with_no_subscribers_is_empty() {
    let broker = Broker::default();
    assert!(broker.route(&publish("weather", "sunny")).is_empty());
}

#[test]
fn test_route_duplicates_wildcard_and_exact_subscriber() {
    let mut broker = Broker::default();
    broker.subscribe(WILDCARD_TOPIC, endpoint(1)).unwrap();
    broker.subscribe("weather", endpoint(1)).unwrap();
    broker.subscribe("weather", endpoint(2)).unwrap();

    let recipients = broker.route(&publish("weather", "sunny"));
    assert_eq!(recipients.len(), 3);
    assert_eq!(recipients[0], endpoint(1));
    assert_eq!(recipients.iter().filter(|ep| **ep == endpoint(1)).count(), 2);
}

#[test]
fn test_handle_publish_without_recipients_dispatches_nothing() {
    let mut broker = Broker::default();
    let dispatch = broker.handle(Request::Publish(publish("weather", "sunny")), endpoint(7));
    assert_eq!(dispatch, Dispatch::Nothing);
}

#[test]
fn test_handle_subscribe_capacity_failure_is_absorbed() {
    let settings = BrokerSettings {
        max_topics: 2,
        ..BrokerSettings::default()
    };
    let mut broker = Broker::new(&settings);
    broker.subscribe("weather", endpoint(1)).unwrap();

    let dispatch = broker.handle(
        Request::Subscribe {
            topic: "news".to_string(),
        },
        endpoint(1),
    );
    assert_eq!(dispatch, Dispatch::Nothing);
    assert!(broker.directory().find("news").is_none());
}

// Scenario 1
#[tokio::test]
async fn test_publish_reaches_every_topic_subscriber_once() {
    let mut broker = Broker::default();
    let (a, b) = (endpoint(1), endpoint(2));
    broker.subscribe("weather", a).unwrap();
    broker.subscribe("weather", b).unwrap();

    let sink = RecordingSink::default();
    let recipients = broker.route(&publish("weather", "sunny"));
    let report = fan_out(&sink, "sunny", &recipients).await;

    assert_eq!(
        report,
        DeliveryReport {
            delivered: 2,
            failed: 0
        }
    );
    assert_eq!(sink.received_by(a), vec!["sunny"]);
    assert_eq!(sink.received_by(b), vec!["sunny"]);
}

// Scenario 2
#[tokio::test]
async fn test_wildcard_subscriber_receives_every_topic() {
    let mut broker = Broker::default();
    let c = endpoint(3);
    broker.subscribe(WILDCARD_TOPIC, c).unwrap();

    let sink = RecordingSink::default();
    for (topic, payload) in [("weather", "sunny"), ("news", "breaking")] {
        let recipients = broker.route(&publish(topic, payload));
        fan_out(&sink, payload, &recipients).await;
    }

    assert_eq!(sink.received_by(c), vec!["sunny", "breaking"]);
}

// Scenario 3
#[test]
fn test_unsubscribe_never_subscribed_leaves_directory_unchanged() {
    let mut broker = Broker::default();
    broker.subscribe("weather", endpoint(2)).unwrap();

    assert_eq!(
        broker.unsubscribe("weather", &endpoint(1)),
        UnsubscribeOutcome::NotSubscribed
    );
    assert_eq!(broker.directory().topic_count(), 2);
    assert_eq!(
        broker
            .directory()
            .find("weather")
            .unwrap()
            .subscriber_count(),
        1
    );
}

// Scenario 4
#[test]
fn test_topic_capacity_exceeded_keeps_existing_topics() {
    let mut broker = Broker::default();
    let topics: Vec<String> = (1..=9).map(|i| format!("topic{i}")).collect();
    for topic in &topics {
        assert_eq!(
            broker.subscribe(topic, endpoint(1)),
            Ok(SubscribeOutcome::Subscribed)
        );
    }

    assert_eq!(
        broker.subscribe("topic10", endpoint(1)),
        Err(BrokerError::TopicCapacityExceeded {
            topic: "topic10".to_string(),
            max_topics: 10,
        })
    );
    assert_eq!(broker.directory().topic_count(), 10);
    assert!(broker.directory().find("topic10").is_none());
    for topic in &topics {
        assert!(broker.directory().find(topic).unwrap().contains(&endpoint(1)));
    }

    // existing topics still accept subscribers
    assert_eq!(
        broker.subscribe("topic1", endpoint(2)),
        Ok(SubscribeOutcome::Subscribed)
    );
}

// Scenario 5
#[test]
fn test_reclaimed_topic_slot_is_reusable() {
    let settings = BrokerSettings {
        max_topics: 2,
        ..BrokerSettings::default()
    };
    let mut broker = Broker::new(&settings);
    let (a, b) = (endpoint(1), endpoint(2));

    broker.subscribe("weather", a).unwrap();
    assert!(broker.subscribe("alerts", b).is_err());

    assert_eq!(
        broker.unsubscribe("weather", &a),
        UnsubscribeOutcome::Removed
    );
    assert!(broker.directory().find("weather").is_none());

    assert_eq!(
        broker.subscribe("alerts", b),
        Ok(SubscribeOutcome::Subscribed)
    );
    assert!(broker.directory().find("alerts").unwrap().contains(&b));
}

#[tokio::test]
async fn test_publish_reaches_no_other_endpoint() {
    let mut broker = Broker::default();
    broker.subscribe("weather", endpoint(1)).unwrap();
    broker.subscribe("news", endpoint(2)).unwrap();
    broker.subscribe(WILDCARD_TOPIC, endpoint(3)).unwrap();

    let sink = RecordingSink::default();
    let recipients = broker.route(&publish("weather", "sunny"));
    fan_out(&sink, "sunny", &recipients).await;

    assert_eq!(sink.received_by(endpoint(1)), vec!["sunny"]);
    assert!(sink.received_by(endpoint(2)).is_empty());
    assert_eq!(sink.received_by(endpoint(3)), vec!["sunny"]);
}

#[tokio::test]
async fn test_fan_out_isolates_failed_recipients() {
    let sink = RecordingSink {
        failing: HashSet::from([endpoint(2)]),
        ..RecordingSink::default()
    };
    let recipients = [endpoint(1), endpoint(2), endpoint(3)];

    let report = fan_out(&sink, "payload", &recipients).await;

    assert_eq!(
        report,
        DeliveryReport {
            delivered: 2,
            failed: 1
        }
    );
    assert_eq!(sink.received_by(endpoint(1)), vec!["payload"]);
    assert_eq!(sink.received_by(endpoint(3)), vec!["payload"]);
}

#[tokio::test]
async fn test_fan_out_counts_short_sends_as_failures() {
    let report = fan_out(&TruncatingSink, "sunny", &[endpoint(1)]).await;
    assert_eq!(
        report,
        DeliveryReport {
            delivered: 0,
            failed: 1
        }
    );
}

#[tokio::test]
async fn test_fan_out_to_nobody() {
    let sink = RecordingSink::default();
    let report = fan_out(&sink, "sunny", &[]).await;
    assert_eq!(report, DeliveryReport::default());
    assert!(sink.sent.lock().unwrap().is_empty());
}

#[test]
fn test_broker_failed_subscribe_releases_new_topic() {
    let settings = BrokerSettings {
        max_topics: 2,
        max_subscribers_per_topic: 0,
        ..BrokerSettings::default()
    };
    let mut broker = Broker::new(&settings);

    assert_eq!(
        broker.subscribe("weather", endpoint(1)),
        Err(BrokerError::SubscriberCapacityExceeded {
            topic: "weather".to_string(),
            endpoint: endpoint(1),
            max_subscribers: 0,
        })
    );
    assert!(broker.directory().find("weather").is_none());
    assert_eq!(broker.directory().topic_count(), 1);

    // the slot is free again for the next topic
    assert!(matches!(
        broker.subscribe("news", endpoint(1)),
        Err(BrokerError::SubscriberCapacityExceeded { .. })
    ));
    assert_eq!(broker.directory().topic_count(), 1);
}
