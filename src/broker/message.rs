//! Message definitions for the broker
//!
//! `Message` is a validated PUBLISH request on its way through the routing
//! engine.
//!
//! Notes on fields:
//! - `topic`: exact topic name used for routing; never the wildcard
//! - `payload`: forwarded to every recipient byte-for-byte
//! - `timestamp`: milliseconds since UNIX epoch; set when the datagram is
//!   decoded and only used to correlate log lines

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub topic: String,
    pub payload: String,
    pub timestamp: i64,
}

impl Message {
    /// Create a message stamped with the current time.
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}
