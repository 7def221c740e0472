//! Topic and payload naming rules.
//!
//! Applied to every request before it touches the directory, and by the
//! client programs before anything is sent.

use crate::broker::topic::WILDCARD_TOPIC;
use crate::config::BrokerSettings;
use crate::transport::message::{DELIMITER, WILDCARD};
use crate::utils::error::RequestError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicRules {
    /// Topics must be strictly shorter than this many bytes.
    pub max_topic_length: usize,
}

impl Default for TopicRules {
    fn default() -> Self {
        BrokerSettings::default().into()
    }
}

impl From<BrokerSettings> for TopicRules {
    fn from(settings: BrokerSettings) -> Self {
        Self::from(&settings)
    }
}

impl From<&BrokerSettings> for TopicRules {
    fn from(settings: &BrokerSettings) -> Self {
        Self {
            max_topic_length: settings.max_topic_length,
        }
    }
}

/// Check a topic name.
///
/// With `allow_wildcard` the topic may be exactly `#`; a wildcard character
/// anywhere else is always rejected.
pub fn validate_topic(
    topic: &str,
    rules: &TopicRules,
    allow_wildcard: bool,
) -> Result<(), RequestError> {
    if topic.is_empty() {
        return Err(RequestError::EmptyTopic);
    }
    if topic.len() >= rules.max_topic_length {
        return Err(RequestError::TopicTooLong {
            length: topic.len(),
            max: rules.max_topic_length,
        });
    }
    if topic.contains(DELIMITER) {
        return Err(RequestError::DelimiterInTopic(DELIMITER));
    }
    if topic.contains(WILDCARD) && !(allow_wildcard && topic == WILDCARD_TOPIC) {
        return Err(RequestError::WildcardInTopic(WILDCARD));
    }
    Ok(())
}

pub fn validate_payload(payload: &str) -> Result<(), RequestError> {
    if payload.contains(DELIMITER) {
        return Err(RequestError::DelimiterInPayload(DELIMITER));
    }
    Ok(())
}
