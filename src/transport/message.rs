//! Wire format of broker requests.
//!
//! Requests are ASCII text, one per datagram:
//!
//! ```text
//! PUB!<topic>!<payload>
//! SUB!<topic>
//! UNSUB!<topic>
//! ```
//!
//! Only the first two delimiters are significant. Anything after the second
//! one is the payload, which is why payloads may not contain `!` themselves.

use std::fmt;

use crate::broker::message::Message;
use crate::transport::validation::{TopicRules, validate_payload, validate_topic};
use crate::utils::error::RequestError;

/// Separates the method tag, topic and payload of a request.
pub const DELIMITER: char = '!';

/// Character reserved for the wildcard topic.
pub const WILDCARD: char = '#';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Publish,
    Subscribe,
    Unsubscribe,
}

impl Method {
    pub fn tag(self) -> &'static str {
        match self {
            Method::Publish => "PUB",
            Method::Subscribe => "SUB",
            Method::Unsubscribe => "UNSUB",
        }
    }

    fn from_tag(tag: &str) -> Result<Self, RequestError> {
        match tag {
            "PUB" => Ok(Method::Publish),
            "SUB" => Ok(Method::Subscribe),
            "UNSUB" => Ok(Method::Unsubscribe),
            _ => Err(RequestError::UnknownMethod),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Publish(Message),
    Subscribe { topic: String },
    Unsubscribe { topic: String },
}

impl Request {
    /// Decode and validate one datagram.
    pub fn parse(datagram: &[u8], rules: &TopicRules) -> Result<Self, RequestError> {
        let request = Self::decode(datagram)?;
        request.validate(rules)?;
        Ok(request)
    }

    /// Split a datagram into its fields without applying naming rules.
    pub fn decode(datagram: &[u8]) -> Result<Self, RequestError> {
        let text = std::str::from_utf8(datagram).map_err(|_| RequestError::InvalidEncoding)?;
        let (tag, rest) = text
            .split_once(DELIMITER)
            .ok_or(RequestError::UnknownMethod)?;

        match Method::from_tag(tag)? {
            Method::Publish => {
                let (topic, payload) = rest
                    .split_once(DELIMITER)
                    .ok_or(RequestError::MissingField("payload"))?;
                Ok(Request::Publish(Message::new(topic, payload)))
            }
            Method::Subscribe => Ok(Request::Subscribe {
                topic: rest.to_string(),
            }),
            Method::Unsubscribe => Ok(Request::Unsubscribe {
                topic: rest.to_string(),
            }),
        }
    }

    /// Check the topic (and payload) against the naming rules. Publishing
    /// to the wildcard topic is rejected; subscribing to it is not.
    pub fn validate(&self, rules: &TopicRules) -> Result<(), RequestError> {
        match self {
            Request::Publish(msg) => {
                validate_topic(&msg.topic, rules, false)?;
                validate_payload(&msg.payload)
            }
            Request::Subscribe { topic } | Request::Unsubscribe { topic } => {
                validate_topic(topic, rules, true)
            }
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Request::Publish(_) => Method::Publish,
            Request::Subscribe { .. } => Method::Subscribe,
            Request::Unsubscribe { .. } => Method::Unsubscribe,
        }
    }

    pub fn topic(&self) -> &str {
        match self {
            Request::Publish(msg) => &msg.topic,
            Request::Subscribe { topic } | Request::Unsubscribe { topic } => topic,
        }
    }

    /// Render the request in wire form.
    pub fn encode(&self) -> String {
        match self {
            Request::Publish(msg) => format!(
                "{}{DELIMITER}{}{DELIMITER}{}",
                self.method(),
                msg.topic,
                msg.payload
            ),
            _ => format!("{}{DELIMITER}{}", self.method(), self.topic()),
        }
    }
}
