//! The `error` module defines the error types used within the `udpsub` application.
//!
//! Each layer owns one enum:
//! - [`RequestError`]: a datagram could not be decoded or failed validation.
//! - [`BrokerError`]: the directory had no room for a registration.
//! - [`ClientError`]: a client program could not reach or talk to the broker.
//!
//! None of these ever terminate the broker: the receive loop logs them and
//! moves on to the next datagram.

use thiserror::Error;

use crate::broker::endpoint::Endpoint;

/// Reasons a datagram is dropped before it reaches the directory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("datagram is not valid UTF-8 text")]
    InvalidEncoding,

    #[error("unknown request method")]
    UnknownMethod,

    #[error("request is missing its {0} field")]
    MissingField(&'static str),

    #[error("topic must not be empty")]
    EmptyTopic,

    #[error("topic is {length} bytes long, must be shorter than {max}")]
    TopicTooLong { length: usize, max: usize },

    #[error("topic is not allowed to contain message delimiter character {0}")]
    DelimiterInTopic(char),

    #[error("topic is not allowed to contain wildcard character {0}")]
    WildcardInTopic(char),

    #[error("message is not allowed to contain message delimiter character {0}")]
    DelimiterInPayload(char),
}

/// Capacity failures of the topic directory.
///
/// The directory is left untouched whenever one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrokerError {
    #[error("no more free slots to register new topic {topic} (max {max_topics})")]
    TopicCapacityExceeded { topic: String, max_topics: usize },

    #[error(
        "no more free slots to register subscriber {endpoint} for topic {topic} (max {max_subscribers})"
    )]
    SubscriberCapacityExceeded {
        topic: String,
        endpoint: Endpoint,
        max_subscribers: usize,
    },
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(#[from] RequestError),

    #[error("could not resolve broker host {host}")]
    Unresolvable { host: String },

    #[error("sent {sent} of {expected} bytes to the broker")]
    ShortWrite { sent: usize, expected: usize },
}
