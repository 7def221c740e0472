//! The `client` module defines the client side of the protocol.
//!
//! It provides the `Client` struct used by the publisher and subscriber
//! programs of the `udpsub` binary.

pub mod pubsub_client;
pub use pubsub_client::Client;
