//! The broker: topic directory, subscriber registries and routing.
//!
//! Public types:
//! - `Broker`: applies subscribe/unsubscribe/publish requests to its directory.
//! - `Directory` / `TopicEntry`: the bounded topic and subscriber slots.
//! - `router::fan_out`: delivers a payload to a recipient snapshot.

pub mod directory;
pub mod endpoint;
pub mod engine;
pub mod message;
pub mod router;
pub mod topic;

pub use engine::{Broker, Dispatch};

#[cfg(test)]
mod tests;
