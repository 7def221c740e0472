//! # udpsub
//!
//! `udpsub` is a minimalist, in-memory publish/subscribe relay built with Rust.
//! Clients talk to it with single UDP datagrams (`PUB!topic!payload`,
//! `SUB!topic`, `UNSUB!topic`); the broker forwards every published payload to
//! the subscribers of its topic and to every subscriber of the wildcard
//! topic `#`. There is no persistence, no acknowledgement and no retry.
//!
//! ## Core Modules
//!
//! - `broker`: the bounded topic directory, subscriber registries and routing.
//! - `client`: the client side of the protocol, used by the CLI programs.
//! - `config`: loading and merging server configuration.
//! - `transport`: the wire format, naming rules and the UDP receive loop.
//! - `utils`: error types and logging set-up.

pub mod broker;
pub mod client;
pub mod config;
pub mod transport;
pub mod utils;
