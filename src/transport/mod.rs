//! The `transport` module is responsible for network communication with
//! clients over UDP.
//!
//! It defines the text protocol used between clients and the broker, the
//! naming rules every request must satisfy, and the receive loop that feeds
//! decoded requests to the broker.

pub mod message;
pub mod udp;
pub mod validation;

pub use message::{Method, Request};
pub use udp::{serve, start_udp_server};
