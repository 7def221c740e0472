//! Fan-out of published payloads.
//!
//! Delivery is at-most-once: every recipient gets exactly one send attempt,
//! nothing is queued or retried, and one failed send does not affect the
//! others.

use std::future::Future;
use std::io;
use std::net::SocketAddr;

use futures::future::join_all;
use tokio::net::UdpSocket;
use tracing::warn;

use crate::broker::endpoint::Endpoint;

/// Something that can push a datagram to an endpoint.
pub trait DatagramSink {
    /// Send `payload` to `endpoint`, returning the number of bytes sent.
    fn deliver_to(
        &self,
        payload: &[u8],
        endpoint: Endpoint,
    ) -> impl Future<Output = io::Result<usize>> + Send;
}

impl DatagramSink for UdpSocket {
    async fn deliver_to(&self, payload: &[u8], endpoint: Endpoint) -> io::Result<usize> {
        self.send_to(payload, SocketAddr::from(endpoint)).await
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Send `payload` unmodified to every recipient.
///
/// A short write counts as a failed delivery.
pub async fn fan_out<S: DatagramSink>(
    sink: &S,
    payload: &str,
    recipients: &[Endpoint],
) -> DeliveryReport {
    let bytes = payload.as_bytes();
    let sends = recipients.iter().map(move |&endpoint| async move {
        let result = sink.deliver_to(bytes, endpoint).await;
        (endpoint, result)
    });

    let mut report = DeliveryReport::default();
    for (endpoint, result) in join_all(sends).await {
        match result {
            Ok(sent) if sent == bytes.len() => report.delivered += 1,
            Ok(sent) => {
                warn!("Short send to {endpoint}: {sent} of {} bytes", bytes.len());
                report.failed += 1;
            }
            Err(e) => {
                warn!("Failed to send to {endpoint}: {e}");
                report.failed += 1;
            }
        }
    }
    report
}
