//! Client representation
//!
//! `Client` is the thin side of the protocol used by the `publish`,
//! `publish-periodic` and `subscribe` programs: it resolves the broker once,
//! validates requests locally with the same rules the broker applies, and
//! sends them from an ephemeral UDP socket. The broker forwards payloads to
//! the (IP, port) a SUBSCRIBE came from, so a subscriber must keep using the
//! same `Client` to receive them.

use std::net::SocketAddr;

use tokio::net::{UdpSocket, lookup_host};
use tracing::debug;

use crate::broker::message::Message;
use crate::transport::message::Request;
use crate::transport::validation::TopicRules;
use crate::utils::error::ClientError;

#[derive(Debug)]
pub struct Client {
    socket: UdpSocket,
    broker: SocketAddr,
    rules: TopicRules,
}

impl Client {
    /// Resolve `host` and bind an ephemeral socket of the matching address
    /// family. IPv4 addresses are preferred when the host has both.
    pub async fn connect(host: &str, port: u16) -> Result<Self, ClientError> {
        let addrs: Vec<SocketAddr> = lookup_host((host, port)).await?.collect();
        let broker = addrs
            .iter()
            .find(|addr| addr.is_ipv4())
            .or_else(|| addrs.first())
            .copied()
            .ok_or_else(|| ClientError::Unresolvable {
                host: host.to_string(),
            })?;

        let local = if broker.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };
        let socket = UdpSocket::bind(local).await?;
        Ok(Self::with_socket(socket, broker))
    }

    /// Use an already bound socket to talk to `broker`.
    pub fn with_socket(socket: UdpSocket, broker: SocketAddr) -> Self {
        Self {
            socket,
            broker,
            rules: TopicRules::default(),
        }
    }

    pub fn broker_addr(&self) -> SocketAddr {
        self.broker
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ClientError> {
        Ok(self.socket.local_addr()?)
    }

    /// Validate and send one request. Nothing comes back from the broker.
    pub async fn send(&self, request: &Request) -> Result<(), ClientError> {
        request.validate(&self.rules)?;

        let wire = request.encode();
        debug!("Sending {wire} to {}", self.broker);
        let sent = self.socket.send_to(wire.as_bytes(), self.broker).await?;
        if sent != wire.len() {
            return Err(ClientError::ShortWrite {
                sent,
                expected: wire.len(),
            });
        }
        Ok(())
    }

    pub async fn publish(&self, topic: &str, payload: &str) -> Result<(), ClientError> {
        self.send(&Request::Publish(Message::new(topic, payload)))
            .await
    }

    pub async fn subscribe(&self, topic: &str) -> Result<(), ClientError> {
        self.send(&Request::Subscribe {
            topic: topic.to_string(),
        })
        .await
    }

    pub async fn unsubscribe(&self, topic: &str) -> Result<(), ClientError> {
        self.send(&Request::Unsubscribe {
            topic: topic.to_string(),
        })
        .await
    }

    /// Wait for the next forwarded payload.
    pub async fn recv(&self, buf: &mut [u8]) -> Result<String, ClientError> {
        let (len, _) = self.socket.recv_from(buf).await?;
        Ok(String::from_utf8_lossy(&buf[..len]).into_owned())
    }
}
