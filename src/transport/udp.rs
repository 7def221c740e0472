//! UDP transport
//!
//! A single socket receives every request. Responsibilities:
//! - Receive one datagram at a time and decode it into a `Request`
//! - Apply it to the shared `Broker` while holding the lock
//! - Release the lock, then fan published payloads out to their recipients
//!
//! Requesters never get a reply. Everything that goes wrong with a single
//! datagram is logged and the loop carries on.

use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

use crate::broker::endpoint::Endpoint;
use crate::broker::router::fan_out;
use crate::broker::{Broker, Dispatch};
use crate::config::{BrokerSettings, Settings};
use crate::transport::message::Request;
use crate::transport::validation::TopicRules;

/// Bind the configured address and serve requests forever.
///
/// Only a failed bind is returned as an error.
pub async fn start_udp_server(settings: &Settings, broker: Arc<Mutex<Broker>>) -> io::Result<()> {
    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let socket = UdpSocket::bind(&addr).await?;

    info!("Broker listening on udp://{}", socket.local_addr()?);

    serve(socket, broker, &settings.broker).await;
    Ok(())
}

/// The receive loop. Never returns.
pub async fn serve(socket: UdpSocket, broker: Arc<Mutex<Broker>>, settings: &BrokerSettings) {
    let rules = TopicRules::from(settings);
    let mut buf = vec![0u8; settings.max_datagram_size];

    loop {
        let (len, from) = match socket.recv_from(&mut buf).await {
            Ok(received) => received,
            Err(e) => {
                warn!("Failed to receive message: {e}");
                continue;
            }
        };

        let dispatch = handle_datagram(&buf[..len], Endpoint::from(from), &broker, &rules);

        if let Dispatch::Deliver {
            payload,
            recipients,
        } = dispatch
        {
            let report = fan_out(&socket, &payload, &recipients).await;
            debug!(
                "Forwarded message to {} subscribers ({} failed)",
                report.delivered, report.failed
            );
        }
    }
}

/// Decode one datagram and apply it to the broker.
///
/// The broker lock is held only for the directory step.
pub fn handle_datagram(
    datagram: &[u8],
    from: Endpoint,
    broker: &Mutex<Broker>,
    rules: &TopicRules,
) -> Dispatch {
    debug!(
        "Received message from {from}: {}",
        String::from_utf8_lossy(datagram)
    );

    let request = match Request::parse(datagram, rules) {
        Ok(request) => request,
        Err(e) => {
            warn!("Dropping request from {from}: {e}");
            return Dispatch::Nothing;
        }
    };

    // every directory mutation is a single slot write, so a poisoned lock still guards a consistent directory
    let mut broker = broker.lock().unwrap_or_else(PoisonError::into_inner);
    broker.handle(request, from)
}
