//! CLI for udpsub
//!
//! Subcommands:
//! - `broker`: run the relay
//! - `publish`: send one message and exit
//! - `publish-periodic`: publish the current Unix timestamp forever
//! - `subscribe`: print every message received for a topic

use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use udpsub::broker::Broker;
use udpsub::client::Client;
use udpsub::config::load_config;
use udpsub::transport::start_udp_server;

/// Size of the buffer a subscriber receives forwarded payloads into.
const RECV_BUFFER_SIZE: usize = 512;

#[derive(Parser)]
#[command(name = "udpsub")]
enum Command {
    /// Start the broker
    Broker,
    /// Publish a single message to a topic
    Publish {
        /// Host name or IP address of the broker
        broker: String,
        topic: String,
        message: String,
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Publish the current Unix timestamp to a topic at a fixed interval
    PublishPeriodic {
        /// Host name or IP address of the broker
        broker: String,
        topic: String,
        #[arg(long, default_value_t = 5)]
        interval_secs: u64,
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Subscribe to a topic (or `#` for every topic) and print what arrives
    Subscribe {
        /// Host name or IP address of the broker
        broker: String,
        topic: String,
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cmd = Command::parse();

    match cmd {
        Command::Broker => run_broker().await,
        Command::Publish {
            broker,
            topic,
            message,
            port,
        } => {
            udpsub::utils::logging::init("info");
            let client = Client::connect(&broker, port).await?;
            info!("Publishing message to {} on topic {topic}", client.broker_addr());
            client.publish(&topic, &message).await?;
            Ok(())
        }
        Command::PublishPeriodic {
            broker,
            topic,
            interval_secs,
            port,
        } => {
            udpsub::utils::logging::init("info");
            run_publish_periodic(&broker, port, &topic, interval_secs).await
        }
        Command::Subscribe {
            broker,
            topic,
            port,
        } => {
            udpsub::utils::logging::init("info");
            run_subscribe(&broker, port, &topic).await
        }
    }
}

async fn run_broker() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    udpsub::utils::logging::init(&config.logging.level);

    let broker = Arc::new(Mutex::new(Broker::new(&config.broker)));

    tokio::select! {
        result = start_udp_server(&config, broker) => {
            if let Err(e) = result {
                error!("Broker failed to start: {e}");
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
        }
    }

    Ok(())
}

async fn run_publish_periodic(
    host: &str,
    port: u16,
    topic: &str,
    interval_secs: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = Client::connect(host, port).await?;
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let timestamp = chrono::Utc::now().timestamp().to_string();
                client.publish(topic, &timestamp).await?;
                info!("Published {timestamp} to topic {topic}");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received. Exiting gracefully.");
                return Ok(());
            }
        }
    }
}

/// Subscribe and print payloads until Ctrl-C, then unsubscribe so the
/// broker can reclaim the slot.
async fn run_subscribe(
    host: &str,
    port: u16,
    topic: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = Client::connect(host, port).await?;
    client.subscribe(topic).await?;
    info!("Subscribed to topic {topic} at {}", client.broker_addr());

    let mut buf = vec![0u8; RECV_BUFFER_SIZE];
    loop {
        tokio::select! {
            received = client.recv(&mut buf) => {
                let payload = received?;
                println!("Received message:\n{payload}");
            }
            _ = tokio::signal::ctrl_c() => {
                client.unsubscribe(topic).await?;
                info!("Unsubscribed from topic {topic}");
                return Ok(());
            }
        }
    }
}
