use serde::Deserialize;

/// Top-level configuration settings for the application.
///
/// Includes settings for the UDP server, the broker directory and logging.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server: ServerSettings,
    pub broker: BrokerSettings,
    pub logging: LoggingSettings,
}

/// Configuration settings for the server.
///
/// Defines the host and port the UDP socket will bind to.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Configuration settings for the broker.
///
/// `max_topics` counts the reserved wildcard slot. `max_topic_length`
/// includes one position for the terminator, so topics must be strictly
/// shorter than it.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct BrokerSettings {
    pub max_topics: usize,
    pub max_subscribers_per_topic: usize,
    pub max_topic_length: usize,
    pub max_datagram_size: usize,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Allows partial specification of settings. Missing values can be filled using defaults.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub broker: Option<PartialBrokerSettings>,
    pub logging: Option<PartialLoggingSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct PartialBrokerSettings {
    pub max_topics: Option<usize>,
    pub max_subscribers_per_topic: Option<usize>,
    pub max_topic_length: Option<usize>,
    pub max_datagram_size: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct PartialLoggingSettings {
    pub level: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            max_topics: 10,
            max_subscribers_per_topic: 10,
            max_topic_length: 20,
            max_datagram_size: 512,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Provides default values for `Settings`.
impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            broker: BrokerSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Settings {
    /// Reject limits the broker cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        let broker = &self.broker;
        if broker.max_topics == 0 {
            return Err("broker.max_topics must leave room for the wildcard topic".to_string());
        }
        if broker.max_subscribers_per_topic == 0 {
            return Err("broker.max_subscribers_per_topic must be at least 1".to_string());
        }
        if broker.max_topic_length < 2 {
            return Err("broker.max_topic_length must be at least 2".to_string());
        }
        if broker.max_datagram_size == 0 {
            return Err("broker.max_datagram_size must be at least 1".to_string());
        }
        Ok(())
    }
}
