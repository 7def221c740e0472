mod settings;

use crate::config::settings::PartialSettings;
use config::{Config, ConfigError, Environment, File};

pub use settings::{BrokerSettings, LoggingSettings, ServerSettings, Settings};

/// Prefix of the environment variables read by `load_config`,
/// e.g. `UDPSUB_SERVER__PORT=9000`.
pub const ENV_PREFIX: &str = "UDPSUB";

/// Loads the configuration from `config/default` and environment variables.
pub fn load_config() -> Result<Settings, ConfigError> {
    load_config_from("config/default")
}

/// Loads the configuration from the given file (any extension the `config`
/// crate understands, optional) and environment variables.
/// Merges the configuration with default values and validates the result.
pub fn load_config_from(path: &str) -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name(path).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    // Merge with defaults
    let default = Settings::default();
    let server = partial.server;
    let broker = partial.broker;
    let logging = partial.logging;

    let settings = Settings {
        server: ServerSettings {
            host: server
                .as_ref()
                .and_then(|s| s.host.clone())
                .unwrap_or(default.server.host),
            port: server
                .as_ref()
                .and_then(|s| s.port)
                .unwrap_or(default.server.port),
        },
        broker: BrokerSettings {
            max_topics: broker
                .as_ref()
                .and_then(|b| b.max_topics)
                .unwrap_or(default.broker.max_topics),
            max_subscribers_per_topic: broker
                .as_ref()
                .and_then(|b| b.max_subscribers_per_topic)
                .unwrap_or(default.broker.max_subscribers_per_topic),
            max_topic_length: broker
                .as_ref()
                .and_then(|b| b.max_topic_length)
                .unwrap_or(default.broker.max_topic_length),
            max_datagram_size: broker
                .as_ref()
                .and_then(|b| b.max_datagram_size)
                .unwrap_or(default.broker.max_datagram_size),
        },
        logging: LoggingSettings {
            level: logging
                .as_ref()
                .and_then(|l| l.level.clone())
                .unwrap_or(default.logging.level),
        },
    };

    settings.validate().map_err(ConfigError::Message)?;
    Ok(settings)
}
