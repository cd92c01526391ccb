// Events runtime configuration

use crate::ConfigError;
use serde::{Deserialize, Serialize};

const ENV_PREFIX: &str = "DUCTILE_EVENTS";

/// Events runtime configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Cache handler matches per contract for the container's lifetime
    pub cache_matches: bool,

    /// Emit a debug record for every broadcast
    pub log_broadcasts: bool,

    /// Warn when a broadcast reaches no handler
    pub warn_on_empty: bool,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            cache_matches: true,
            log_broadcasts: true,
            warn_on_empty: false,
        }
    }
}

impl EventsConfig {
    pub fn builder() -> EventsConfigBuilder {
        EventsConfigBuilder::new()
    }

    /// Defaults overridden by `DUCTILE_EVENTS_*` variables.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Same as [`EventsConfig::from_env`] over an explicit variable set
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut config = Self::default();

        for (key, value) in vars {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let name = name.trim_start_matches('_').to_lowercase();
            let field = match name.as_str() {
                "cache_matches" => &mut config.cache_matches,
                "log_broadcasts" => &mut config.log_broadcasts,
                "warn_on_empty" => &mut config.warn_on_empty,
                _ => continue,
            };
            *field = parse_bool(&key, &value)?;
        }

        Ok(config)
    }

    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Events configuration builder
#[derive(Debug, Default)]
pub struct EventsConfigBuilder {
    config: EventsConfig,
}

impl EventsConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable/disable the match cache
    pub fn cache_matches(mut self, enabled: bool) -> Self {
        self.config.cache_matches = enabled;
        self
    }

    /// Enable/disable broadcast logging
    pub fn log_broadcasts(mut self, enabled: bool) -> Self {
        self.config.log_broadcasts = enabled;
        self
    }

    /// Enable/disable the empty-broadcast warning
    pub fn warn_on_empty(mut self, enabled: bool) -> Self {
        self.config.warn_on_empty = enabled;
        self
    }

    pub fn build(self) -> EventsConfig {
        self.config
    }
}
