//! Configuration loading — TOML file with environment variable overrides.
//!
//! The file is required: the hub cannot run without bot credentials. Its
//! path is the first command line argument, else `HER_CONFIG`, else
//! `her.toml` in the working directory. Environment variables take
//! precedence over file values.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use her_adapter_http_axum::WebhookConfig;
use her_adapter_mqtt::MqttConfig;
use her_adapter_telegram::TelegramConfig;
use her_app::orchestrator::HubConfig;
use her_domain::command::CommandDefinition;
use her_domain::error::ValidationError;
use her_domain::intent::IntentMapping;
use her_domain::subscription::SubscriptionPolicy;

const DEFAULT_PATH: &str = "her.toml";

/// Only bot platform implemented so far.
const TELEGRAM: &str = "telegram";

/// Lowest keep-alive interval the broker client accepts.
const MIN_KEEP_ALIVE_SECS: u16 = 5;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub mqtt: MqttConfig,
    pub bot: BotConfig,
    pub webhook: WebhookConfig,
    pub subscriptions: Vec<SubscriptionPolicy>,
    pub commands: Vec<CommandDefinition>,
    pub intents: Vec<IntentMapping>,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Chat bot selection and credentials.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub telegram: TelegramConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "herd=info,her=info,tower_http=info".to_string(),
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            kind: TELEGRAM.to_string(),
            telegram: TelegramConfig::default(),
        }
    }
}

/// Pick the configuration file: explicit argument, then `HER_CONFIG`, then
/// the default name.
pub fn resolve_path(argument: Option<String>, from_env: Option<String>) -> PathBuf {
    argument
        .or(from_env)
        .map_or_else(|| PathBuf::from(DEFAULT_PATH), PathBuf::from)
}

impl Config {
    /// Load the file at `path`, apply environment overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, if an override
    /// is malformed, or if a required value is missing.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(ConfigError::Parse)
    }

    fn apply_overrides(
        &mut self,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(val) = var("HER_MQTT_HOST") {
            self.mqtt.broker_host = val;
        }
        if let Some(val) = var("HER_MQTT_PORT") {
            self.mqtt.broker_port = parse_override("HER_MQTT_PORT", &val)?;
        }
        if let Some(val) = var("HER_BOT_TOKEN") {
            self.bot.telegram.token = val;
        }
        if let Some(val) = var("HER_BOT_CHANNEL_ID") {
            self.bot.telegram.channel_id = parse_override("HER_BOT_CHANNEL_ID", &val)?;
        }
        if let Some(val) = var("HER_WEBHOOK_BIND") {
            let Some((host, port)) = val.rsplit_once(':') else {
                return Err(ConfigError::Validation(format!(
                    "HER_WEBHOOK_BIND must be host:port, got {val:?}"
                )));
            };
            self.webhook.port = parse_override("HER_WEBHOOK_BIND", port)?;
            self.webhook.host = host.to_string();
        }
        if let Some(val) = var("HER_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.bot.kind != TELEGRAM {
            return Err(ConfigError::Validation(format!(
                "unknown bot type {:?}",
                self.bot.kind
            )));
        }
        if self.bot.telegram.token.is_empty() {
            return Err(ConfigError::Validation("bot token is missing".to_string()));
        }
        if self.bot.telegram.channel_id == 0 {
            return Err(ConfigError::Validation(
                "bot channel_id is missing".to_string(),
            ));
        }
        if self.webhook.port == 0 {
            return Err(ConfigError::Validation(
                "webhook port must be non-zero".to_string(),
            ));
        }
        if self.mqtt.keep_alive_secs < MIN_KEEP_ALIVE_SECS {
            return Err(ConfigError::Validation(format!(
                "mqtt keep_alive_secs must be at least {MIN_KEEP_ALIVE_SECS}"
            )));
        }
        for policy in &self.subscriptions {
            policy.validate()?;
        }
        for command in &self.commands {
            command.validate()?;
        }
        if let Some(intent) = self.intents.iter().find(|intent| intent.bus_topic.is_empty()) {
            return Err(ConfigError::Validation(format!(
                "intent {} {} is missing the topic",
                intent.action, intent.room
            )));
        }
        Ok(())
    }

    /// The part of the configuration the routing core consumes.
    #[must_use]
    pub fn hub_config(&self) -> HubConfig {
        HubConfig {
            subscriptions: self.subscriptions.clone(),
            commands: self.commands.clone(),
            disconnect_timeout: self.mqtt.disconnect_timeout(),
        }
    }
}

fn parse_override<T: std::str::FromStr>(key: &str, val: &str) -> Result<T, ConfigError> {
    val.parse()
        .map_err(|_| ConfigError::Validation(format!("{key} is not a valid number: {val:?}")))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

impl From<ValidationError> for ConfigError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}
