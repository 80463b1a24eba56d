//! Telegram bot configuration.

use std::time::Duration;

use serde::Deserialize;

/// Credentials and polling settings for the Telegram Bot API.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token issued by `@BotFather`.
    pub token: String,
    /// Chat receiving routed events, greetings and farewells.
    pub channel_id: i64,
    /// Base URL of the Bot API.
    pub api_url: String,
    /// Long-polling timeout for `getUpdates`, in seconds.
    pub poll_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            channel_id: 0,
            api_url: "https://api.telegram.org".to_string(),
            poll_timeout_secs: 60,
        }
    }
}

impl TelegramConfig {
    #[must_use]
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_public_api() {
        let config = TelegramConfig::default();
        assert_eq!(config.api_url, "https://api.telegram.org");
        assert_eq!(config.poll_timeout(), Duration::from_secs(60));
        assert!(config.token.is_empty());
    }

    #[test]
    fn should_deserialize_from_toml() {
        let toml = r#"
            token = "123:abc"
            channel_id = -100123
        "#;
        let config: TelegramConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.token, "123:abc");
        assert_eq!(config.channel_id, -100_123);
        assert_eq!(config.poll_timeout_secs, 60);
    }
}
