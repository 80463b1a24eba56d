//! Webhook listener configuration (`[webhook]` table).

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    pub port: u16,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl WebhookConfig {
    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_listen_on_all_interfaces_by_default() {
        let config = WebhookConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn should_fill_missing_fields_with_defaults() {
        let config: WebhookConfig = toml::from_str("port = 9090").unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.bind_address(), "0.0.0.0:9090");
    }
}
