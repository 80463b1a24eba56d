//! MQTT bus configuration.

use std::time::Duration;

use serde::Deserialize;

/// Connection settings for the broker.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// Broker hostname or IP address.
    pub broker_host: String,
    /// Broker port.
    pub broker_port: u16,
    /// MQTT client identifier.
    pub client_id: String,
    /// Keep-alive interval in seconds (at least 5).
    pub keep_alive_secs: u16,
    /// Upper bound for the clean disconnect on shutdown, in milliseconds.
    pub disconnect_timeout_ms: u64,
    /// Capacity of the request queue between the client and its event loop.
    pub request_capacity: usize,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            client_id: "her".to_string(),
            keep_alive_secs: 30,
            disconnect_timeout_ms: 250,
            request_capacity: 10,
        }
    }
}

impl MqttConfig {
    #[must_use]
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(u64::from(self.keep_alive_secs))
    }

    #[must_use]
    pub fn disconnect_timeout(&self) -> Duration {
        Duration::from_millis(self.disconnect_timeout_ms)
    }
}
