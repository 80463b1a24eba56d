//! # her-adapter-mqtt
//!
//! MQTT adapter — the bus side of her.
//!
//! ## Responsibilities
//! - Open a session with the broker and wait for its CONNACK
//! - Subscribe to configured topics (QoS 0) and surface inbound publications
//! - Publish retained QoS 0 messages on behalf of commands and intents
//! - Unsubscribe and disconnect within a bounded time on shutdown
//!
//! ## Dependency rule
//! Same as other adapters: depends on `her-app` and `her-domain`.

pub mod client;
pub mod config;
pub mod error;

pub use client::MqttBus;
pub use config::MqttConfig;
pub use error::MqttError;
