//! # her-adapter-telegram
//!
//! Telegram adapter — the chat side of her.
//!
//! ## Responsibilities
//! - Authenticate the bot (`getMe`) and greet the configured channel
//! - Long-poll `getUpdates` and turn `/commands` into
//!   [`UserCommand`](her_app::ports::UserCommand)s
//! - Send routed events to the channel and replies to the conversation a
//!   command came from
//! - Say goodbye on stop
//!
//! ## Dependency rule
//! Same as other adapters: depends on `her-app` and `her-domain`.

pub mod api;
pub mod command;
pub mod config;
pub mod error;
pub mod notifier;

pub use config::TelegramConfig;
pub use error::TelegramError;
pub use notifier::TelegramNotifier;
