//! # her-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the **voice-assistant webhook**: `POST /alexa/` accepts a JSON
//!   intent `{"action": "...", "room": "..."}` and turns the first matching
//!   [`IntentMapping`](her_domain::intent::IntentMapping) into an event on
//!   the to-bus channel
//! - Answer `GET /` and `GET /health` for liveness probes
//! - Implement the [`Intake`](her_app::ports::Intake) port so the
//!   orchestrator can start the listener and stop it on shutdown
//!
//! ## Dependency rule
//! Depends on `her-app` (for the port trait and routing channels) and
//! `her-domain` (for intents). Never leaks axum types into the domain.

pub mod config;
pub mod error;
pub mod intake;
pub mod router;
pub mod state;

pub use config::WebhookConfig;
pub use error::WebhookError;
pub use intake::WebhookIntake;
