//! # her-app
//!
//! Application layer — routing core and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters implement:
//!   - `BusClient` — publish/subscribe broker session
//!   - `Notifier` — chat surface (send text, receive user commands)
//!   - `Intake` — external producers of bus events (voice webhook)
//! - Apply per-topic delivery policies (`DeliveryEngine`) backed by the
//!   `SubscriptionRegistry`
//! - Resolve user commands and control events (`CommandDispatcher`)
//! - Run the two routing workers and the lifecycle orchestrator (`Hub`)
//!
//! ## Dependency rule
//! Depends on `her-domain` only (plus `tokio` for channels and tasks).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod bus_worker;
pub mod channels;
pub mod delivery;
pub mod dispatcher;
pub mod notifier_worker;
pub mod orchestrator;
pub mod ports;
pub mod registry;

#[cfg(test)]
mod test_support;
