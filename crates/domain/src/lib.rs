//! # her-domain
//!
//! Pure domain model for the her notification hub.
//!
//! ## Responsibilities
//! - **Events** routed between the bus and the notifier (including in-band
//!   control events such as `status`)
//! - **Subscription policies** (repeat suppression, alarm thresholds)
//! - **Command definitions** (chat commands mapped to bus publications)
//! - **Intent mappings** (voice-assistant intents mapped to bus publications)
//! - The shared error taxonomy and field validation
//!
//! ## Dependency rule
//! This crate has **no internal dependencies** and performs no IO.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod command;
pub mod error;
pub mod event;
pub mod intent;
pub mod subscription;
