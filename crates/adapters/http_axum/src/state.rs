//! Shared state for the webhook handlers.

use std::sync::Arc;

use her_app::channels::Outbox;
use her_domain::intent::IntentMapping;

/// State shared across the webhook handlers.
///
/// `Clone` only bumps the `Arc` and clones the channel sender.
#[derive(Debug, Clone)]
pub struct IntakeState {
    /// Intent table, first match wins.
    pub intents: Arc<Vec<IntentMapping>>,
    /// Producer side of the to-bus channel.
    pub to_bus: Outbox,
}

impl IntakeState {
    #[must_use]
    pub fn new(intents: Vec<IntentMapping>, to_bus: Outbox) -> Self {
        Self {
            intents: Arc::new(intents),
            to_bus,
        }
    }
}
