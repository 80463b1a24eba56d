//! Subscription registry — in-memory table of topic → policy.
//!
//! Populated once during startup and emptied during shutdown, both from
//! the bus worker's single execution context. It is never shared between
//! tasks, so it needs no lock.

use std::collections::HashMap;

use her_domain::error::{ConflictError, HubError, NotFoundError};
use her_domain::subscription::SubscriptionPolicy;

#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    entries: HashMap<String, SubscriptionPolicy>,
}

impl SubscriptionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a policy keyed by its topic.
    ///
    /// # Errors
    ///
    /// Returns [`ConflictError::DuplicateTopic`] if the topic is already
    /// registered. Subscribing twice to the same topic is a caller error.
    pub fn register(&mut self, policy: SubscriptionPolicy) -> Result<(), HubError> {
        if self.entries.contains_key(&policy.topic) {
            return Err(ConflictError::DuplicateTopic(policy.topic).into());
        }
        self.entries.insert(policy.topic.clone(), policy);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] if no policy exists for `topic`.
    pub fn lookup(&self, topic: &str) -> Result<&SubscriptionPolicy, HubError> {
        self.entries.get(topic).ok_or_else(|| not_found(topic))
    }

    /// Remove the policy for `topic`, returning it.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] if no policy exists for `topic`.
    pub fn unregister(&mut self, topic: &str) -> Result<SubscriptionPolicy, HubError> {
        self.entries.remove(topic).ok_or_else(|| not_found(topic))
    }

    /// Iterate over registered policies in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &SubscriptionPolicy> {
        self.entries.values()
    }

    /// Snapshot of the registered topics.
    #[must_use]
    pub fn topics(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn not_found(topic: &str) -> HubError {
    NotFoundError {
        entity: "subscription",
        key: topic.to_string(),
    }
    .into()
}
