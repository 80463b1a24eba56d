//! Delivery policy engine — decides which bus events reach the notifier.
//!
//! For every inbound bus event the engine applies the topic's
//! [`SubscriptionPolicy`]: repeat suppression against the last payload seen
//! on that topic, then the optional alarm rule, which may synthesize an extra
//! alarm event. The engine owns the per-topic [`DeliveryMemory`] and is only
//! ever driven from the bus worker, which serialises all inbound messages.

use std::collections::HashMap;

use her_domain::error::AlarmError;
use her_domain::event::Event;
use her_domain::subscription::{AlarmRule, SubscriptionPolicy};

use crate::registry::SubscriptionRegistry;

/// What the engine remembers about a topic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryMemory {
    /// The most recent payload, forwarded or not.
    pub last_payload: Vec<u8>,
    /// The payload that last fired the alarm.
    pub last_alarm_payload: Option<Vec<u8>>,
}

#[derive(Debug, Default)]
pub struct DeliveryEngine {
    registry: SubscriptionRegistry,
    memory: HashMap<String, DeliveryMemory>,
}

impl DeliveryEngine {
    #[must_use]
    pub fn new(registry: SubscriptionRegistry) -> Self {
        Self {
            registry,
            memory: HashMap::new(),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SubscriptionRegistry {
        &mut self.registry
    }

    #[must_use]
    pub fn memory(&self, topic: &str) -> Option<&DeliveryMemory> {
        self.memory.get(topic)
    }

    /// Registered policies paired with the last payload seen on their topic.
    ///
    /// Topics that have not received anything yet are skipped.
    pub fn last_values(&self) -> impl Iterator<Item = (&SubscriptionPolicy, &[u8])> {
        self.registry.iter().filter_map(|policy| {
            self.memory
                .get(&policy.topic)
                .map(|memory| (policy, memory.last_payload.as_slice()))
        })
    }

    /// Process one inbound bus event and return the events to forward to
    /// the notifier: nothing, the event itself, an alarm, or both (event
    /// first).
    pub fn on_bus_event(&mut self, event: &Event) -> Vec<Event> {
        if event.is_blank() {
            return Vec::new();
        }

        let policy = match self.registry.lookup(event.topic()) {
            Ok(policy) => policy,
            Err(err) => {
                tracing::error!(topic = %event.topic(), error = %err, "cannot find topic among subscribed topics");
                return Vec::new();
            }
        };

        tracing::info!(topic = %event.topic(), payload = %event.payload_str(), "received bus message");

        let seen = self.memory.contains_key(event.topic());
        let memory = self.memory.entry(event.topic().to_string()).or_default();
        let last = seen.then_some(memory.last_payload.as_slice());

        let mut outbound = Vec::with_capacity(2);
        if policy.should_forward(event.payload(), last) {
            tracing::debug!(topic = %event.topic(), "forwarding to notifier");
            outbound.push(event.clone());
        }
        memory.last_payload = event.payload().to_vec();

        if let Some(rule) = &policy.alarm {
            match check_alarm(policy, rule, event, memory) {
                Ok(Some(alarm)) => outbound.push(alarm),
                Ok(None) => {}
                Err(err) => {
                    tracing::error!(topic = %event.topic(), error = %err, "alarm skipped");
                }
            }
        }

        outbound
    }
}

/// Evaluate the alarm rule and update `memory.last_alarm_payload` when it
/// fires.
///
/// A rule only re-fires once the triggering payload differs from the one
/// that fired last. A non-triggering value does not reset that memory.
fn check_alarm(
    policy: &SubscriptionPolicy,
    rule: &AlarmRule,
    event: &Event,
    memory: &mut DeliveryMemory,
) -> Result<Option<Event>, AlarmError> {
    let value = AlarmRule::parse_value(event.payload())?;
    if !rule.is_triggered(value)? {
        return Ok(None);
    }
    if memory.last_alarm_payload.as_deref() == Some(event.payload()) {
        return Ok(None);
    }

    memory.last_alarm_payload = Some(event.payload().to_vec());
    tracing::warn!(topic = %policy.topic, value, "alarm triggered");
    Ok(Some(Event::new(
        policy.topic.clone(),
        format!("Alarm: {} value is {value:.2}", policy.label),
    )))
}
