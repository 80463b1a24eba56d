//! Intent mapping — voice-assistant `(action, room)` pairs mapped to bus publications.

use serde::Deserialize;

use crate::event::Event;

/// An inbound voice-assistant intent. Missing fields read as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Intent {
    pub action: String,
    pub room: String,
}

/// Static mapping from an [`Intent`] to the event published on the bus.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IntentMapping {
    pub action: String,
    pub room: String,
    #[serde(rename = "topic")]
    pub bus_topic: String,
    #[serde(rename = "message")]
    pub bus_payload: String,
}

impl IntentMapping {
    #[must_use]
    pub fn matches(&self, intent: &Intent) -> bool {
        self.action == intent.action && self.room == intent.room
    }

    #[must_use]
    pub fn to_event(&self) -> Event {
        Event::new(self.bus_topic.clone(), self.bus_payload.clone().into_bytes())
    }
}

/// Resolve an intent against the mapping table. The first match wins.
#[must_use]
pub fn resolve(mappings: &[IntentMapping], intent: &Intent) -> Option<Event> {
    mappings
        .iter()
        .find(|mapping| mapping.matches(intent))
        .map(IntentMapping::to_event)
}
