//! Event — an immutable message travelling between the bus and the notifier.
//!
//! Most events mirror a broker message (`topic` + `payload`). Control events
//! carry a `control_command` instead and never reach the broker.

use std::borrow::Cow;

/// Topic used for the aggregated status report sent back to the notifier.
pub const STATUS_TOPIC: &str = "status";

/// Control command requesting the aggregated status report.
pub const STATUS_COMMAND: &str = "status";

/// A routed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    topic: String,
    payload: Vec<u8>,
    control_command: Option<String>,
}

impl Event {
    /// Create a bus event.
    #[must_use]
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            control_command: None,
        }
    }

    /// Create a synthetic in-band control event (e.g. `"status"`).
    #[must_use]
    pub fn control(command: impl Into<String>) -> Self {
        Self {
            topic: String::new(),
            payload: Vec::new(),
            control_command: Some(command.into()),
        }
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The payload decoded as UTF-8, with invalid sequences replaced.
    #[must_use]
    pub fn payload_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }

    #[must_use]
    pub fn control_command(&self) -> Option<&str> {
        self.control_command.as_deref()
    }

    /// `true` when both topic and payload are empty.
    ///
    /// Broker callbacks occasionally deliver such messages; they carry no
    /// information and are dropped before any policy is applied.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.topic.is_empty() && self.payload.is_empty()
    }

    /// Render the event as a chat line: `"[<topic>] <payload>"`.
    ///
    /// Returns `None` when either the topic or the payload is empty, since
    /// there is nothing worth telling the user.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        if self.topic.is_empty() || self.payload.is_empty() {
            return None;
        }
        Some(format!("[{}] {}", self.topic, self.payload_str()))
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.control_command {
            Some(command) => write!(f, "control({command})"),
            None => write!(f, "{} => {}", self.topic, self.payload_str()),
        }
    }
}
