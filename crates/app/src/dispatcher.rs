//! Command dispatcher — resolves user commands and in-band control events.
//!
//! Two kinds of requests end up here:
//! - **User commands** typed in the notifier (e.g. `/on`), looked up in the
//!   [`CommandDispatcher`] table that is filled at startup and read-only
//!   afterwards.
//! - **Control events** (`Event::control("status")`) travelling on the
//!   to-bus channel, answered locally from the delivery memory by
//!   [`handle_control`] without touching the broker.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use her_domain::command::CommandDefinition;
use her_domain::error::{ConflictError, HubError, NotFoundError};
use her_domain::event::{Event, STATUS_COMMAND, STATUS_TOPIC};

use crate::delivery::DeliveryEngine;

/// Reply sent when a user invokes a command nobody registered.
pub const UNKNOWN_COMMAND_REPLY: &str = "I don't know that command";

/// Name of the built-in help command.
pub const HELP_COMMAND: &str = "help";

/// Table of user-defined commands, keyed by name.
#[derive(Debug, Default)]
pub struct CommandDispatcher {
    commands: BTreeMap<String, CommandDefinition>,
}

impl CommandDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register a command definition.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] if a required field is empty, or
    /// [`ConflictError::DuplicateCommand`] if the name is already taken.
    pub fn add_command(&mut self, definition: CommandDefinition) -> Result<(), HubError> {
        definition.validate()?;
        if self.commands.contains_key(&definition.command_name) {
            return Err(ConflictError::DuplicateCommand(definition.command_name).into());
        }
        tracing::info!(command = %definition.command_name, topic = %definition.bus_topic, "command registered");
        self.commands
            .insert(definition.command_name.clone(), definition);
        Ok(())
    }

    /// Look up a command and return the event to publish plus the feedback
    /// text for the user.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] if no command has that name.
    pub fn resolve_command(&self, name: &str) -> Result<(Event, String), HubError> {
        let definition = self.commands.get(name).ok_or_else(|| NotFoundError {
            entity: "command",
            key: name.to_string(),
        })?;
        Ok((definition.to_event(), definition.feedback_text.clone()))
    }

    /// The `/help` text: built-in help first, then every registered command
    /// in name order.
    #[must_use]
    pub fn help_text(&self) -> String {
        let mut text = String::from("Available commands:\n\n/help - Get this help\n");
        for (name, definition) in &self.commands {
            let _ = writeln!(text, "/{name} - {}", definition.help_text);
        }
        text
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Answer an in-band control command.
///
/// Returns the event to send back toward the notifier, or `None` for an
/// unknown command (logged and dropped).
#[must_use]
pub fn handle_control(command: &str, engine: &DeliveryEngine) -> Option<Event> {
    match command {
        STATUS_COMMAND => Some(status_report(engine)),
        other => {
            tracing::error!(command = %other, "unknown control command");
            None
        }
    }
}

/// One `"<label>: <last payload>\n"` line per topic that has received
/// something. Line order follows registry iteration and is unspecified.
#[must_use]
pub fn status_report(engine: &DeliveryEngine) -> Event {
    let mut report = String::new();
    for (policy, payload) in engine.last_values() {
        let _ = writeln!(report, "{}: {}", policy.label, String::from_utf8_lossy(payload));
    }
    Event::new(STATUS_TOPIC, report)
}
