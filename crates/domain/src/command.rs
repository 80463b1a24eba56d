//! Command definition — a user-invocable chat command mapped to a bus publication.

use serde::Deserialize;

use crate::error::ValidationError;
use crate::event::Event;

/// A chat command such as `/on` that publishes a fixed payload on a topic.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommandDefinition {
    /// Name typed by the user, without the leading slash.
    #[serde(rename = "command")]
    pub command_name: String,
    #[serde(rename = "topic")]
    pub bus_topic: String,
    #[serde(rename = "message")]
    pub bus_payload: String,
    /// Text sent back to the user after publishing.
    #[serde(rename = "feedback_message", default)]
    pub feedback_text: String,
    /// One-line description shown by `/help`.
    #[serde(rename = "help")]
    pub help_text: String,
}

impl CommandDefinition {
    #[must_use]
    pub fn new(
        command_name: impl Into<String>,
        bus_topic: impl Into<String>,
        bus_payload: impl Into<String>,
        feedback_text: impl Into<String>,
        help_text: impl Into<String>,
    ) -> Self {
        Self {
            command_name: command_name.into(),
            bus_topic: bus_topic.into(),
            bus_payload: bus_payload.into(),
            feedback_text: feedback_text.into(),
            help_text: help_text.into(),
        }
    }

    /// Check that every required field is set.
    ///
    /// The feedback text is optional: an empty one simply sends nothing back.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyField`] naming the first empty field
    /// among `command`, `help`, `topic` and `message`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let kind = || format!("command /{}", self.command_name);
        let required = [
            ("command", &self.command_name),
            ("help", &self.help_text),
            ("topic", &self.bus_topic),
            ("message", &self.bus_payload),
        ];
        for (field, value) in required {
            if value.is_empty() {
                return Err(ValidationError::EmptyField {
                    kind: kind(),
                    field,
                });
            }
        }
        Ok(())
    }

    /// The bus event published when the command is invoked.
    #[must_use]
    pub fn to_event(&self) -> Event {
        Event::new(self.bus_topic.clone(), self.bus_payload.clone().into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn switch_on() -> CommandDefinition {
        CommandDefinition::new("on", "switch/1", "ON", "Switched on", "Turn the switch on")
    }

    #[test]
    fn should_accept_complete_definition() {
        assert!(switch_on().validate().is_ok());
    }

    #[test]
    fn should_accept_empty_feedback() {
        let mut def = switch_on();
        def.feedback_text.clear();
        assert!(def.validate().is_ok());
    }

    #[test]
    fn should_reject_each_missing_required_field() {
        for field in ["command", "help", "topic", "message"] {
            let mut def = switch_on();
            match field {
                "command" => def.command_name.clear(),
                "help" => def.help_text.clear(),
                "topic" => def.bus_topic.clear(),
                _ => def.bus_payload.clear(),
            }
            let err = def.validate().unwrap_err();
            assert!(
                matches!(&err, ValidationError::EmptyField { field: f, .. } if *f == field),
                "unexpected error for {field}: {err}"
            );
        }
    }

    #[test]
    fn should_name_the_command_in_validation_error() {
        let mut def = switch_on();
        def.bus_topic.clear();
        assert_eq!(
            def.validate().unwrap_err().to_string(),
            "command /on is missing the topic"
        );
    }

    #[test]
    fn should_build_bus_event() {
        let event = switch_on().to_event();
        assert_eq!(event, Event::new("switch/1", "ON"));
    }

    #[test]
    fn should_deserialize_from_config_names() {
        let toml = r#"
            command = "off"
            topic = "switch/1"
            message = "OFF"
            feedback_message = "Switched off"
            help = "Turn the switch off"
        "#;
        let def: CommandDefinition = toml::from_str(toml).unwrap();
        assert_eq!(def.command_name, "off");
        assert_eq!(def.bus_payload, "OFF");
        assert_eq!(def.feedback_text, "Switched off");
    }
}
