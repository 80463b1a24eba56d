//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`HubError`]
//! at port boundaries via `#[from]` or an explicit `into_domain()`.

/// Base error type shared by the domain, the application core and the
/// port traits adapters implement.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// A value failed a domain invariant.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A lookup did not find the requested item.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// An insertion collided with an existing key.
    #[error("conflict")]
    Conflict(#[from] ConflictError),

    /// An alarm rule could not be evaluated.
    #[error("alarm evaluation failed")]
    Alarm(#[from] AlarmError),

    /// An adapter (broker, chat platform, HTTP listener) failed.
    #[error("transport error")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl HubError {
    /// Wrap any adapter error as a [`HubError::Transport`].
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Box::new(err))
    }
}

/// A required field is missing or a value is malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required string field is empty.
    #[error("{kind} is missing the {field}")]
    EmptyField {
        /// What was being validated (e.g. `"command /on"`).
        kind: String,
        /// Name of the empty field.
        field: &'static str,
    },
}

/// Returned when a lookup finds nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {key} not found")]
pub struct NotFoundError {
    /// The kind of item looked up (e.g. `"subscription"`).
    pub entity: &'static str,
    /// The key that was looked up.
    pub key: String,
}

/// A unique key is already taken.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConflictError {
    /// A subscription policy for this topic is already registered.
    #[error("topic {0} is already subscribed")]
    DuplicateTopic(String),
    /// A command with this name is already registered.
    #[error("command {0} already exists")]
    DuplicateCommand(String),
}

/// Failures while evaluating an [`AlarmRule`](crate::subscription::AlarmRule).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AlarmError {
    /// The payload is not a base-10 floating point number.
    #[error("cannot convert {payload:?} to a number")]
    InvalidValue {
        /// The offending payload, lossily decoded.
        payload: String,
    },
    /// The configured operator is not one of the supported comparisons.
    #[error("unknown operator {0}")]
    UnknownOperator(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_empty_field_error() {
        let err = ValidationError::EmptyField {
            kind: "command /on".to_string(),
            field: "topic",
        };
        assert_eq!(err.to_string(), "command /on is missing the topic");
    }

    #[test]
    fn should_display_not_found_error() {
        let err = NotFoundError {
            entity: "subscription",
            key: "home/temp".to_string(),
        };
        assert_eq!(err.to_string(), "subscription home/temp not found");
    }

    #[test]
    fn should_convert_conflict_into_hub_error() {
        let err: HubError = ConflictError::DuplicateCommand("on".to_string()).into();
        assert!(matches!(
            err,
            HubError::Conflict(ConflictError::DuplicateCommand(name)) if name == "on"
        ));
    }

    #[test]
    fn should_wrap_adapter_errors_as_transport() {
        let io = std::io::Error::other("broker down");
        let err = HubError::transport(io);
        assert!(matches!(err, HubError::Transport(_)));
        assert_eq!(err.to_string(), "transport error");
    }

    #[test]
    fn should_display_alarm_errors() {
        let err = AlarmError::InvalidValue {
            payload: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "cannot convert \"abc\" to a number");
        assert_eq!(
            AlarmError::UnknownOperator("between".to_string()).to_string(),
            "unknown operator between"
        );
    }
}
