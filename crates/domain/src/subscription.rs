//! Subscription policy — how events on a bus topic are forwarded.

use std::str::FromStr;

use serde::Deserialize;

use crate::error::{AlarmError, ValidationError};

/// Per-topic delivery policy, keyed by `topic`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubscriptionPolicy {
    /// Human-facing name used in status reports and alarm texts.
    pub label: String,
    /// Bus topic, the unique key of the policy.
    pub topic: String,
    /// Forward events on this topic at all.
    #[serde(default)]
    pub repeat: bool,
    /// Only forward when the payload differs from the previous one.
    #[serde(default)]
    pub repeat_only_if_different: bool,
    /// Optional threshold rule.
    #[serde(default)]
    pub alarm: Option<AlarmRule>,
}

impl SubscriptionPolicy {
    /// Create a policy without an alarm.
    #[must_use]
    pub fn new(
        label: impl Into<String>,
        topic: impl Into<String>,
        repeat: bool,
        repeat_only_if_different: bool,
    ) -> Self {
        Self {
            label: label.into(),
            topic: topic.into(),
            repeat,
            repeat_only_if_different,
            alarm: None,
        }
    }

    /// Attach an alarm rule.
    #[must_use]
    pub fn with_alarm(mut self, alarm: AlarmRule) -> Self {
        self.alarm = Some(alarm);
        self
    }

    /// Decide whether a payload is forwarded, given the previous payload seen
    /// on the same topic (`None` on first sight).
    ///
    /// `repeat = false` never forwards. `repeat_only_if_different = false`
    /// always forwards. Otherwise only first sights and changes forward.
    #[must_use]
    pub fn should_forward(&self, payload: &[u8], last_payload: Option<&[u8]>) -> bool {
        self.repeat && (!self.repeat_only_if_different || last_payload != Some(payload))
    }

    /// Check required fields.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyField`] if `label` or `topic` is empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let kind = || format!("subscription {:?}", self.topic);
        if self.topic.is_empty() {
            return Err(ValidationError::EmptyField {
                kind: kind(),
                field: "topic",
            });
        }
        if self.label.is_empty() {
            return Err(ValidationError::EmptyField {
                kind: kind(),
                field: "label",
            });
        }
        Ok(())
    }
}

/// Comparison applied by an [`AlarmRule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmOperator {
    GreaterThan,
    LessThan,
    EqualTo,
}

impl FromStr for AlarmOperator {
    type Err = AlarmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "greater_than" => Ok(Self::GreaterThan),
            "less_than" => Ok(Self::LessThan),
            "equal_to" => Ok(Self::EqualTo),
            other => Err(AlarmError::UnknownOperator(other.to_string())),
        }
    }
}

impl std::fmt::Display for AlarmOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::GreaterThan => "greater_than",
            Self::LessThan => "less_than",
            Self::EqualTo => "equal_to",
        })
    }
}

/// Threshold rule evaluated against the numeric value of each payload.
///
/// The operator is kept as written in the configuration and parsed on every
/// evaluation, so an unknown operator only disables the alarm instead of
/// preventing startup.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AlarmRule {
    pub operator: String,
    #[serde(rename = "value")]
    pub threshold: f64,
}

impl AlarmRule {
    #[must_use]
    pub fn new(operator: AlarmOperator, threshold: f64) -> Self {
        Self {
            operator: operator.to_string(),
            threshold,
        }
    }

    /// Parse a payload as a base-10 float.
    ///
    /// # Errors
    ///
    /// Returns [`AlarmError::InvalidValue`] if the payload is not a number.
    pub fn parse_value(payload: &[u8]) -> Result<f64, AlarmError> {
        std::str::from_utf8(payload)
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or_else(|| AlarmError::InvalidValue {
                payload: String::from_utf8_lossy(payload).into_owned(),
            })
    }

    /// Whether `value` crosses the threshold.
    ///
    /// # Errors
    ///
    /// Returns [`AlarmError::UnknownOperator`] if the configured operator is
    /// not supported.
    #[allow(clippy::float_cmp)]
    pub fn is_triggered(&self, value: f64) -> Result<bool, AlarmError> {
        let triggered = match self.operator.parse::<AlarmOperator>()? {
            AlarmOperator::GreaterThan => value > self.threshold,
            AlarmOperator::LessThan => value < self.threshold,
            AlarmOperator::EqualTo => value == self.threshold,
        };
        Ok(triggered)
    }
}
