//! Telegram adapter error types.

use her_domain::error::{HubError, ValidationError};

/// Errors specific to the Telegram adapter.
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("missing bot token")]
    MissingToken,

    #[error("missing channel id")]
    MissingChannelId,

    /// The HTTP request failed or the body could not be decoded.
    #[error("Telegram HTTP error")]
    Http(#[source] reqwest::Error),

    /// The Bot API answered with `ok: false`.
    #[error("Telegram API error: {description}")]
    Api {
        code: Option<i64>,
        description: String,
    },

    /// A reply target that is not a Telegram chat id.
    #[error("invalid conversation {0:?}")]
    InvalidConversation(String),
}

impl TelegramError {
    /// Convert into a [`HubError`] for propagation across port boundaries.
    #[must_use]
    pub fn into_domain(self) -> HubError {
        match self {
            Self::MissingToken => ValidationError::EmptyField {
                kind: "bot".to_string(),
                field: "token",
            }
            .into(),
            Self::MissingChannelId => ValidationError::EmptyField {
                kind: "bot".to_string(),
                field: "channel_id",
            }
            .into(),
            other => HubError::transport(other),
        }
    }
}

impl From<TelegramError> for HubError {
    fn from(err: TelegramError) -> Self {
        err.into_domain()
    }
}
