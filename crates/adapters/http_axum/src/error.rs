//! Webhook errors and HTTP error response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use her_domain::error::HubError;

/// Failures of the webhook listener itself.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("cannot bind webhook listener on {address}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("webhook server failed")]
    Serve(#[source] std::io::Error),
}

impl WebhookError {
    #[must_use]
    pub fn into_domain(self) -> HubError {
        HubError::transport(self)
    }
}

impl From<WebhookError> for HubError {
    fn from(err: WebhookError) -> Self {
        err.into_domain()
    }
}

/// Maps a rejected request body to a plain-text `400 Bad Request`.
#[derive(Debug)]
pub struct ApiError(serde_json::Error);

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self.0, "malformed intent");
        (StatusCode::BAD_REQUEST, self.0.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_map_bind_failure_to_transport() {
        let err = WebhookError::Bind {
            address: "0.0.0.0:80".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert_eq!(err.to_string(), "cannot bind webhook listener on 0.0.0.0:80");
        assert!(matches!(err.into_domain(), HubError::Transport(_)));
    }

    #[test]
    fn should_answer_bad_request_for_malformed_json() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let response = ApiError::from(parse).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
