//! Axum router assembly and webhook handlers.

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use her_domain::intent::{Intent, resolve};

use crate::error::ApiError;
use crate::state::IntakeState;

/// Build the webhook [`Router`].
///
/// Includes a [`TraceLayer`] that logs each HTTP request/response at the
/// `DEBUG` level using the `tracing` ecosystem.
pub fn build(state: IntakeState) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/health", get(health_check))
        .route("/alexa/", post(receive_intent))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn welcome() -> &'static str {
    "Welcome home!"
}

async fn health_check() -> &'static str {
    "OK"
}

/// Apply the first mapping matching the posted intent.
///
/// Unknown intents are acknowledged like known ones; only a body that is
/// not an intent is refused.
async fn receive_intent(
    State(state): State<IntakeState>,
    body: Bytes,
) -> Result<&'static str, ApiError> {
    let intent: Intent = serde_json::from_slice(&body)?;
    match resolve(&state.intents, &intent) {
        Some(event) => {
            tracing::info!(action = %intent.action, room = %intent.room, %event, "applying action");
            state.to_bus.send(event).await;
        }
        None => {
            tracing::warn!(action = %intent.action, room = %intent.room, "cannot find action");
        }
    }
    Ok("ok")
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    use her_app::channels::{Inbox, routing_channel};
    use her_domain::event::Event;
    use her_domain::intent::IntentMapping;

    use super::*;

    fn app() -> (Router, Inbox) {
        let shutdown = CancellationToken::new();
        let (to_bus, inbox) = routing_channel("to-bus", &shutdown);
        let intents = vec![
            IntentMapping {
                action: "on".to_string(),
                room: "kitchen".to_string(),
                bus_topic: "light/kitchen".to_string(),
                bus_payload: "ON".to_string(),
            },
            IntentMapping {
                action: "on".to_string(),
                room: "kitchen".to_string(),
                bus_topic: "light/other".to_string(),
                bus_payload: "1".to_string(),
            },
        ];
        (build(IntakeState::new(intents, to_bus)), inbox)
    }

    fn post_intent(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/alexa/")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn should_welcome_on_root() {
        let (app, _inbox) = app();
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "Welcome home!");
    }

    #[tokio::test]
    async fn should_return_ok_on_health_check() {
        let (app, _inbox) = app();
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "OK");
    }

    #[tokio::test]
    async fn should_send_first_matching_intent_to_bus() {
        let (app, mut inbox) = app();
        let response = app
            .oneshot(post_intent(r#"{"action":"on","room":"kitchen"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ok");
        assert_eq!(inbox.recv().await, Some(Event::new("light/kitchen", "ON")));
    }

    #[tokio::test]
    async fn should_acknowledge_unknown_intent_without_sending() {
        let (app, mut inbox) = app();
        let response = app
            .oneshot(post_intent(r#"{"action":"off","room":"garage"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ok");
        assert!(inbox.close_and_drain().await.is_empty());
    }

    #[tokio::test]
    async fn should_acknowledge_intent_with_missing_room() {
        let (app, mut inbox) = app();
        let response = app.oneshot(post_intent(r#"{"action":"on"}"#)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ok");
        assert!(inbox.close_and_drain().await.is_empty());
    }

    #[tokio::test]
    async fn should_reject_malformed_body() {
        let (app, mut inbox) = app();
        let response = app.oneshot(post_intent("{\"action\":")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(!body_text(response).await.is_empty());
        assert!(inbox.close_and_drain().await.is_empty());
    }
}
