//! [`Intake`] implementation serving the webhook router.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use her_app::channels::Outbox;
use her_app::ports::Intake;
use her_domain::error::HubError;
use her_domain::intent::IntentMapping;

use crate::config::WebhookConfig;
use crate::error::WebhookError;
use crate::router;
use crate::state::IntakeState;

/// Bound but not yet serving webhook listener.
#[derive(Debug)]
pub struct WebhookIntake {
    listener: TcpListener,
    intents: Vec<IntentMapping>,
}

impl WebhookIntake {
    /// Bind the listener. Requests are only served after [`Intake::start`].
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError::Bind`] if the address is invalid or taken.
    pub async fn bind(
        config: &WebhookConfig,
        intents: Vec<IntentMapping>,
    ) -> Result<Self, WebhookError> {
        let address = config.bind_address();
        let listener = match TcpListener::bind(&address).await {
            Ok(listener) => listener,
            Err(source) => return Err(WebhookError::Bind { address, source }),
        };
        Ok(Self { listener, intents })
    }

    /// # Errors
    ///
    /// Returns the OS error if the socket address cannot be read.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

impl Intake for WebhookIntake {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn start(
        self,
        to_bus: Outbox,
        shutdown: CancellationToken,
    ) -> Result<JoinHandle<()>, HubError> {
        let address = self.local_addr().map_err(WebhookError::Serve)?;
        let app = router::build(IntakeState::new(self.intents, to_bus));
        tracing::info!(%address, "webhook listening");

        let listener = self.listener;
        Ok(tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown.cancelled_owned())
                .await
            {
                tracing::error!(error = %err, "webhook server failed");
            }
            tracing::info!("webhook stopped");
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    use her_app::channels::routing_channel;
    use her_domain::event::Event;

    use super::*;

    fn local() -> WebhookConfig {
        WebhookConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        }
    }

    async fn post(address: SocketAddr, body: &str) -> String {
        let mut stream = TcpStream::connect(address).await.unwrap();
        let request = format!(
            "POST /alexa/ HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn should_refuse_an_address_already_in_use() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = WebhookConfig {
            host: "127.0.0.1".to_string(),
            port: taken.local_addr().unwrap().port(),
        };

        let err = WebhookIntake::bind(&config, Vec::new()).await.unwrap_err();
        assert!(matches!(err, WebhookError::Bind { .. }));
    }

    #[tokio::test]
    async fn should_serve_intents_until_shutdown() {
        let intents = vec![IntentMapping {
            action: "off".to_string(),
            room: "hall".to_string(),
            bus_topic: "light/hall".to_string(),
            bus_payload: "OFF".to_string(),
        }];
        let intake = WebhookIntake::bind(&local(), intents).await.unwrap();
        let address = intake.local_addr().unwrap();
        let shutdown = CancellationToken::new();
        let (to_bus, mut inbox) = routing_channel("to-bus", &shutdown);

        let handle = intake.start(to_bus, shutdown.clone()).await.unwrap();
        let response = post(address, r#"{"action":"off","room":"hall"}"#).await;

        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.ends_with("ok"));
        assert_eq!(inbox.recv().await, Some(Event::new("light/hall", "OFF")));

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("listener should stop on shutdown")
            .unwrap();
    }
}
