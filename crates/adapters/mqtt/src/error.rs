//! MQTT adapter error types.

use her_domain::error::HubError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The request queue towards the event loop rejected a request.
    #[error("MQTT client error")]
    Client(#[source] rumqttc::ClientError),

    /// The event loop lost or could not open the connection.
    #[error("MQTT connection error")]
    Connection(#[source] rumqttc::ConnectionError),

    /// The broker answered the CONNECT with a non-success code.
    #[error("MQTT broker refused the connection: {0}")]
    ConnectRefused(String),

    /// The broker rejected a SUBSCRIBE.
    #[error("MQTT broker rejected subscription to {topic}")]
    SubscribeRejected { topic: String },

    /// The broker did not acknowledge in time.
    #[error("MQTT broker did not acknowledge {operation} in time")]
    Timeout { operation: &'static str },
}

impl MqttError {
    /// Convert into a [`HubError::Transport`] for propagation across port
    /// boundaries.
    #[must_use]
    pub fn into_domain(self) -> HubError {
        HubError::transport(self)
    }
}

impl From<MqttError> for HubError {
    fn from(err: MqttError) -> Self {
        err.into_domain()
    }
}
