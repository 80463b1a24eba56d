//! [`BusClient`] implementation over a `rumqttc` client and event loop.
//!
//! `rumqttc` splits a session into an [`AsyncClient`] (request queue) and an
//! [`EventLoop`] that only makes progress while polled. [`MqttBus`] owns both
//! and polls the loop itself: while waiting for an acknowledgement, inbound
//! publications are parked in a backlog that [`BusClient::next_message`]
//! drains first.

use std::collections::VecDeque;
use std::time::Duration;

use rumqttc::{
    AsyncClient, ConnectReturnCode, EventLoop, MqttOptions, Outgoing, Packet, Publish, QoS,
    SubscribeReasonCode,
};

use her_app::ports::BusClient;
use her_domain::error::HubError;
use her_domain::event::Event;

use crate::config::MqttConfig;
use crate::error::MqttError;

/// How long to wait for CONNACK, SUBACK or UNSUBACK.
const ACK_TIMEOUT: Duration = Duration::from_secs(10);

pub struct MqttBus {
    broker: String,
    client: AsyncClient,
    eventloop: EventLoop,
    backlog: VecDeque<Event>,
    topics: Vec<String>,
}

impl std::fmt::Debug for MqttBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttBus")
            .field("broker", &self.broker)
            .field("topics", &self.topics)
            .field("backlog", &self.backlog.len())
            .finish_non_exhaustive()
    }
}

impl MqttBus {
    /// Prepare a session. No network traffic happens before
    /// [`BusClient::connect`].
    #[must_use]
    pub fn new(config: &MqttConfig) -> Self {
        let mut options = MqttOptions::new(
            config.client_id.clone(),
            config.broker_host.clone(),
            config.broker_port,
        );
        options.set_keep_alive(config.keep_alive());
        options.set_clean_session(true);

        let (client, eventloop) = AsyncClient::new(options, config.request_capacity);
        Self {
            broker: format!("{}:{}", config.broker_host, config.broker_port),
            client,
            eventloop,
            backlog: VecDeque::new(),
            topics: Vec::new(),
        }
    }

    /// Poll the event loop until `is_ack` returns a result, parking inbound
    /// publications in the backlog.
    async fn drive(
        &mut self,
        operation: &'static str,
        is_ack: impl FnMut(&Packet) -> Option<Result<(), MqttError>> + Send,
    ) -> Result<(), MqttError> {
        tokio::time::timeout(ACK_TIMEOUT, self.poll_until(is_ack))
            .await
            .map_err(|_| MqttError::Timeout { operation })?
    }

    async fn poll_until(
        &mut self,
        mut is_ack: impl FnMut(&Packet) -> Option<Result<(), MqttError>> + Send,
    ) -> Result<(), MqttError> {
        loop {
            let event = self
                .eventloop
                .poll()
                .await
                .map_err(MqttError::Connection)?;
            let rumqttc::Event::Incoming(packet) = event else {
                continue;
            };
            if let Some(result) = is_ack(&packet) {
                return result;
            }
            if let Packet::Publish(publish) = packet {
                self.backlog.push_back(to_event(publish));
            }
        }
    }

    /// The broker forgot our subscriptions after a reconnection: ask again.
    fn resubscribe(&self) {
        for topic in &self.topics {
            if let Err(err) = self.client.try_subscribe(topic.as_str(), QoS::AtMostOnce) {
                tracing::error!(%topic, error = %err, "resubscription failed");
            }
        }
    }
}

fn to_event(publish: Publish) -> Event {
    let topic = Vec::<u8>::from(publish.topic);
    Event::new(
        String::from_utf8_lossy(&topic).into_owned(),
        publish.payload.to_vec(),
    )
}

impl BusClient for MqttBus {
    async fn connect(&mut self) -> Result<(), HubError> {
        tracing::info!(broker = %self.broker, "connecting to broker");
        self.drive("connect", |packet| match packet {
            Packet::ConnAck(ack) if ack.code == ConnectReturnCode::Success => Some(Ok(())),
            Packet::ConnAck(ack) => Some(Err(MqttError::ConnectRefused(format!("{:?}", ack.code)))),
            _ => None,
        })
        .await?;
        Ok(())
    }

    async fn subscribe(&mut self, topic: &str) -> Result<(), HubError> {
        self.client
            .try_subscribe(topic, QoS::AtMostOnce)
            .map_err(MqttError::Client)?;
        self.drive("subscribe", |packet| match packet {
            Packet::SubAck(ack)
                if ack
                    .return_codes
                    .iter()
                    .any(|code| matches!(code, SubscribeReasonCode::Failure)) =>
            {
                Some(Err(MqttError::SubscribeRejected {
                    topic: topic.to_string(),
                }))
            }
            Packet::SubAck(_) => Some(Ok(())),
            _ => None,
        })
        .await?;
        self.topics.push(topic.to_string());
        Ok(())
    }

    async fn publish(&mut self, event: &Event) -> Result<(), HubError> {
        tracing::debug!(topic = %event.topic(), "publishing");
        self.client
            .try_publish(
                event.topic().to_string(),
                QoS::AtMostOnce,
                true,
                event.payload().to_vec(),
            )
            .map_err(MqttError::Client)?;
        Ok(())
    }

    async fn unsubscribe(&mut self, topic: &str) -> Result<(), HubError> {
        self.client
            .try_unsubscribe(topic)
            .map_err(MqttError::Client)?;
        self.drive("unsubscribe", |packet| {
            matches!(packet, Packet::UnsubAck(_)).then_some(Ok(()))
        })
        .await?;
        self.topics.retain(|known| known != topic);
        tracing::debug!(%topic, "unsubscribed");
        Ok(())
    }

    async fn next_message(&mut self) -> Result<Event, HubError> {
        loop {
            if let Some(event) = self.backlog.pop_front() {
                return Ok(event);
            }
            match self.eventloop.poll().await.map_err(MqttError::Connection)? {
                rumqttc::Event::Incoming(Packet::Publish(publish)) => return Ok(to_event(publish)),
                rumqttc::Event::Incoming(Packet::ConnAck(ack)) => {
                    tracing::info!(broker = %self.broker, session_present = ack.session_present, "reconnected to broker");
                    if !ack.session_present {
                        self.resubscribe();
                    }
                }
                _ => {}
            }
        }
    }

    async fn disconnect(&mut self, timeout: Duration) {
        if let Err(err) = self.client.try_disconnect() {
            tracing::warn!(error = %err, "cannot request disconnection");
            return;
        }
        let flushed = tokio::time::timeout(timeout, async {
            loop {
                match self.eventloop.poll().await {
                    Ok(rumqttc::Event::Outgoing(Outgoing::Disconnect)) | Err(_) => break,
                    Ok(_) => {}
                }
            }
        })
        .await;
        match flushed {
            Ok(()) => tracing::info!(broker = %self.broker, "disconnected from broker"),
            Err(_) => tracing::warn!(broker = %self.broker, ?timeout, "disconnect timed out"),
        }
    }
}
