//! Bus worker — the single execution context that owns the broker connection.
//!
//! The worker serialises everything that touches the subscription registry
//! and the delivery memory: inbound broker messages, outbound publications
//! coming from the to-bus channel, and in-band control commands. Because
//! nothing else ever sees the [`DeliveryEngine`], no lock is needed and
//! per-topic ordering follows broker delivery order.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use her_domain::error::{ConflictError, HubError};
use her_domain::event::Event;
use her_domain::subscription::SubscriptionPolicy;

use crate::channels::{Inbox, Outbox};
use crate::delivery::DeliveryEngine;
use crate::dispatcher;
use crate::ports::BusClient;

/// Pause after a broker error before polling again.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(1);

pub struct BusWorker<B> {
    bus: B,
    engine: DeliveryEngine,
    inbox: Inbox,
    to_notifier: Outbox,
    shutdown: CancellationToken,
    disconnect_timeout: Duration,
}

impl<B: BusClient> BusWorker<B> {
    /// `inbox` is the consuming end of the to-bus channel, `to_notifier` the
    /// producing end of the to-notifier channel.
    pub fn new(
        bus: B,
        inbox: Inbox,
        to_notifier: Outbox,
        shutdown: CancellationToken,
        disconnect_timeout: Duration,
    ) -> Self {
        Self {
            bus,
            engine: DeliveryEngine::default(),
            inbox,
            to_notifier,
            shutdown,
            disconnect_timeout,
        }
    }

    /// # Errors
    ///
    /// Returns the adapter error if the broker session cannot be opened.
    pub async fn connect(&mut self) -> Result<(), HubError> {
        self.bus.connect().await?;
        tracing::info!("bus connected");
        Ok(())
    }

    /// Subscribe to the policy's topic and register the policy.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an incomplete policy,
    /// [`ConflictError::DuplicateTopic`] if the topic is already registered,
    /// or the adapter error if the broker rejects the subscription.
    pub async fn subscribe(&mut self, policy: SubscriptionPolicy) -> Result<(), HubError> {
        policy.validate()?;
        if self.engine.registry().lookup(&policy.topic).is_ok() {
            return Err(ConflictError::DuplicateTopic(policy.topic).into());
        }
        tracing::info!(
            topic = %policy.topic,
            repeat = policy.repeat,
            repeat_only_if_different = policy.repeat_only_if_different,
            "subscribing"
        );
        self.bus.subscribe(&policy.topic).await?;
        self.engine.registry_mut().register(policy)
    }

    /// Route messages until shutdown, then unsubscribe and disconnect.
    ///
    /// Per-message failures are logged and never end the loop.
    ///
    /// # Errors
    ///
    /// Currently always returns `Ok`; the signature leaves room for fatal
    /// conditions the orchestrator must see.
    pub async fn run(mut self) -> Result<(), HubError> {
        loop {
            tokio::select! {
                biased;
                () = self.shutdown.cancelled() => break,
                outbound = self.inbox.recv() => match outbound {
                    Some(event) => self.handle_outbound(event).await,
                    None => {
                        tracing::warn!("to-bus channel closed unexpectedly");
                        break;
                    }
                },
                inbound = self.bus.next_message() => match inbound {
                    Ok(event) => self.handle_inbound(&event).await,
                    Err(err) => {
                        tracing::error!(error = %err, source = ?std::error::Error::source(&err), "bus error");
                        if !pause(&self.shutdown).await {
                            break;
                        }
                    }
                },
            }
        }
        self.stop().await;
        Ok(())
    }

    async fn handle_inbound(&mut self, event: &Event) {
        for outbound in self.engine.on_bus_event(event) {
            if !self.to_notifier.send(outbound).await {
                break;
            }
        }
    }

    async fn handle_outbound(&mut self, event: Event) {
        tracing::debug!(%event, "received from notifier");
        if let Some(command) = event.control_command() {
            if let Some(reply) = dispatcher::handle_control(command, &self.engine) {
                self.to_notifier.send(reply).await;
            }
            return;
        }
        self.publish(&event).await;
    }

    async fn publish(&mut self, event: &Event) {
        if let Err(err) = self.bus.publish(event).await {
            tracing::error!(topic = %event.topic(), error = %err, source = ?std::error::Error::source(&err), "publish failed");
        }
    }

    async fn unsubscribe_all(&mut self) {
        for topic in self.engine.registry().topics() {
            match self.bus.unsubscribe(&topic).await {
                Ok(()) => {
                    let _ = self.engine.registry_mut().unregister(&topic);
                }
                Err(err) => tracing::error!(%topic, error = %err, "unsubscribe failed"),
            }
        }
    }

    /// Publish what is left, then unsubscribe and disconnect. Unsubscribing
    /// and disconnecting are each bounded by the disconnect timeout.
    async fn stop(mut self) {
        tracing::info!("stopping bus");

        for event in self.inbox.close_and_drain().await {
            if event.control_command().is_some() {
                tracing::debug!(%event, "control command dropped during shutdown");
                continue;
            }
            self.publish(&event).await;
        }

        let unsubscribed =
            tokio::time::timeout(self.disconnect_timeout, self.unsubscribe_all()).await;
        if unsubscribed.is_err() {
            tracing::warn!(timeout = ?self.disconnect_timeout, "unsubscribe timed out");
        }

        tracing::info!("disconnecting bus");
        self.bus.disconnect(self.disconnect_timeout).await;
    }
}

/// Wait [`RECONNECT_DELAY`]; `false` if shutdown started meanwhile.
async fn pause(shutdown: &CancellationToken) -> bool {
    tokio::select! {
        () = shutdown.cancelled() => false,
        () = tokio::time::sleep(RECONNECT_DELAY) => true,
    }
}
