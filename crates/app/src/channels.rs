//! Routing channels between the bus worker, the notifier worker and the
//! webhook intake.
//!
//! Each channel is a bounded `mpsc` of capacity [`ROUTING_CAPACITY`] split
//! into an [`Outbox`] (cloneable, held by every producer) and an [`Inbox`]
//! (unique, held by the consuming worker).
//!
//! ## Close discipline
//! - Only the orchestrator decides when routing stops, by cancelling the
//!   shutdown token it handed to every [`Outbox`] and worker.
//! - The worker owning an [`Inbox`] closes it once it observes that
//!   cancellation, then drains what producers already managed to enqueue.
//! - Producers never close anything. Every [`Outbox::send`] checks the
//!   shutdown token first and races the send against it, so a producer can
//!   never stay blocked on a channel nobody reads anymore.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use her_domain::event::Event;

/// Capacity of the routing channels. Keeps producers in lockstep with
/// consumers, which is the backpressure the hub relies on.
pub const ROUTING_CAPACITY: usize = 1;

/// Create a named routing channel bound to the hub's shutdown token.
#[must_use]
pub fn routing_channel(name: &'static str, shutdown: &CancellationToken) -> (Outbox, Inbox) {
    let (tx, rx) = mpsc::channel(ROUTING_CAPACITY);
    (
        Outbox {
            name,
            tx,
            shutdown: shutdown.clone(),
        },
        Inbox { name, rx },
    )
}

/// Producer side of a routing channel.
#[derive(Debug, Clone)]
pub struct Outbox {
    name: &'static str,
    tx: mpsc::Sender<Event>,
    shutdown: CancellationToken,
}

impl Outbox {
    /// Send an event, waiting for the consumer if the channel is full.
    ///
    /// Returns `false` when the event was dropped because shutdown started
    /// or the consumer already went away.
    pub async fn send(&self, event: Event) -> bool {
        if self.shutdown.is_cancelled() {
            tracing::debug!(channel = self.name, %event, "shutting down, event dropped");
            return false;
        }
        tokio::select! {
            biased;
            () = self.shutdown.cancelled() => {
                tracing::warn!(channel = self.name, "shutdown while sending, event dropped");
                false
            }
            result = self.tx.send(event) => match result {
                Ok(()) => true,
                Err(mpsc::error::SendError(event)) => {
                    tracing::warn!(channel = self.name, %event, "channel closed, event dropped");
                    false
                }
            },
        }
    }

    /// Reserve a slot without committing an event yet.
    ///
    /// Used inside `select!` loops that must keep serving other branches
    /// while the consumer is busy.
    pub(crate) async fn reserve(&self) -> Result<mpsc::Permit<'_, Event>, mpsc::error::SendError<()>> {
        self.tx.reserve().await
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side of a routing channel.
#[derive(Debug)]
pub struct Inbox {
    name: &'static str,
    rx: mpsc::Receiver<Event>,
}

impl Inbox {
    /// Receive the next event, `None` once closed and drained.
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Close the channel and return every event already enqueued.
    ///
    /// Producers blocked in [`Outbox::send`] are released with a failure.
    pub async fn close_and_drain(&mut self) -> Vec<Event> {
        self.rx.close();
        let mut pending = Vec::new();
        while let Some(event) = self.rx.recv().await {
            pending.push(event);
        }
        if !pending.is_empty() {
            tracing::debug!(channel = self.name, count = pending.len(), "drained pending events");
        }
        pending
    }
}
