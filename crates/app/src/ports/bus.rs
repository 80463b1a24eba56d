//! Bus port — connection to the publish/subscribe broker.

use std::future::Future;
use std::time::Duration;

use her_domain::error::HubError;
use her_domain::event::Event;

/// A broker connection.
///
/// The orchestrator drives implementations in this order:
///
/// 1. [`connect`](Self::connect) — establish the session, fail fast
/// 2. [`subscribe`](Self::subscribe) once per configured topic
/// 3. a loop over [`next_message`](Self::next_message) interleaved with
///    [`publish`](Self::publish), all from a single task
/// 4. [`unsubscribe`](Self::unsubscribe) per topic, then
///    [`disconnect`](Self::disconnect)
///
/// Messages arriving before the loop starts must be kept and returned by
/// the first calls to `next_message`.
pub trait BusClient: Send {
    /// Open the broker session.
    fn connect(&mut self) -> impl Future<Output = Result<(), HubError>> + Send;

    /// Subscribe to a topic and wait for the broker to acknowledge it.
    fn subscribe(&mut self, topic: &str) -> impl Future<Output = Result<(), HubError>> + Send;

    /// Publish an event (retained, at most once).
    fn publish(&mut self, event: &Event) -> impl Future<Output = Result<(), HubError>> + Send;

    fn unsubscribe(&mut self, topic: &str) -> impl Future<Output = Result<(), HubError>> + Send;

    /// Wait for the next inbound message.
    ///
    /// Must be cancel safe: the bus worker races it against other branches
    /// in a `select!` and drops it whenever another branch wins.
    fn next_message(&mut self) -> impl Future<Output = Result<Event, HubError>> + Send;

    /// Close the session, waiting at most `timeout` for in-flight work.
    fn disconnect(&mut self, timeout: Duration) -> impl Future<Output = ()> + Send;
}
