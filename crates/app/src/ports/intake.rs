//! Intake port — external producers of bus events (voice-assistant webhook).

use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use her_domain::error::HubError;

use crate::channels::Outbox;

/// A listener turning external requests into events on the to-bus channel.
pub trait Intake: Send {
    /// Short name used in logs (e.g. `"webhook"`).
    fn name(&self) -> &'static str;

    /// Start serving in the background.
    ///
    /// Implementations send events through `to_bus` and stop serving once
    /// `shutdown` is cancelled. The returned handle completes when the
    /// listener is fully stopped.
    fn start(
        self,
        to_bus: Outbox,
        shutdown: CancellationToken,
    ) -> impl Future<Output = Result<JoinHandle<()>, HubError>> + Send;
}
