//! Lifecycle orchestrator — builds, starts and stops the hub.
//!
//! ```text
//! Constructing ─▶ Running ─▶ ShuttingDown ─▶ Terminated
//! ```
//!
//! - **Constructing**: the bus, notifier and intake futures are awaited
//!   together; the first error aborts startup.
//! - **Running**: the bus connects, every subscription is registered, every
//!   command is handed to the notifier worker, the intake starts listening,
//!   then both workers are spawned (the notifier connects inside its task).
//! - **ShuttingDown**: entered on the external signal, on cancellation of
//!   the shutdown token, or when a worker stops on its own. The token is
//!   cancelled and the orchestrator waits for every worker slot.
//! - **Terminated**: nothing is running anymore.
//!
//! The orchestrator is the only owner of the shutdown token's cancellation;
//! workers and producers only observe it.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

use her_domain::command::CommandDefinition;
use her_domain::error::HubError;
use her_domain::subscription::SubscriptionPolicy;

use crate::bus_worker::BusWorker;
use crate::channels::routing_channel;
use crate::notifier_worker::NotifierWorker;
use crate::ports::{BusClient, Intake, Notifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Constructing,
    Running,
    ShuttingDown,
    Terminated,
}

/// What the core needs from the configuration, already validated.
#[derive(Debug, Clone, Default)]
pub struct HubConfig {
    pub subscriptions: Vec<SubscriptionPolicy>,
    pub commands: Vec<CommandDefinition>,
    /// Upper bound for the broker disconnect during shutdown.
    pub disconnect_timeout: Duration,
}

#[derive(Debug)]
pub struct Hub {
    config: HubConfig,
    shutdown: CancellationToken,
    phase: watch::Sender<Phase>,
}

impl Hub {
    #[must_use]
    pub fn new(config: HubConfig) -> Self {
        let (phase, _) = watch::channel(Phase::Constructing);
        Self {
            config,
            shutdown: CancellationToken::new(),
            phase,
        }
    }

    /// Observe phase transitions.
    #[must_use]
    pub fn phases(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    /// Cancelling this token has the same effect as the shutdown signal.
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Run the hub until `signal` completes, then shut it down.
    ///
    /// # Errors
    ///
    /// Returns the first construction, connection, subscription or command
    /// registration error, or the error of a worker that stopped on its own.
    pub async fn run<B, N, I>(
        mut self,
        bus: impl Future<Output = Result<B, HubError>>,
        notifier: impl Future<Output = Result<N, HubError>>,
        intake: impl Future<Output = Result<I, HubError>>,
        signal: impl Future<Output = ()>,
    ) -> Result<(), HubError>
    where
        B: BusClient + 'static,
        N: Notifier + 'static,
        I: Intake,
    {
        let result = self.serve(bus, notifier, intake, signal).await;
        self.shutdown.cancel();
        if let Err(err) = &result {
            tracing::error!(error = %err, "hub stopped with an error");
        }
        self.set_phase(Phase::Terminated);
        result
    }

    async fn serve<B, N, I>(
        &mut self,
        bus: impl Future<Output = Result<B, HubError>>,
        notifier: impl Future<Output = Result<N, HubError>>,
        intake: impl Future<Output = Result<I, HubError>>,
        signal: impl Future<Output = ()>,
    ) -> Result<(), HubError>
    where
        B: BusClient + 'static,
        N: Notifier + 'static,
        I: Intake,
    {
        self.set_phase(Phase::Constructing);
        let (bus, notifier, intake) = tokio::try_join!(bus, notifier, intake)?;
        tracing::info!(notifier = notifier.name(), intake = intake.name(), "adapters constructed");

        let config = std::mem::take(&mut self.config);
        let (to_bus, bus_inbox) = routing_channel("to-bus", &self.shutdown);
        let (to_notifier, notifier_inbox) = routing_channel("to-notifier", &self.shutdown);

        let mut bus_worker = BusWorker::new(
            bus,
            bus_inbox,
            to_notifier,
            self.shutdown.clone(),
            config.disconnect_timeout,
        );
        let mut notifier_worker = NotifierWorker::new(
            notifier,
            notifier_inbox,
            to_bus.clone(),
            self.shutdown.clone(),
        );

        bus_worker.connect().await?;
        for policy in config.subscriptions {
            bus_worker.subscribe(policy).await?;
        }
        for command in config.commands {
            notifier_worker.register_command(command)?;
        }
        let intake_handle = intake.start(to_bus, self.shutdown.clone()).await?;

        let mut workers = JoinSet::new();
        workers.spawn(bus_worker.run());
        workers.spawn(notifier_worker.run());
        self.set_phase(Phase::Running);

        let mut failure = None;
        tokio::select! {
            () = signal => tracing::info!("shutdown signal received"),
            () = self.shutdown.cancelled() => tracing::info!("shutdown requested"),
            Some(joined) = workers.join_next() => {
                tracing::warn!("worker stopped before shutdown");
                failure = worker_failure(joined);
            }
        }

        self.set_phase(Phase::ShuttingDown);
        self.shutdown.cancel();

        while let Some(joined) = workers.join_next().await {
            if let Some(err) = worker_failure(joined) {
                if failure.is_some() {
                    tracing::error!(error = %err, "worker failed during shutdown");
                } else {
                    failure = Some(err);
                }
            }
        }
        if let Err(err) = intake_handle.await {
            tracing::error!(error = %err, "intake task failed");
        }

        failure.map_or(Ok(()), Err)
    }

    fn set_phase(&self, phase: Phase) {
        tracing::info!(?phase, "hub phase");
        self.phase.send_replace(phase);
    }
}

fn worker_failure(joined: Result<Result<(), HubError>, JoinError>) -> Option<HubError> {
    match joined {
        Ok(Ok(())) => None,
        Ok(Err(err)) => Some(err),
        Err(err) => Some(HubError::transport(err)),
    }
}
