//! Notifier worker — receive loop of the chat side of the hub.
//!
//! Selects between routed events coming from the bus worker, commands typed
//! by users, and the shutdown token. Publications triggered by commands are
//! queued locally and flushed only when the to-bus channel has room, so the
//! worker keeps draining the to-notifier channel even while the bus worker
//! is itself blocked sending to us.
//!
//! The feedback of a command is only sent once its publication sits in the
//! to-bus channel. From there the bus worker publishes it, even if shutdown
//! starts right after, so a user is never told about a publication that is
//! later dropped.

use std::collections::VecDeque;

use tokio_util::sync::CancellationToken;

use her_domain::command::CommandDefinition;
use her_domain::error::HubError;
use her_domain::event::{Event, STATUS_COMMAND};

use crate::channels::{Inbox, Outbox};
use crate::dispatcher::{CommandDispatcher, HELP_COMMAND, UNKNOWN_COMMAND_REPLY};
use crate::ports::{Notifier, UserCommand};

/// A command publication waiting for room on the to-bus channel.
#[derive(Debug)]
struct Publication {
    event: Event,
    command: UserCommand,
    /// Sent back once the event is handed over; empty sends nothing.
    feedback: String,
}

pub struct NotifierWorker<N> {
    notifier: N,
    dispatcher: CommandDispatcher,
    inbox: Inbox,
    to_bus: Outbox,
    shutdown: CancellationToken,
}

impl<N: Notifier> NotifierWorker<N> {
    /// `inbox` is the consuming end of the to-notifier channel, `to_bus` the
    /// producing end of the to-bus channel.
    pub fn new(notifier: N, inbox: Inbox, to_bus: Outbox, shutdown: CancellationToken) -> Self {
        Self {
            notifier,
            dispatcher: CommandDispatcher::new(),
            inbox,
            to_bus,
            shutdown,
        }
    }

    /// Register a user command. Must happen before [`run`](Self::run).
    ///
    /// # Errors
    ///
    /// See [`CommandDispatcher::add_command`].
    pub fn register_command(&mut self, definition: CommandDefinition) -> Result<(), HubError> {
        self.dispatcher.add_command(definition)
    }

    /// Connect the notifier and serve until shutdown.
    ///
    /// # Errors
    ///
    /// Returns the notifier's error if it cannot connect or fails to stop
    /// cleanly. Send failures while running are only logged.
    pub async fn run(mut self) -> Result<(), HubError> {
        let mut commands = self.notifier.connect().await?;
        tracing::info!(notifier = self.notifier.name(), commands = self.dispatcher.len(), "notifier connected");

        let mut commands_open = true;
        let mut pending: VecDeque<Publication> = VecDeque::new();
        loop {
            tokio::select! {
                biased;
                () = self.shutdown.cancelled() => break,
                routed = self.inbox.recv() => match routed {
                    Some(event) => self.deliver(&event).await,
                    None => {
                        tracing::warn!("to-notifier channel closed unexpectedly");
                        break;
                    }
                },
                command = commands.recv(), if commands_open => match command {
                    Some(command) => {
                        if let Some(publication) = self.handle_command(command).await {
                            pending.push_back(publication);
                        }
                    }
                    None => {
                        tracing::warn!(notifier = self.notifier.name(), "command stream ended");
                        commands_open = false;
                    }
                },
                permit = self.to_bus.reserve(), if !pending.is_empty() => match permit {
                    Ok(permit) => {
                        if let Some(publication) = pending.pop_front() {
                            permit.send(publication.event);
                            if !publication.feedback.is_empty() {
                                self.answer(&publication.command, &publication.feedback).await;
                            }
                        }
                    }
                    Err(_) => {
                        tracing::warn!(count = pending.len(), "to-bus channel closed, publications dropped");
                        pending.clear();
                    }
                },
            }
        }
        self.stop(pending).await
    }

    /// Render a routed event and post it to the channel.
    async fn deliver(&self, event: &Event) {
        let Some(text) = event.render() else {
            tracing::debug!(topic = %event.topic(), "nothing to render, skipped");
            return;
        };
        if let Err(err) = self.notifier.send_text(&text).await {
            tracing::error!(notifier = self.notifier.name(), error = %err, "failed to send message");
        }
    }

    async fn answer(&self, command: &UserCommand, body: &str) {
        if let Err(err) = self.notifier.reply(&command.conversation, body).await {
            tracing::error!(command = %command.name, error = %err, "failed to reply");
        }
    }

    /// Resolve a user command. Help and unknown commands are answered right
    /// away; everything else gives a publication to queue.
    async fn handle_command(&self, command: UserCommand) -> Option<Publication> {
        tracing::info!(command = %command.name, arguments = %command.arguments, "user command");

        if command.name == HELP_COMMAND {
            self.answer(&command, &self.dispatcher.help_text()).await;
            return None;
        }

        match self.dispatcher.resolve_command(&command.name) {
            Ok((event, feedback)) => Some(Publication {
                event,
                command,
                feedback,
            }),
            Err(_) if command.name == STATUS_COMMAND => Some(Publication {
                event: Event::control(STATUS_COMMAND),
                command,
                feedback: String::new(),
            }),
            Err(err) => {
                tracing::warn!(error = %err, "unknown user command");
                self.answer(&command, UNKNOWN_COMMAND_REPLY).await;
                None
            }
        }
    }

    async fn stop(mut self, pending: VecDeque<Publication>) -> Result<(), HubError> {
        tracing::info!(notifier = self.notifier.name(), "stopping notifier");

        for event in self.inbox.close_and_drain().await {
            self.deliver(&event).await;
        }
        if !pending.is_empty() {
            tracing::warn!(count = pending.len(), "shutting down, unacknowledged command publications dropped");
        }

        self.notifier.stop().await
    }
}
