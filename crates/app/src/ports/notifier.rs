//! Notifier port — the human-facing chat surface.
//!
//! The trait keeps the hub independent from any chat platform: the notifier
//! worker only needs to connect, send text, answer a conversation and stop.

use std::future::Future;

use tokio::sync::mpsc;

use her_domain::error::HubError;

/// A command typed by a user in the chat, e.g. `/on` or `/help`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserCommand {
    /// Command name without the leading slash or bot mention.
    pub name: String,
    /// Everything after the command name, trimmed.
    pub arguments: String,
    /// Opaque identifier of the conversation to answer in.
    pub conversation: String,
}

/// A chat platform connection.
pub trait Notifier: Send + Sync {
    /// Short platform name used in logs (e.g. `"telegram"`).
    fn name(&self) -> &'static str;

    /// Authenticate and start receiving user commands.
    ///
    /// Returns the stream of commands typed by users. The stream ends when
    /// the notifier stops.
    fn connect(
        &mut self,
    ) -> impl Future<Output = Result<mpsc::Receiver<UserCommand>, HubError>> + Send;

    /// Send a message to the configured channel.
    fn send_text(&self, body: &str) -> impl Future<Output = Result<(), HubError>> + Send;

    /// Answer in the conversation a command came from.
    fn reply(
        &self,
        conversation: &str,
        body: &str,
    ) -> impl Future<Output = Result<(), HubError>> + Send;

    /// Stop receiving commands and say goodbye.
    fn stop(&mut self) -> impl Future<Output = Result<(), HubError>> + Send;
}
