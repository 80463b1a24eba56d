//! [`Notifier`] implementation backed by a Telegram bot.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use her_app::ports::{Notifier, UserCommand};
use her_domain::error::HubError;

use crate::api::{BotApi, Update, User};
use crate::command::parse_command;
use crate::config::TelegramConfig;
use crate::error::TelegramError;

pub const GREETING: &str = "Hi! I've been just started";
pub const FAREWELL: &str = "Bye bye";

/// Pause after a failed `getUpdates` before polling again.
const RETRY_DELAY: Duration = Duration::from_secs(1);

const COMMAND_CAPACITY: usize = 16;

#[derive(Debug)]
struct Poller {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

#[derive(Debug)]
pub struct TelegramNotifier {
    api: BotApi,
    channel_id: i64,
    poll_timeout: Duration,
    poller: Option<Poller>,
}

impl TelegramNotifier {
    /// # Errors
    ///
    /// Returns [`TelegramError::MissingToken`] or
    /// [`TelegramError::MissingChannelId`] for incomplete credentials, or an
    /// HTTP error if the client cannot be built.
    pub fn new(config: &TelegramConfig) -> Result<Self, TelegramError> {
        if config.token.is_empty() {
            return Err(TelegramError::MissingToken);
        }
        if config.channel_id == 0 {
            return Err(TelegramError::MissingChannelId);
        }
        Ok(Self {
            api: BotApi::new(&config.api_url, &config.token)?,
            channel_id: config.channel_id,
            poll_timeout: config.poll_timeout(),
            poller: None,
        })
    }
}

impl Notifier for TelegramNotifier {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn connect(&mut self) -> Result<mpsc::Receiver<UserCommand>, HubError> {
        let me = self.api.get_me().await?;
        tracing::info!(account = %me.display_name(), "authorized on account");

        if let Err(err) = self.api.send_message(self.channel_id, GREETING).await {
            tracing::error!(error = %err, "failed to send greeting");
        }

        let (tx, rx) = mpsc::channel(COMMAND_CAPACITY);
        let token = CancellationToken::new();
        let handle = tokio::spawn(poll_updates(
            self.api.clone(),
            self.poll_timeout,
            tx,
            token.clone(),
        ));
        self.poller = Some(Poller { token, handle });
        Ok(rx)
    }

    async fn send_text(&self, body: &str) -> Result<(), HubError> {
        tracing::info!(message = %body, "sending bot message");
        self.api.send_message(self.channel_id, body).await?;
        Ok(())
    }

    async fn reply(&self, conversation: &str, body: &str) -> Result<(), HubError> {
        let chat_id = conversation
            .parse()
            .map_err(|_| TelegramError::InvalidConversation(conversation.to_string()))?;
        self.api.send_message(chat_id, body).await?;
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), HubError> {
        tracing::info!("stopping telegram bot");
        if let Some(poller) = self.poller.take() {
            poller.token.cancel();
            if let Err(err) = poller.handle.await {
                tracing::error!(error = %err, "update poller failed");
            }
        }
        self.api.send_message(self.channel_id, FAREWELL).await?;
        Ok(())
    }
}

/// Long-poll `getUpdates` and forward commands until cancelled or until
/// nobody listens anymore.
async fn poll_updates(
    api: BotApi,
    poll_timeout: Duration,
    commands: mpsc::Sender<UserCommand>,
    token: CancellationToken,
) {
    let mut offset = 0;
    loop {
        let polled = tokio::select! {
            () = token.cancelled() => break,
            polled = api.get_updates(offset, poll_timeout) => polled,
        };
        let updates = match polled {
            Ok(updates) => updates,
            Err(err) => {
                tracing::warn!(error = %err, "getUpdates failed");
                tokio::select! {
                    () = token.cancelled() => break,
                    () = tokio::time::sleep(RETRY_DELAY) => continue,
                }
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            let Some(command) = command_of(&update) else {
                continue;
            };
            tokio::select! {
                () = token.cancelled() => return,
                sent = commands.send(command) => if sent.is_err() {
                    tracing::debug!("command receiver dropped, poller exits");
                    return;
                },
            }
        }
    }
    tracing::debug!("update poller stopped");
}

fn command_of(update: &Update) -> Option<UserCommand> {
    let message = update.message.as_ref()?;
    let user = message
        .from
        .as_ref()
        .map_or("unknown", User::display_name);
    tracing::info!(%user, text = message.text.as_deref().unwrap_or_default(), "message received");
    parse_command(message)
}
