//! Minimal Telegram Bot API client: `getMe`, `sendMessage`, `getUpdates`.
//!
//! Every method is called as `POST {api_url}/bot{token}/{method}` with a
//! JSON body, and every answer is wrapped in the `{ ok, result }` envelope.

use std::time::Duration;

use reqwest::Client;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};

use crate::error::TelegramError;

/// Timeout for calls that are not long polls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Extra time granted to a long poll beyond its server-side timeout.
const POLL_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i64>,
}

impl<T> Envelope<T> {
    fn into_result(self) -> Result<T, TelegramError> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(TelegramError::Api {
                code: self.error_code,
                description: self.description.unwrap_or_default(),
            }),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: String,
}

impl User {
    /// `@username` when set, the first name otherwise.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.first_name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageEntity {
    #[serde(rename = "type")]
    pub kind: String,
    pub offset: usize,
    pub length: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
    #[serde(default)]
    pub entities: Vec<MessageEntity>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

#[derive(Serialize)]
struct GetUpdates {
    offset: i64,
    timeout: u64,
    allowed_updates: &'static [&'static str],
}

/// Bot API client. Cheap to clone: the HTTP connection pool is shared.
#[derive(Clone)]
pub struct BotApi {
    http: Client,
    endpoint: String,
}

impl std::fmt::Debug for BotApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotApi").finish_non_exhaustive()
    }
}

impl BotApi {
    /// # Errors
    ///
    /// Returns [`TelegramError::Http`] if the HTTP client cannot be built.
    pub fn new(api_url: &str, token: &str) -> Result<Self, TelegramError> {
        let http = Client::builder()
            .connect_timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(TelegramError::Http)?;
        Ok(Self {
            http,
            endpoint: format!("{}/bot{token}", api_url.trim_end_matches('/')),
        })
    }

    async fn call<B, T>(&self, method: &str, body: &B, timeout: Duration) -> Result<T, TelegramError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        // Errors carry the request URL, which contains the token.
        let response = self
            .http
            .post(format!("{}/{method}", self.endpoint))
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|err| TelegramError::Http(err.without_url()))?;
        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|err| TelegramError::Http(err.without_url()))?;
        envelope.into_result()
    }

    /// Check the token and return the bot account.
    ///
    /// # Errors
    ///
    /// Fails on transport errors or when the token is rejected.
    pub async fn get_me(&self) -> Result<User, TelegramError> {
        self.call("getMe", &serde_json::json!({}), REQUEST_TIMEOUT)
            .await
    }

    /// # Errors
    ///
    /// Fails on transport errors or when the API refuses the message.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TelegramError> {
        let _: IgnoredAny = self
            .call("sendMessage", &SendMessage { chat_id, text }, REQUEST_TIMEOUT)
            .await?;
        Ok(())
    }

    /// Long-poll for message updates starting at `offset`.
    ///
    /// # Errors
    ///
    /// Fails on transport errors or API errors.
    pub async fn get_updates(
        &self,
        offset: i64,
        poll_timeout: Duration,
    ) -> Result<Vec<Update>, TelegramError> {
        let body = GetUpdates {
            offset,
            timeout: poll_timeout.as_secs(),
            allowed_updates: &["message"],
        };
        self.call("getUpdates", &body, poll_timeout + POLL_GRACE)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_unwrap_successful_envelope() {
        let envelope: Envelope<User> = serde_json::from_str(
            r#"{"ok":true,"result":{"id":1,"is_bot":true,"first_name":"Her","username":"her_bot"}}"#,
        )
        .unwrap();
        let user = envelope.into_result().unwrap();
        assert_eq!(user.id, 1);
        assert_eq!(user.display_name(), "her_bot");
    }

    #[test]
    fn should_turn_failed_envelope_into_api_error() {
        let envelope: Envelope<User> =
            serde_json::from_str(r#"{"ok":false,"error_code":401,"description":"Unauthorized"}"#)
                .unwrap();
        let err = envelope.into_result().unwrap_err();
        assert!(matches!(
            err,
            TelegramError::Api { code: Some(401), ref description } if description == "Unauthorized"
        ));
    }

    #[test]
    fn should_decode_command_update() {
        let update: Update = serde_json::from_str(
            r#"{
                "update_id": 10,
                "message": {
                    "message_id": 3,
                    "from": {"id": 5, "first_name": "Ann"},
                    "chat": {"id": 7, "type": "private"},
                    "date": 0,
                    "text": "/on",
                    "entities": [{"type": "bot_command", "offset": 0, "length": 3}]
                }
            }"#,
        )
        .unwrap();
        let message = update.message.unwrap();
        assert_eq!(message.chat.id, 7);
        assert_eq!(message.from.unwrap().display_name(), "Ann");
        assert_eq!(message.entities[0].kind, "bot_command");
    }

    #[test]
    fn should_build_endpoint_without_double_slash() {
        let api = BotApi::new("http://localhost:8081/", "123:abc").unwrap();
        assert_eq!(api.endpoint, "http://localhost:8081/bot123:abc");
    }
}
