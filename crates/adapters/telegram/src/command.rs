//! Turn Telegram messages into [`UserCommand`]s.

use her_app::ports::UserCommand;

use crate::api::Message;

/// Extract the command of a message starting with a `bot_command` entity.
///
/// `"/on@her_bot now"` gives the command `on` with arguments `now`. Messages
/// that are not commands give `None`.
#[must_use]
pub fn parse_command(message: &Message) -> Option<UserCommand> {
    let text = message.text.as_deref()?;
    let entity = message
        .entities
        .first()
        .filter(|entity| entity.offset == 0 && entity.kind == "bot_command")?;

    let token = text.get(1..entity.length)?;
    let name = token.split_once('@').map_or(token, |(name, _)| name);
    if name.is_empty() {
        return None;
    }
    let arguments = text.get(entity.length..).unwrap_or_default().trim();

    Some(UserCommand {
        name: name.to_string(),
        arguments: arguments.to_string(),
        conversation: message.chat.id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Chat, MessageEntity};

    fn message(text: &str, command_length: Option<usize>) -> Message {
        Message {
            message_id: 1,
            from: None,
            chat: Chat { id: 7 },
            text: Some(text.to_string()),
            entities: command_length
                .map(|length| MessageEntity {
                    kind: "bot_command".to_string(),
                    offset: 0,
                    length,
                })
                .into_iter()
                .collect(),
        }
    }

    #[test]
    fn should_parse_plain_command() {
        let command = parse_command(&message("/help", Some(5))).unwrap();
        assert_eq!(command.name, "help");
        assert_eq!(command.arguments, "");
        assert_eq!(command.conversation, "7");
    }

    #[test]
    fn should_strip_bot_mention_and_keep_arguments() {
        let command = parse_command(&message("/on@her_bot  kitchen ", Some(11))).unwrap();
        assert_eq!(command.name, "on");
        assert_eq!(command.arguments, "kitchen");
    }

    #[test]
    fn should_ignore_plain_text() {
        assert!(parse_command(&message("hello", None)).is_none());
    }

    #[test]
    fn should_ignore_command_not_at_start() {
        let mut msg = message("hey /on", Some(3));
        msg.entities[0].offset = 4;
        assert!(parse_command(&msg).is_none());
    }

    #[test]
    fn should_ignore_bare_slash() {
        assert!(parse_command(&message("/", Some(1))).is_none());
    }
}
