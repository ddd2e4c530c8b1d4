//! Conversation history for AI replies
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.4.0
//!
//! ## Changelog
//! - 1.0.0: Channel history folded into user/assistant turns

/// How many recent channel messages are read when building history
pub const HISTORY_LIMIT: u8 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub content: String,
}

impl ConversationTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

/// Author of the message a history entry replied to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyTarget {
    Known {
        author_id: String,
        author_name: String,
        webhook: bool,
    },
    /// The referenced message could not be fetched
    Unknown,
}

/// One channel message, reduced to what history building needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryMessage {
    pub author_id: String,
    pub author_name: String,
    pub content: String,
    pub mentions_bot: bool,
    pub reply_to: Option<ReplyTarget>,
}

pub fn system_prompt(bot_name: &str, bot_username: &str, bot_id: &str) -> String {
    format!("You are {bot_name} (Discord username: {bot_username} & discord id: {bot_id})")
}

/// `[Username:alice] [Replying to bob(1234)]: hello`
pub fn format_user_message(message: &HistoryMessage) -> String {
    let reply = match &message.reply_to {
        None => String::new(),
        Some(ReplyTarget::Unknown) => " [Replying to unknown message]".to_string(),
        Some(ReplyTarget::Known {
            author_name,
            webhook: true,
            ..
        }) => format!(" [Replying to {author_name}]"),
        Some(ReplyTarget::Known {
            author_id,
            author_name,
            webhook: false,
        }) => format!(" [Replying to {author_name}({})]", last_chars(author_id, 4)),
    };
    format!("[Username:{}]{}: {}", message.author_name, reply, message.content)
}

fn last_chars(value: &str, count: usize) -> &str {
    let skip = value.chars().count().saturating_sub(count);
    match value.char_indices().nth(skip) {
        Some((index, _)) => &value[index..],
        None => value,
    }
}

/// Fold channel messages into conversation turns, oldest first.
///
/// `newest_first` is the order the platform returns history in. The bot's own
/// messages become assistant turns; messages that mention the bot or reply to
/// it become user turns. Everything else, and anything with empty content, is
/// left out.
pub fn build_history(newest_first: &[HistoryMessage], bot_id: &str) -> Vec<ConversationTurn> {
    let mut turns: Vec<ConversationTurn> = newest_first
        .iter()
        .filter(|m| !m.content.trim().is_empty())
        .filter_map(|m| {
            let replies_to_bot = matches!(
                &m.reply_to,
                Some(ReplyTarget::Known { author_id, .. }) if author_id == bot_id
            );
            if replies_to_bot || m.mentions_bot {
                Some(ConversationTurn::user(format_user_message(m)))
            } else if m.author_id == bot_id {
                Some(ConversationTurn::assistant(m.content.clone()))
            } else {
                None
            }
        })
        .collect();
    turns.reverse();
    turns
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOT: &str = "1343784530921787462";

    fn message(author_id: &str, name: &str, content: &str) -> HistoryMessage {
        HistoryMessage {
            author_id: author_id.to_string(),
            author_name: name.to_string(),
            content: content.to_string(),
            mentions_bot: false,
            reply_to: None,
        }
    }

    #[test]
    fn test_format_plain_message() {
        let m = message("1", "alice", "hi daisy");
        assert_eq!(format_user_message(&m), "[Username:alice]: hi daisy");
    }

    #[test]
    fn test_format_reply_with_id_suffix() {
        let mut m = message("1", "alice", "what?");
        m.reply_to = Some(ReplyTarget::Known {
            author_id: "987654321".into(),
            author_name: "bob".into(),
            webhook: false,
        });
        assert_eq!(
            format_user_message(&m),
            "[Username:alice] [Replying to bob(4321)]: what?"
        );
    }

    #[test]
    fn test_format_reply_to_webhook_and_unknown() {
        let mut m = message("1", "alice", "x");
        m.reply_to = Some(ReplyTarget::Known {
            author_id: "55".into(),
            author_name: "Hook".into(),
            webhook: true,
        });
        assert_eq!(format_user_message(&m), "[Username:alice] [Replying to Hook]: x");

        m.reply_to = Some(ReplyTarget::Unknown);
        assert_eq!(
            format_user_message(&m),
            "[Username:alice] [Replying to unknown message]: x"
        );
    }

    #[test]
    fn test_build_history_roles_and_order() {
        let mut mention = message("1", "alice", "hey <@bot> how are you");
        mention.mentions_bot = true;
        let answer = message(BOT, "Daisy", "I'm great!");
        let chatter = message("2", "bob", "unrelated");
        let mut reply = message("2", "bob", "thanks");
        reply.reply_to = Some(ReplyTarget::Known {
            author_id: BOT.into(),
            author_name: "Daisy".into(),
            webhook: false,
        });

        // newest first, as fetched
        let turns = build_history(&[reply, chatter, answer, mention], BOT);

        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].role, TurnRole::User);
        assert!(turns[0].content.starts_with("[Username:alice]"));
        assert_eq!(turns[1], ConversationTurn::assistant("I'm great!"));
        assert_eq!(turns[2].role, TurnRole::User);
        assert_eq!(turns[2].content, "[Username:bob] [Replying to Daisy(7462)]: thanks");
    }

    #[test]
    fn test_build_history_skips_empty_content() {
        let empty = message(BOT, "Daisy", "   ");
        assert!(build_history(&[empty], BOT).is_empty());
    }

    #[test]
    fn test_system_prompt() {
        assert_eq!(
            system_prompt("Daisy", "Daisy", BOT),
            "You are Daisy (Discord username: Daisy & discord id: 1343784530921787462)"
        );
    }
}
