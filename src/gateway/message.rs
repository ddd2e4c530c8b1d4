//! Message events: prefixed commands and AI conversations
//!
//! - **Version**: 1.0.1
//! - **Since**: 0.3.0
//!
//! ## Changelog
//! - 1.0.1: A bare mention is not a question
//! - 1.0.0: Prefix dispatch, mention and reply triggered AI answers

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, error, warn};
use serenity::builder::{CreateMessage, GetMessages};
use serenity::http::Http;
use serenity::model::channel::Message;
use serenity::model::id::{ChannelId, MessageId, UserId};
use serenity::prelude::Context;
use std::sync::Arc;
use uuid::Uuid;

use super::directory::SerenityUsers;
use super::guilds::SerenityGuilds;
use super::components::add_link_buttons;
use super::permissions::ChannelPermissions;
use crate::commands::handlers::ai::prompt_for;
use crate::commands::{dispatch, Caller, CommandContext, Invocation, LinkButton, Reply, Responder};
use crate::core::{chunk_for_message, Embed};
use crate::features::ai::{build_history, ConversationTurn, HistoryMessage, ReplyTarget, HISTORY_LIMIT};

/// Replies to a message in its channel
pub struct MessageResponder {
    http: Arc<Http>,
    channel_id: ChannelId,
    message_id: MessageId,
}

impl MessageResponder {
    pub fn new(http: Arc<Http>, msg: &Message) -> Self {
        Self {
            http,
            channel_id: msg.channel_id,
            message_id: msg.id,
        }
    }
}

fn build_message<'a, 'b>(
    m: &'b mut CreateMessage<'a>,
    content: Option<&str>,
    embeds: &[Embed],
    links: &[LinkButton],
) -> &'b mut CreateMessage<'a> {
    if let Some(content) = content {
        m.content(content);
    }
    for embed in embeds {
        m.add_embed(|e| embed.apply_to(e));
    }
    if !links.is_empty() {
        m.components(|c| c.create_action_row(|row| add_link_buttons(row, links)));
    }
    m
}

#[async_trait]
impl Responder for MessageResponder {
    async fn reply(&self, reply: Reply) -> Result<()> {
        let chunks = match &reply.content {
            Some(content) => chunk_for_message(content),
            None => Vec::new(),
        };

        // first message carries the reference, the embeds and the links
        let first_content = chunks.first().map(String::as_str);
        let reference = (self.channel_id, self.message_id);
        let sent = self
            .channel_id
            .send_message(&self.http, |m| {
                build_message(m, first_content, &reply.embeds, &reply.links);
                if !reply.detached {
                    m.reference_message(reference);
                    m.allowed_mentions(|am| am.replied_user(false));
                }
                m
            })
            .await?;

        let mut sent_ids = vec![sent.id];
        for chunk in chunks.iter().skip(1) {
            let extra = self.channel_id.say(&self.http, chunk).await?;
            sent_ids.push(extra.id);
        }

        if let Some(after) = reply.delete_after {
            let http = Arc::clone(&self.http);
            let channel_id = self.channel_id;
            tokio::spawn(async move {
                tokio::time::sleep(after).await;
                for id in sent_ids {
                    if let Err(e) = channel_id.delete_message(&http, id).await {
                        debug!("Could not delete expired reply {id}: {e}");
                    }
                }
            });
        }
        Ok(())
    }

    async fn typing(&self) -> Result<()> {
        self.channel_id.broadcast_typing(&self.http).await?;
        Ok(())
    }

    async fn delete_invocation(&self) -> Result<()> {
        self.channel_id
            .delete_message(&self.http, self.message_id)
            .await?;
        Ok(())
    }
}

pub fn message_time(msg: &Message) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&msg.timestamp.to_string())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn invocation_for(ctx: &Context, msg: &Message, prefix: String) -> Invocation {
    let responder = Arc::new(MessageResponder::new(Arc::clone(&ctx.http), msg));
    Invocation {
        caller: Caller {
            id: msg.author.id.to_string(),
            name: msg.author.name.clone(),
            bot: msg.author.bot,
        },
        guild_id: msg.guild_id.map(|id| id.to_string()),
        channel_id: msg.channel_id.to_string(),
        prefix,
        sent_at: message_time(msg),
        responder,
        permissions: Arc::new(ChannelPermissions::new(
            Arc::clone(&ctx.cache),
            msg.guild_id,
            msg.channel_id,
            msg.author.id,
        )),
        users: Arc::new(SerenityUsers::new(Arc::clone(&ctx.cache), Arc::clone(&ctx.http))),
        guilds: Arc::new(SerenityGuilds::new(Arc::clone(&ctx.cache), Arc::clone(&ctx.http))),
    }
}

/// Route one incoming message
pub async fn handle_message(state: &Arc<CommandContext>, ctx: &Context, msg: &Message) {
    if msg.author.bot {
        return;
    }

    let user_id = msg.author.id.to_string();
    let guild_id = msg.guild_id.map(|id| id.to_string());

    if let Some(prefix) = state
        .prefixes
        .resolve(&msg.content, &user_id, guild_id.as_deref())
    {
        let invocation = invocation_for(ctx, msg, prefix);
        let outcome = dispatch(state, &invocation, &msg.content).await;
        debug!("Message {} dispatched: {outcome:?}", msg.id);
        return;
    }

    let Some(bot) = state.bot_user() else {
        return;
    };
    let Ok(bot_id) = bot.id.parse::<u64>() else {
        return;
    };
    if state.ai.is_none() || state.blacklist.is_blacklisted(&user_id) {
        return;
    }
    if !is_ai_trigger(msg, UserId(bot_id)) {
        return;
    }

    if let Err(e) = answer_with_ai(state, ctx, msg, &bot.id).await {
        error!("AI reply to message {} failed: {e:?}", msg.id);
    }
}

/// The message asks the bot something after mentioning it, or replies to one of its messages
pub fn is_ai_trigger(msg: &Message, bot_id: UserId) -> bool {
    if mentioned_question(&msg.content, bot_id).is_some() {
        return true;
    }
    msg.referenced_message
        .as_ref()
        .is_some_and(|referenced| referenced.author.id == bot_id)
}

/// Text following a leading mention of the bot, `None` when there is no mention or nothing after it
pub fn mentioned_question(content: &str, bot_id: UserId) -> Option<&str> {
    let content = content.trim_start();
    [format!("<@{bot_id}>"), format!("<@!{bot_id}>")]
        .iter()
        .find_map(|mention| content.strip_prefix(mention.as_str()))
        .map(str::trim)
        .filter(|question| !question.is_empty())
}

pub fn to_history_message(msg: &Message, bot_id: UserId) -> HistoryMessage {
    let reply_to = match (&msg.referenced_message, &msg.message_reference) {
        (Some(referenced), _) => Some(ReplyTarget::Known {
            author_id: referenced.author.id.to_string(),
            author_name: referenced.author.name.clone(),
            webhook: referenced.webhook_id.is_some(),
        }),
        (None, Some(_)) => Some(ReplyTarget::Unknown),
        (None, None) => None,
    };
    HistoryMessage {
        author_id: msg.author.id.to_string(),
        author_name: msg.author.name.clone(),
        content: msg.content.clone(),
        mentions_bot: msg.mentions.iter().any(|u| u.id == bot_id),
        reply_to,
    }
}

async fn answer_with_ai(
    state: &Arc<CommandContext>,
    ctx: &Context,
    msg: &Message,
    bot_id: &str,
) -> Result<()> {
    let Some(queue) = &state.ai else {
        return Ok(());
    };
    let request_id = Uuid::new_v4();
    let bot_user_id = UserId(bot_id.parse()?);

    let recent = msg
        .channel_id
        .messages(&ctx.http, |builder: &mut GetMessages| {
            builder.limit(u64::from(HISTORY_LIMIT))
        })
        .await?;
    debug!("[{request_id}] Retrieved {} messages of history", recent.len());

    let mut newest_first: Vec<HistoryMessage> = recent
        .iter()
        .map(|m| to_history_message(m, bot_user_id))
        .collect();
    if !recent.iter().any(|m| m.id == msg.id) {
        newest_first.insert(0, to_history_message(msg, bot_user_id));
    }

    let mut turns = vec![ConversationTurn::system(prompt_for(state))];
    turns.extend(build_history(&newest_first, bot_id));

    let responder: Arc<dyn Responder> = Arc::new(MessageResponder::new(Arc::clone(&ctx.http), msg));
    let reply = match queue
        .submit(&msg.author.id.to_string(), turns, Arc::clone(&responder))
        .await
    {
        Ok(answer) => Reply::text(answer),
        Err(e) => {
            warn!("[{request_id}] AI request from {} refused: {e}", msg.author.id);
            Reply::error(e.user_message())
        }
    };
    responder.reply(reply).await
}
