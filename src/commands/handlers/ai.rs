//! AI command handler
//!
//! Handles: ai
//!
//! Questions go through the shared [`AiQueue`](crate::features::AiQueue), the
//! same one that serves mentions and replies to the bot.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Answers come from the bounded request queue
//! - 1.0.0: Direct chat completion call

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use std::sync::Arc;

use crate::commands::command::{Command, CommandBuilder};
use crate::commands::context::CommandContext;
use crate::commands::handler::{CommandHandler, Invocation, Reply};
use crate::features::ai::{format_user_message, system_prompt, ConversationTurn, HistoryMessage, QueueError};

pub fn commands() -> Vec<CommandBuilder> {
    vec![Command::builder("ai", "Talk to an AI.")
        .handler(Ask)
        .alias("ask")
        .cooldown_secs(3)
        .category("utility")
        .example("ai What is the capital of France?")]
}

/// System prompt naming the bot as it is currently logged in
pub fn prompt_for(ctx: &CommandContext) -> String {
    match ctx.bot_user() {
        Some(bot) => system_prompt(&ctx.config.bot_name, &bot.username, &bot.id),
        None => system_prompt(&ctx.config.bot_name, &ctx.config.bot_name, "unknown"),
    }
}

pub struct Ask;

#[async_trait]
impl CommandHandler for Ask {
    async fn execute(&self, ctx: Arc<CommandContext>, inv: &Invocation, args: &[String]) -> Result<()> {
        if args.is_empty() {
            return inv
                .reply(Reply::text("Please provide a question for the AI."))
                .await;
        }

        let Some(queue) = &ctx.ai else {
            return inv
                .reply(Reply::error(QueueError::Closed.user_message()))
                .await;
        };

        let question = HistoryMessage {
            author_id: inv.caller.id.clone(),
            author_name: inv.caller.name.clone(),
            content: args.join(" "),
            mentions_bot: true,
            reply_to: None,
        };
        let turns = vec![
            ConversationTurn::system(prompt_for(&ctx)),
            ConversationTurn::user(format_user_message(&question)),
        ];

        match queue
            .submit(&inv.caller.id, turns, Arc::clone(&inv.responder))
            .await
        {
            Ok(answer) => inv.reply(Reply::text(answer)).await,
            Err(e) => {
                debug!("AI request from {} not answered: {e}", inv.caller.id);
                inv.reply(Reply::error(e.user_message())).await
            }
        }
    }
}
