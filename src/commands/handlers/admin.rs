//! Administration command handlers
//!
//! Handles: prefix, selfprefix, say
//!
//! Prefix changes are written to the store before the cache that dispatch
//! reads.
//!
//! - **Version**: 2.0.1
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.1: Say requires Administrator
//! - 2.0.0: Guild and self prefixes with store write-through, say
//! - 1.0.0: Initial admin commands

use anyhow::Result;
use async_trait::async_trait;
use log::{info, warn};
use serenity::model::Permissions;
use std::sync::Arc;

use crate::commands::command::{Command, CommandBuilder};
use crate::commands::context::CommandContext;
use crate::commands::dispatch::GUILD_ONLY_MESSAGE;
use crate::commands::handler::{CommandHandler, Invocation, Reply};
use crate::core::Embed;
use crate::features::prefixes::{validate_prefix, PrefixError, MAX_PREFIX_LEN};

pub fn commands() -> Vec<CommandBuilder> {
    vec![
        Command::builder("prefix", "Show or change the prefix for this server.")
            .handler(GuildPrefix)
            .alias("gp")
            .caller_permissions(Permissions::ADMINISTRATOR)
            .category("admin")
            .example("prefix\nprefix set !\nprefix remove")
            .sub(Command::builder("set", "Set the prefix for this server.").handler(SetGuildPrefix))
            .sub(Command::builder("remove", "Remove the prefix for this server.").handler(RemoveGuildPrefix)),
        Command::builder("selfprefix", "Show or change your personal prefix.")
            .handler(SelfPrefix)
            .alias("sp")
            .category("admin")
            .example("selfprefix\nselfprefix set ?\nselfprefix remove")
            .sub(Command::builder("set", "Set your personal prefix.").handler(SetSelfPrefix))
            .sub(Command::builder("remove", "Remove your personal prefix.").handler(RemoveSelfPrefix)),
        Command::builder("say", "Make the bot say something.")
            .handler(Say)
            .aliases(&["speak", "echo"])
            .caller_permissions(Permissions::ADMINISTRATOR)
            .bot_permissions(Permissions::SEND_MESSAGES)
            .category("admin")
            .example("say Hello everyone!"),
    ]
}

fn too_long(whose: &str) -> String {
    format!("{whose} must not be longer than {MAX_PREFIX_LEN} characters.")
}

/// Validate the first argument, replying with the reason when it is unusable
async fn requested_prefix(inv: &Invocation, args: &[String], whose: &str) -> Result<Option<String>> {
    let raw = args.first().map(String::as_str).unwrap_or_default();
    match validate_prefix(raw) {
        Ok(prefix) => Ok(Some(prefix)),
        Err(PrefixError::Empty) => {
            inv.reply(Reply::error("Please provide a prefix to set.")).await?;
            Ok(None)
        }
        Err(PrefixError::TooLong) => {
            inv.reply(Reply::error(too_long(whose))).await?;
            Ok(None)
        }
        Err(e) => {
            inv.reply(Reply::error(e.to_string())).await?;
            Ok(None)
        }
    }
}

async fn guild_id(inv: &Invocation) -> Result<Option<String>> {
    match &inv.guild_id {
        Some(id) => Ok(Some(id.clone())),
        None => {
            inv.reply(Reply::error(GUILD_ONLY_MESSAGE)).await?;
            Ok(None)
        }
    }
}

pub struct GuildPrefix;

#[async_trait]
impl CommandHandler for GuildPrefix {
    async fn execute(&self, ctx: Arc<CommandContext>, inv: &Invocation, _args: &[String]) -> Result<()> {
        let Some(guild_id) = guild_id(inv).await? else {
            return Ok(());
        };

        let reply = match ctx.prefixes.guild_prefix(&guild_id) {
            Some(prefix) => Reply::info(format!("The prefix for this server is **`{prefix}`**.")),
            None => Reply::embed(Embed::error("This server does not have a custom prefix set.")),
        };
        inv.reply(reply).await
    }
}

pub struct SetGuildPrefix;

#[async_trait]
impl CommandHandler for SetGuildPrefix {
    async fn execute(&self, ctx: Arc<CommandContext>, inv: &Invocation, args: &[String]) -> Result<()> {
        let Some(guild_id) = guild_id(inv).await? else {
            return Ok(());
        };
        let Some(prefix) = requested_prefix(inv, args, "The prefix").await? else {
            return Ok(());
        };

        ctx.store.set_guild_prefix(&guild_id, Some(&prefix)).await?;
        ctx.prefixes.set_guild_prefix(&guild_id, Some(&prefix));
        info!("Guild {guild_id} prefix set to {prefix:?} by {}", inv.caller.id);

        inv.reply(Reply::info(format!(
            "The prefix for this server has been set to `{prefix}`."
        )))
        .await
    }
}

pub struct RemoveGuildPrefix;

#[async_trait]
impl CommandHandler for RemoveGuildPrefix {
    async fn execute(&self, ctx: Arc<CommandContext>, inv: &Invocation, _args: &[String]) -> Result<()> {
        let Some(guild_id) = guild_id(inv).await? else {
            return Ok(());
        };

        ctx.store.set_guild_prefix(&guild_id, None).await?;
        ctx.prefixes.set_guild_prefix(&guild_id, None);
        info!("Guild {guild_id} prefix removed by {}", inv.caller.id);

        inv.reply(Reply::info("The prefix for this server has been removed."))
            .await
    }
}

pub struct SelfPrefix;

#[async_trait]
impl CommandHandler for SelfPrefix {
    async fn execute(&self, ctx: Arc<CommandContext>, inv: &Invocation, _args: &[String]) -> Result<()> {
        let reply = match ctx.prefixes.user_prefix(&inv.caller.id) {
            Some(prefix) => Reply::info(format!("Your self prefix is **`{prefix}`**.")),
            None => Reply::embed(Embed::error("You do not have a self prefix set.")),
        };
        inv.reply(reply).await
    }
}

pub struct SetSelfPrefix;

#[async_trait]
impl CommandHandler for SetSelfPrefix {
    async fn execute(&self, ctx: Arc<CommandContext>, inv: &Invocation, args: &[String]) -> Result<()> {
        let Some(prefix) = requested_prefix(inv, args, "Your prefix").await? else {
            return Ok(());
        };

        ctx.store.set_user_prefix(&inv.caller.id, Some(&prefix)).await?;
        ctx.prefixes.set_user_prefix(&inv.caller.id, Some(&prefix));

        inv.reply(Reply::info(format!("Your prefix has been set to `{prefix}`.")))
            .await
    }
}

pub struct RemoveSelfPrefix;

#[async_trait]
impl CommandHandler for RemoveSelfPrefix {
    async fn execute(&self, ctx: Arc<CommandContext>, inv: &Invocation, _args: &[String]) -> Result<()> {
        ctx.store.set_user_prefix(&inv.caller.id, None).await?;
        ctx.prefixes.set_user_prefix(&inv.caller.id, None);

        inv.reply(Reply::info("Your self prefix has been removed.")).await
    }
}

pub struct Say;

#[async_trait]
impl CommandHandler for Say {
    async fn execute(&self, _ctx: Arc<CommandContext>, inv: &Invocation, args: &[String]) -> Result<()> {
        if args.is_empty() {
            return inv
                .reply(Reply::error("Please provide a message for me to say!"))
                .await;
        }

        if let Err(e) = inv.responder.delete_invocation().await {
            warn!("Could not delete say invocation in {}: {e:?}", inv.channel_id);
        }
        inv.reply(Reply::text(args.join(" ")).detached()).await
    }
}
