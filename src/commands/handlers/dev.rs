//! Owner-only command handlers
//!
//! Handles: blacklist, status, logdebug
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.4.0
//!
//! ## Changelog
//! - 1.1.0: Runtime debug logging toggle
//! - 1.0.0: Blacklist and status management

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use log::info;
use std::sync::Arc;

use crate::commands::command::{Command, CommandBuilder};
use crate::commands::context::CommandContext;
use crate::commands::handler::{CommandHandler, Invocation, Reply};
use crate::core::Embed;
use crate::features::presence::NewStatus;
use crate::features::targets::resolve_user_id;

pub fn commands() -> Vec<CommandBuilder> {
    vec![
        Command::builder("blacklist", "Manage the blacklist for users.")
            .handler(BlacklistHelp)
            .alias("bl")
            .dev_only()
            .category("dev")
            .example("blacklist add @someone\nblacklist remove 123456789012345678")
            .sub(
                Command::builder("add", "Add a user to the blacklist.")
                    .handler(BlacklistAdd)
                    .dev_only(),
            )
            .sub(
                Command::builder("remove", "Remove a user from the blacklist.")
                    .handler(BlacklistRemove)
                    .dev_only(),
            ),
        Command::builder("status", "Manage the bot's statuses.")
            .alias("st")
            .dev_only()
            .category("dev")
            .example(
                "status list - View all statuses with IDs\n\
                 status add Playing with {guilds.size} servers - Add a new status\n\
                 status remove 3 - Remove status with ID 3\n\
                 status update - Update bot status immediately",
            )
            .sub(
                Command::builder("add", "Add a new status.")
                    .handler(StatusAdd)
                    .dev_only(),
            )
            .sub(
                Command::builder("remove", "Remove a status by ID.")
                    .handler(StatusRemove)
                    .dev_only(),
            )
            .sub(
                Command::builder("list", "List all statuses.")
                    .handler(StatusList)
                    .dev_only(),
            )
            .sub(
                Command::builder("update", "Apply a random status now.")
                    .handler(StatusUpdate)
                    .dev_only(),
            ),
        Command::builder("logdebug", "Toggle debug logging.")
            .handler(LogDebug)
            .dev_only()
            .category("dev"),
    ]
}

pub struct LogDebug;

#[async_trait]
impl CommandHandler for LogDebug {
    async fn execute(&self, ctx: Arc<CommandContext>, inv: &Invocation, _args: &[String]) -> Result<()> {
        let enabled = ctx.debug.toggle();
        let state = if enabled { "enabled" } else { "disabled" };
        info!("Debug logging {state} by {}", inv.caller.id);
        inv.reply(Reply::info(format!("Debug mode has been {state}."))).await
    }
}

pub struct BlacklistHelp;

#[async_trait]
impl CommandHandler for BlacklistHelp {
    async fn execute(&self, _ctx: Arc<CommandContext>, inv: &Invocation, _args: &[String]) -> Result<()> {
        inv.reply(Reply::info("Please specify a subcommand: `add` or `remove`."))
            .await
    }
}

pub struct BlacklistAdd;

#[async_trait]
impl CommandHandler for BlacklistAdd {
    async fn execute(&self, ctx: Arc<CommandContext>, inv: &Invocation, args: &[String]) -> Result<()> {
        let members = match &inv.guild_id {
            Some(guild_id) => Some(inv.users.guild_members(guild_id).await),
            None => None,
        };
        let user_id = args
            .first()
            .and_then(|token| resolve_user_id(token, members.as_deref()));

        let Some(user_id) = user_id else {
            return inv.reply(Reply::info("Could not find this user")).await;
        };
        if ctx.is_owner(&user_id) {
            return inv
                .reply(Reply::error("The bot owner cannot be blacklisted."))
                .await;
        }
        if ctx.blacklist.is_blacklisted(&user_id) {
            return inv
                .reply(Reply::info(format!("User <@{user_id}> is already blacklisted.")))
                .await;
        }

        let now = Utc::now();
        ctx.store.set_blacklisted(&user_id, Some(now)).await?;
        ctx.blacklist.add(&user_id, now);
        info!("User {user_id} blacklisted by {}", inv.caller.id);

        inv.reply(Reply::info(format!("User <@{user_id}> has been blacklisted.")))
            .await
    }
}

pub struct BlacklistRemove;

#[async_trait]
impl CommandHandler for BlacklistRemove {
    async fn execute(&self, ctx: Arc<CommandContext>, inv: &Invocation, args: &[String]) -> Result<()> {
        let Some(user_id) = args.first().and_then(|token| resolve_user_id(token, None)) else {
            return inv.reply(Reply::info("Please provide a user ID.")).await;
        };

        ctx.store.set_blacklisted(&user_id, None).await?;
        ctx.blacklist.remove(&user_id);
        info!("User {user_id} removed from the blacklist by {}", inv.caller.id);

        inv.reply(Reply::info(format!(
            "User <@{user_id}> has been removed from the blacklist."
        )))
        .await
    }
}

pub struct StatusAdd;

#[async_trait]
impl CommandHandler for StatusAdd {
    async fn execute(&self, ctx: Arc<CommandContext>, inv: &Invocation, args: &[String]) -> Result<()> {
        let status = match NewStatus::from_args(args) {
            Ok(status) => status,
            Err(e) => return inv.reply(Reply::error(e.to_string())).await,
        };

        let entry = ctx.store.add_status(&status).await?;
        info!("Status {} added: {} {:?}", entry.id, entry.kind, entry.text);

        inv.reply(Reply::info(format!(
            "Added new {} status: \"{}\"",
            entry.kind, entry.text
        )))
        .await
    }
}

pub struct StatusRemove;

#[async_trait]
impl CommandHandler for StatusRemove {
    async fn execute(&self, ctx: Arc<CommandContext>, inv: &Invocation, args: &[String]) -> Result<()> {
        let Some(raw) = args.first() else {
            return inv
                .reply(Reply::error("Please provide a status ID to remove."))
                .await;
        };
        let Ok(id) = raw.parse::<i64>() else {
            return inv
                .reply(Reply::error("Please provide a valid numeric ID."))
                .await;
        };

        let reply = match ctx.store.remove_status(id).await? {
            Some(removed) => Reply::info(format!(
                "Removed status: \"{}\" ({})",
                removed.text, removed.kind
            )),
            None => Reply::error(format!("Status with ID {id} not found.")),
        };
        inv.reply(reply).await
    }
}

pub struct StatusList;

#[async_trait]
impl CommandHandler for StatusList {
    async fn execute(&self, ctx: Arc<CommandContext>, inv: &Invocation, _args: &[String]) -> Result<()> {
        let statuses = ctx.store.list_statuses().await?;
        if statuses.is_empty() {
            return inv
                .reply(Reply::info("There are currently no statuses set for the bot."))
                .await;
        }

        let mut embed = Embed::new(crate::core::colors::SUNSHINE_YELLOW).title("Bot Statuses");
        for status in &statuses {
            let mut value = status.text.clone();
            if let Some(url) = &status.url {
                value.push_str(&format!("\nURL: {url}"));
            }
            embed = embed.field(format!("ID: {} ({})", status.id, status.kind), value, false);
        }
        inv.reply(Reply::embed(embed)).await
    }
}

pub struct StatusUpdate;

#[async_trait]
impl CommandHandler for StatusUpdate {
    async fn execute(&self, ctx: Arc<CommandContext>, inv: &Invocation, _args: &[String]) -> Result<()> {
        if ctx.store.list_statuses().await?.is_empty() {
            return inv
                .reply(Reply::error("There are no statuses to update to."))
                .await;
        }

        let reply = match ctx.presence.rotate().await? {
            Some(applied) => Reply::info(format!(
                "Status updated to: \"{}\" ({})",
                applied.text, applied.kind
            )),
            None => Reply::error("The bot is not connected to Discord yet."),
        };
        inv.reply(reply).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::dispatch::dispatch;
    use crate::features::presence::StatusKind;
    use crate::test_utils::{invocation, test_context, RecordingPresence, OWNER_ID};

    fn bodies(replies: &[Reply]) -> Vec<String> {
        replies
            .iter()
            .map(|r| r.body().unwrap_or_default().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_blacklist_add_and_remove() {
        let ctx = test_context();
        let (inv, responder) = invocation("d.", OWNER_ID, Some("10"));

        dispatch(&ctx, &inv, "d.bl add alice").await;
        assert!(ctx.blacklist.is_blacklisted("2000"));
        assert!(ctx.store.load_blacklist().await.unwrap().contains_key("2000"));

        dispatch(&ctx, &inv, "d.bl add <@2000>").await;
        dispatch(&ctx, &inv, "d.bl remove 2000").await;
        assert!(!ctx.blacklist.is_blacklisted("2000"));
        assert!(ctx.store.load_blacklist().await.unwrap().is_empty());

        assert_eq!(
            bodies(&responder.replies()),
            vec![
                "User <@2000> has been blacklisted.",
                "User <@2000> is already blacklisted.",
                "User <@2000> has been removed from the blacklist.",
            ]
        );
    }

    #[tokio::test]
    async fn test_blacklist_rejections() {
        let ctx = test_context();
        let (inv, responder) = invocation("d.", OWNER_ID, Some("10"));

        dispatch(&ctx, &inv, "d.blacklist").await;
        dispatch(&ctx, &inv, "d.blacklist add").await;
        dispatch(&ctx, &inv, "d.blacklist add nobody").await;
        dispatch(&ctx, &inv, &format!("d.blacklist add {OWNER_ID}")).await;
        dispatch(&ctx, &inv, "d.blacklist remove alice").await;

        assert_eq!(
            bodies(&responder.replies()),
            vec![
                "Please specify a subcommand: `add` or `remove`.",
                "Could not find this user",
                "Could not find this user",
                "The bot owner cannot be blacklisted.",
                "Please provide a user ID.",
            ]
        );
        assert!(ctx.blacklist.is_empty());
    }

    #[tokio::test]
    async fn test_status_crud() {
        let ctx = test_context();
        let (inv, responder) = invocation("d.", OWNER_ID, None);

        dispatch(&ctx, &inv, "d.status list").await;
        dispatch(&ctx, &inv, "d.status add playing with {guilds.size} servers").await;
        dispatch(&ctx, &inv, "d.st add streaming live now").await;
        dispatch(&ctx, &inv, "d.status remove").await;
        dispatch(&ctx, &inv, "d.status remove one").await;
        dispatch(&ctx, &inv, "d.status remove 99").await;
        dispatch(&ctx, &inv, "d.status remove 1").await;

        assert_eq!(
            bodies(&responder.replies()),
            vec![
                "There are currently no statuses set for the bot.",
                "Added new Playing status: \"with {guilds.size} servers\"",
                "Added new Streaming status: \"live now\"",
                "Please provide a status ID to remove.",
                "Please provide a valid numeric ID.",
                "Status with ID 99 not found.",
                "Removed status: \"with {guilds.size} servers\" (Playing)",
            ]
        );

        dispatch(&ctx, &inv, "d.status list").await;
        let embed = responder.replies().last().unwrap().embeds[0].clone();
        assert_eq!(embed.title.as_deref(), Some("Bot Statuses"));
        assert_eq!(embed.fields.len(), 1);
        assert_eq!(embed.fields[0].name, "ID: 2 (Streaming)");
        assert!(embed.fields[0].value.starts_with("live now\nURL: https://"));
    }

    #[tokio::test]
    async fn test_status_add_invalid() {
        let ctx = test_context();
        let (inv, responder) = invocation("d.", OWNER_ID, None);

        dispatch(&ctx, &inv, "d.status add dancing all night").await;

        let body = responder.replies()[0].body().unwrap_or_default().to_string();
        assert!(body.starts_with("Invalid status type."));
        assert!(ctx.store.list_statuses().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_status_update() {
        let ctx = test_context();
        let (inv, responder) = invocation("d.", OWNER_ID, None);

        dispatch(&ctx, &inv, "d.status update").await;

        let target = Arc::new(RecordingPresence::new(5, 50));
        ctx.presence.attach(target.clone()).await;
        dispatch(&ctx, &inv, "d.status add watching {users.size} users").await;
        dispatch(&ctx, &inv, "d.status update").await;

        let replies = bodies(&responder.replies());
        assert_eq!(replies[0], "There are no statuses to update to.");
        assert_eq!(replies[2], "Status updated to: \"50 users\" (Watching)");
        assert_eq!(
            target.last(),
            Some((StatusKind::Watching, "50 users".to_string(), None))
        );
    }

    #[tokio::test]
    async fn test_logdebug_toggles() {
        let ctx = test_context();
        let (inv, responder) = invocation("d.", OWNER_ID, None);
        assert!(!ctx.debug.is_enabled());

        dispatch(&ctx, &inv, "d.logdebug").await;
        assert!(ctx.debug.is_enabled());
        dispatch(&ctx, &inv, "d.logdebug").await;
        assert!(!ctx.debug.is_enabled());

        assert_eq!(
            bodies(&responder.replies()),
            vec!["Debug mode has been enabled.", "Debug mode has been disabled."]
        );
    }

    #[tokio::test]
    async fn test_logdebug_is_owner_only() {
        let ctx = test_context();
        let (inv, _) = invocation("d.", "1", None);

        dispatch(&ctx, &inv, "d.logdebug").await;

        assert!(!ctx.debug.is_enabled());
    }
}
