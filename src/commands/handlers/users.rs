//! User lookup command handlers
//!
//! Handles: avatar, userinfo, banner, avatarbanner, nickme
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.3.0
//!
//! ## Changelog
//! - 1.1.0: Banners and self nicknames
//! - 1.0.0: Avatar and user info

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, info, warn};
use serenity::model::Permissions;
use std::sync::Arc;

use crate::commands::command::{Command, CommandBuilder};
use crate::commands::context::CommandContext;
use crate::commands::handler::{CommandHandler, Invocation, Reply};
use crate::commands::dispatch::GUILD_ONLY_MESSAGE;
use crate::core::{colors, escape_markdown, Embed};
use crate::features::guilds::validate_nickname;
use crate::features::targets::{target_or_caller, TargetError, TargetUser};

pub fn commands() -> Vec<CommandBuilder> {
    vec![
        Command::builder("avatar", "Get the avatar of a user.")
            .handler(Avatar)
            .alias("av")
            .category("users")
            .example("avatar\navatar @someone"),
        Command::builder("userinfo", "Displays information about a user.")
            .handler(UserInfo)
            .aliases(&["ui", "user", "u"])
            .category("users")
            .example("userinfo\nuserinfo 123456789012345678"),
        Command::builder("banner", "Displays the banner of a user.")
            .handler(Banner)
            .alias("ba")
            .category("users")
            .example("banner\nbanner @someone"),
        Command::builder("avatarbanner", "Displays the avatar and banner of a user.")
            .handler(AvatarBanner)
            .aliases(&["avba", "avb"])
            .category("users")
            .example("avatarbanner\navatarbanner @someone"),
        Command::builder("nickme", "Change your server nickname.")
            .handler(NickMe)
            .alias("nick")
            .cooldown_secs(10)
            .bot_permissions(Permissions::MANAGE_NICKNAMES)
            .category("users")
            .example("nickme Sunny"),
    ]
}

/// Resolve the optional user argument, replying with the failure if any
pub(crate) async fn lookup_target(inv: &Invocation, args: &[String]) -> Result<Option<TargetUser>> {
    let target = target_or_caller(
        inv.users.as_ref(),
        args.first().map(String::as_str),
        &inv.caller.id,
        inv.guild_id.as_deref(),
        true,
    )
    .await;

    match target {
        Ok(user) => Ok(Some(user)),
        Err(TargetError::NoId) => {
            inv.reply(Reply::error("The user was not found")).await?;
            Ok(None)
        }
        Err(e) => {
            inv.reply(Reply::error(format!("{e}."))).await?;
            Ok(None)
        }
    }
}

/// Like [`lookup_target`], but with the full profile so banners are known
async fn lookup_profile(inv: &Invocation, args: &[String]) -> Result<Option<TargetUser>> {
    let Some(user) = lookup_target(inv, args).await? else {
        return Ok(None);
    };
    match inv.users.fetch_profile(&user.id).await {
        Ok(profile) => Ok(Some(profile)),
        Err(e) => {
            debug!("Profile fetch for {} failed: {e}", user.id);
            inv.reply(Reply::error("User not found.")).await?;
            Ok(None)
        }
    }
}

fn avatar_embed(user: &TargetUser) -> Embed {
    Embed::new(colors::SUNSHINE_YELLOW)
        .title(format!("{}'s Avatar", user.username))
        .image(&user.avatar_url)
}

fn banner_embed(user: &TargetUser, url: &str) -> Embed {
    Embed::new(colors::SUNSHINE_YELLOW)
        .title(format!("{}'s Banner", user.username))
        .image(url)
}

pub struct Avatar;

#[async_trait]
impl CommandHandler for Avatar {
    async fn execute(&self, _ctx: Arc<CommandContext>, inv: &Invocation, args: &[String]) -> Result<()> {
        let Some(user) = lookup_target(inv, args).await? else {
            return Ok(());
        };

        inv.reply(Reply::embed(avatar_embed(&user)).link("Avatar URL", &user.avatar_url))
            .await
    }
}

pub struct UserInfo;

#[async_trait]
impl CommandHandler for UserInfo {
    async fn execute(&self, ctx: Arc<CommandContext>, inv: &Invocation, args: &[String]) -> Result<()> {
        let Some(user) = lookup_target(inv, args).await? else {
            return Ok(());
        };

        let created = user
            .created_at
            .map(|at| format!("<t:{}:R>", at.timestamp()))
            .unwrap_or_else(|| "Unknown".to_string());
        let prefix = ctx
            .prefixes
            .user_prefix(&user.id)
            .map(|p| format!("`{p}`"))
            .unwrap_or_else(|| "Not set".to_string());

        let mut description = format!(
            "**Display Name:** {}\n**Account Created:** {}\n**Self Prefix:** {}",
            user.name(),
            created,
            prefix
        );
        if user.bot {
            description.push_str("\n**Bot:** Yes");
        }
        if let Some(since) = ctx.blacklist.since(&user.id) {
            description.push_str(&format!("\n**Blacklisted:** <t:{}:R>", since.timestamp()));
        }

        let embed = Embed::info(description)
            .title(format!("{} ({})", user.username, user.id))
            .thumbnail(&user.avatar_url);
        inv.reply(Reply::embed(embed)).await
    }
}

pub struct Banner;

#[async_trait]
impl CommandHandler for Banner {
    async fn execute(&self, _ctx: Arc<CommandContext>, inv: &Invocation, args: &[String]) -> Result<()> {
        let Some(user) = lookup_profile(inv, args).await? else {
            return Ok(());
        };

        let reply = match &user.banner_url {
            Some(url) => Reply::embed(banner_embed(&user, url)).link("Banner URL", url),
            None => Reply::embed(
                Embed::info(format!("**{}** has no banner.", escape_markdown(&user.username)))
                    .title(format!("{}'s Banner", user.username)),
            ),
        };
        inv.reply(reply).await
    }
}

pub struct AvatarBanner;

#[async_trait]
impl CommandHandler for AvatarBanner {
    async fn execute(&self, _ctx: Arc<CommandContext>, inv: &Invocation, args: &[String]) -> Result<()> {
        let Some(user) = lookup_profile(inv, args).await? else {
            return Ok(());
        };

        let mut reply = Reply::embed(avatar_embed(&user)).link("Avatar URL", &user.avatar_url);
        if let Some(url) = &user.banner_url {
            reply = reply.with_embed(banner_embed(&user, url)).link("Banner URL", url);
        }
        inv.reply(reply).await
    }
}

pub struct NickMe;

#[async_trait]
impl CommandHandler for NickMe {
    async fn execute(&self, _ctx: Arc<CommandContext>, inv: &Invocation, args: &[String]) -> Result<()> {
        let Some(guild_id) = inv.guild_id.as_deref() else {
            return inv.reply(Reply::error(GUILD_ONLY_MESSAGE)).await;
        };
        let nickname = match validate_nickname(args) {
            Ok(nickname) => nickname,
            Err(e) => return inv.reply(Reply::error(e.to_string())).await,
        };

        let caller = &inv.caller;
        if let Err(e) = inv.guilds.set_nickname(guild_id, &caller.id, &nickname).await {
            warn!("Nickname change for {} in {guild_id} failed: {e:?}", caller.id);
            return inv
                .reply(Reply::error(
                    "Failed to change your nickname. I might not have permission to modify your nickname.",
                ))
                .await;
        }

        info!("{} ({}) changed their nickname in {guild_id}", caller.name, caller.id);
        inv.reply(Reply::info(format!(
            "Successfully updated your nickname to **{}**",
            escape_markdown(&nickname)
        )))
        .await
    }
}
