//! General command handlers
//!
//! Handles: ping, ping stats, help, botinfo, invite, serverinfo
//!
//! - **Version**: 2.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.1.0: Server info
//! - 2.0.0: Prefix command handlers on the shared invocation pipeline
//! - 1.0.0: Ping and help

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use log::warn;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::commands::command::{Command, CommandBuilder};
use crate::commands::context::CommandContext;
use crate::commands::dispatch::{permission_names, usage_embed, GUILD_ONLY_MESSAGE};
use crate::commands::handler::{CommandHandler, Invocation, Reply};
use crate::core::{colors, with_commas, Embed};
use crate::features::guilds::{feature_label, GuildSummary};

pub fn commands() -> Vec<CommandBuilder> {
    vec![
        Command::builder("ping", "Ping the bot and get a response.")
            .handler(Ping)
            .category("general")
            .example("ping\nping stats")
            .sub(Command::builder("stats", "Get bot ping stats.").handler(PingStats)),
        Command::builder("help", "List commands or show details for one.")
            .handler(Help)
            .alias("h")
            .category("general")
            .example("help\nhelp prefix set"),
        Command::builder("botinfo", "Displays information about the bot.")
            .handler(BotInfo)
            .aliases(&["bi", "info"])
            .category("general"),
        Command::builder("invite", "Replies with the invite.")
            .handler(Invite)
            .category("general"),
        Command::builder("serverinfo", "Displays detailed information about the current server.")
            .handler(ServerInfo)
            .aliases(&["si", "server", "guild"])
            .category("general"),
    ]
}

pub struct Ping;

#[async_trait]
impl CommandHandler for Ping {
    async fn execute(&self, _ctx: Arc<CommandContext>, inv: &Invocation, _args: &[String]) -> Result<()> {
        inv.reply(Reply::text("Pong!")).await
    }
}

pub struct PingStats;

#[async_trait]
impl CommandHandler for PingStats {
    async fn execute(&self, _ctx: Arc<CommandContext>, inv: &Invocation, _args: &[String]) -> Result<()> {
        let latency = (Utc::now() - inv.sent_at).num_milliseconds().max(0);
        inv.reply(Reply::text(format!("Bot ping is {latency}ms."))).await
    }
}

pub struct Help;

#[async_trait]
impl CommandHandler for Help {
    async fn execute(&self, ctx: Arc<CommandContext>, inv: &Invocation, args: &[String]) -> Result<()> {
        if args.is_empty() {
            return inv.reply(Reply::embed(overview(&ctx, inv))).await;
        }

        match ctx.registry.resolve(args) {
            Some(resolved) if resolved.args.is_empty() => {
                let embed = details(resolved.command, &resolved.qualified_name(), &inv.prefix)
                    .unwrap_or_else(|| usage_embed(&resolved, &inv.prefix));
                inv.reply(Reply::embed(embed)).await
            }
            _ => {
                let wanted = args.join(" ");
                inv.reply(Reply::error(format!("No command named `{wanted}` was found.")))
                    .await
            }
        }
    }
}

/// Every command the caller may use, grouped by category
fn overview(ctx: &CommandContext, inv: &Invocation) -> Embed {
    let show_dev = ctx.is_owner(&inv.caller.id);
    let mut categories: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for command in ctx.registry.commands() {
        if command.dev_only && !show_dev {
            continue;
        }
        categories
            .entry(command.category.as_str())
            .or_default()
            .push(command.name.as_str());
    }

    let mut embed = Embed::info(format!(
        "Use `{}help <command>` for details about a command.",
        inv.prefix
    ))
    .title(format!("{} Commands", ctx.config.bot_name));
    for (category, names) in categories {
        let names = names
            .iter()
            .map(|name| format!("`{name}`"))
            .collect::<Vec<_>>()
            .join(", ");
        embed = embed.field(capitalize(category), names, false);
    }
    embed
}

/// Details for a runnable command; `None` for pure namespaces
fn details(command: &Command, path: &str, prefix: &str) -> Option<Embed> {
    command.handler()?;

    let mut embed = Embed::info(&command.description).title(format!("Help: {path}"));
    if !command.aliases.is_empty() {
        embed = embed.field("Aliases", command.aliases.join(", "), true);
    }
    if !command.subcommands().is_empty() {
        let subs = command
            .subcommands()
            .iter()
            .map(|sub| sub.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        embed = embed.field("Subcommands", subs, true);
    }
    if !command.caller_permissions.is_empty() {
        embed = embed.field("Permissions", permission_names(command.caller_permissions), true);
    }
    if command.has_cooldown() {
        embed = embed.field(
            "Cooldown",
            format!("{}s", command.cooldown.as_secs_f64()),
            true,
        );
    }
    if !command.example.is_empty() {
        let example = command
            .example
            .lines()
            .map(|line| format!("{prefix}{line}"))
            .collect::<Vec<_>>()
            .join("\n");
        embed = embed.field("Example", format!("```\n{example}\n```"), false);
    }
    Some(embed)
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub struct BotInfo;

#[async_trait]
impl CommandHandler for BotInfo {
    async fn execute(&self, ctx: Arc<CommandContext>, inv: &Invocation, _args: &[String]) -> Result<()> {
        let started = Utc::now()
            - chrono::Duration::from_std(ctx.start_time.elapsed()).unwrap_or_else(|_| chrono::Duration::zero());
        let name = ctx
            .bot_user()
            .map(|bot| bot.username.clone())
            .unwrap_or_else(|| ctx.config.bot_name.clone());

        let description = format!(
            "🌐 **Servers**: {}\n📜 **Commands**: {}\n🚫 **Blacklisted**: {}\n⏱️ **Uptime**: <t:{}:R>\n🔑 **Default Prefix**: `{}`",
            with_commas(ctx.guilds() as u64),
            with_commas(ctx.registry.len() as u64),
            with_commas(ctx.blacklist.len() as u64),
            started.timestamp(),
            ctx.prefixes.default_prefix(),
        );

        let mut embed = Embed::info(description).title(format!("{name} Information"));
        if ctx.ai.is_some() {
            embed = embed.footer(format!("AI model: {}", ctx.config.openai_model));
        }
        inv.reply(Reply::embed(embed)).await
    }
}

pub struct Invite;

#[async_trait]
impl CommandHandler for Invite {
    async fn execute(&self, ctx: Arc<CommandContext>, inv: &Invocation, _args: &[String]) -> Result<()> {
        let Some(bot) = ctx.bot_user() else {
            return inv
                .reply(Reply::error("The invite link is not available yet, try again in a moment."))
                .await;
        };

        let url = invite_url(&bot.id);
        let reply = Reply::info(format!("**Invite <@{}> now!**", bot.id))
            .link(format!("Invite {}", bot.username), url);
        inv.reply(reply).await
    }
}

pub fn invite_url(bot_id: &str) -> String {
    format!("https://discord.com/oauth2/authorize?client_id={bot_id}")
}

pub struct ServerInfo;

#[async_trait]
impl CommandHandler for ServerInfo {
    async fn execute(&self, ctx: Arc<CommandContext>, inv: &Invocation, _args: &[String]) -> Result<()> {
        let Some(guild_id) = inv.guild_id.as_deref() else {
            return inv.reply(Reply::error(GUILD_ONLY_MESSAGE)).await;
        };

        let summary = match inv.guilds.guild_summary(guild_id).await {
            Ok(Some(summary)) => summary,
            Ok(None) => {
                return inv
                    .reply(Reply::error("This server's information is not available yet."))
                    .await;
            }
            Err(e) => {
                warn!("Server info for {guild_id} failed: {e:?}");
                return inv
                    .reply(Reply::error("An error occurred while fetching server information."))
                    .await;
            }
        };

        let prefix = ctx
            .prefixes
            .guild_prefix(guild_id)
            .unwrap_or_else(|| ctx.prefixes.default_prefix().to_string());

        let mut embed = Embed::new(colors::SUNSHINE_YELLOW)
            .title(&summary.name)
            .description(server_description(&summary, &prefix));
        if let Some(icon) = &summary.icon_url {
            embed = embed.thumbnail(icon);
        }
        if let Some(banner) = &summary.banner_url {
            embed = embed.image(banner);
        }
        inv.reply(Reply::embed(embed)).await
    }
}

fn server_description(guild: &GuildSummary, prefix: &str) -> String {
    let owner = match &guild.owner_name {
        Some(name) => format!("{name} ({})", guild.owner_id),
        None => guild.owner_id.clone(),
    };
    let created = guild
        .created_at
        .map(|at| format!("<t:{0}:F>\n(<t:{0}:R>)", at.timestamp()))
        .unwrap_or_else(|| "Unknown".to_string());
    let channels = &guild.channels;

    let mut text = format!("**ID:** {}\n", guild.id);
    if let Some(description) = &guild.description {
        text.push_str(description);
        text.push('\n');
    }
    text.push_str(&format!(
        "\n**👑 Owner**\n{owner}\n\n\
         **📅 Server Created**\n{created}\n\n\
         **👤 Members**\nTotal: {}\nBots: {}\n\n\
         **💬 Channels**\nTotal: {}\nText: {}\nVoice: {}\nAnnouncement: {}\nForum: {}\nCategories: {}\nStage: {}\n\n\
         **🚀 Boost Status**\nLevel {}\nBoosts: {}\n\n\
         **⚙️ Server Settings**\nVerification: {}\nContent Filter: {}\nNSFW Level: {}\nPrefix: `{prefix}`",
        with_commas(guild.member_count),
        with_commas(guild.bot_count as u64),
        with_commas(channels.total as u64),
        with_commas(channels.text as u64),
        with_commas(channels.voice as u64),
        with_commas(channels.announcement as u64),
        with_commas(channels.forum as u64),
        with_commas(channels.category as u64),
        channels.stage,
        guild.boost_tier,
        guild.boost_count,
        guild.verification,
        guild.content_filter,
        guild.nsfw_level,
    ));

    if !guild.features.is_empty() {
        let features = guild
            .features
            .iter()
            .map(|feature| format!("`{}`", feature_label(feature)))
            .collect::<Vec<_>>()
            .join(", ");
        text.push_str(&format!("\n\n**✨ Server Features**\n{features}"));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::context::BotUser;
    use crate::commands::dispatch::{dispatch, DispatchOutcome};
    use crate::test_utils::{invocation, test_context, MockGuilds, OWNER_ID};

    #[tokio::test]
    async fn test_ping_stats() {
        let ctx = test_context();
        let (inv, responder) = invocation("d.", "1", Some("10"));

        dispatch(&ctx, &inv, "d.ping stats").await;

        let body = responder.replies()[0].body().unwrap_or_default().to_string();
        assert!(body.starts_with("Bot ping is "));
        assert!(body.ends_with("ms."));
    }

    #[tokio::test]
    async fn test_help_hides_dev_commands() {
        let ctx = test_context();
        let (inv, responder) = invocation("d.", "1", Some("10"));

        dispatch(&ctx, &inv, "d.help").await;

        let embed = responder.replies()[0].embeds[0].clone();
        let listed: String = embed.fields.iter().map(|f| f.value.clone()).collect();
        assert!(listed.contains("`ping`"));
        assert!(!listed.contains("`blacklist`"));

        let (inv, responder) = invocation("d.", OWNER_ID, Some("10"));
        dispatch(&ctx, &inv, "d.help").await;
        let embed = responder.replies()[0].embeds[0].clone();
        assert!(embed.fields.iter().any(|f| f.value.contains("`blacklist`")));
    }

    #[tokio::test]
    async fn test_help_for_command_path() {
        let ctx = test_context();
        let (inv, responder) = invocation("d.", "1", Some("10"));

        dispatch(&ctx, &inv, "d.help prefix set").await;

        let embed = responder.replies()[0].embeds[0].clone();
        assert_eq!(embed.title.as_deref(), Some("Help: prefix set"));
        assert!(embed.fields.iter().any(|f| f.name == "Permissions"));
    }

    #[tokio::test]
    async fn test_help_for_alias_and_unknown() {
        let ctx = test_context();
        let (inv, responder) = invocation("d.", "1", Some("10"));

        dispatch(&ctx, &inv, "d.help av").await;
        dispatch(&ctx, &inv, "d.help nothing").await;

        let replies = responder.replies();
        assert_eq!(replies[0].embeds[0].title.as_deref(), Some("Help: avatar"));
        assert_eq!(replies[1].body(), Some("No command named `nothing` was found."));
    }

    #[tokio::test]
    async fn test_invite_needs_bot_user() {
        let ctx = test_context();
        let (inv, responder) = invocation("d.", "1", None);

        assert_eq!(dispatch(&ctx, &inv, "d.invite").await, DispatchOutcome::Invoked);
        assert!(responder.replies()[0].ephemeral);

        ctx.set_bot_user(BotUser {
            id: "42".into(),
            username: "Daisy".into(),
        });
        dispatch(&ctx, &inv, "d.invite").await;
        let link = responder.replies()[1].links[0].clone();
        assert_eq!(link.url, "https://discord.com/oauth2/authorize?client_id=42");
        assert_eq!(link.label, "Invite Daisy");
    }

    #[tokio::test]
    async fn test_botinfo() {
        let ctx = test_context();
        ctx.set_guilds(1234);
        let (inv, responder) = invocation("d.", "1", None);

        dispatch(&ctx, &inv, "d.bi").await;

        let embed = responder.replies()[0].embeds[0].clone();
        assert_eq!(embed.title.as_deref(), Some("Daisy Information"));
        assert!(embed.description.unwrap().contains("**Servers**: 1,234"));
    }

    fn sample_guild() -> GuildSummary {
        GuildSummary {
            id: "10".into(),
            name: "Garden".into(),
            description: Some("A quiet place".into()),
            icon_url: Some("https://cdn.discordapp.com/icons/10/i.png".into()),
            owner_id: "2000".into(),
            owner_name: Some("alice".into()),
            member_count: 12345,
            bot_count: 3,
            boost_tier: 2,
            boost_count: 9,
            verification: "High".into(),
            content_filter: "All Members".into(),
            nsfw_level: "Default".into(),
            features: vec!["ANIMATED_ICON".into(), "COMMUNITY".into()],
            ..GuildSummary::default()
        }
    }

    #[tokio::test]
    async fn test_serverinfo() {
        let ctx = test_context();
        ctx.prefixes.set_guild_prefix("10", Some("?"));
        let (mut inv, responder) = invocation("d.", "1", Some("10"));
        inv.guilds = Arc::new(MockGuilds::new().with_guild(sample_guild()));

        assert_eq!(dispatch(&ctx, &inv, "d.si").await, DispatchOutcome::Invoked);

        let embed = responder.replies()[0].embeds[0].clone();
        assert_eq!(embed.title.as_deref(), Some("Garden"));
        assert_eq!(embed.thumbnail.as_deref(), Some("https://cdn.discordapp.com/icons/10/i.png"));
        assert!(embed.image.is_none());
        let text = embed.description.unwrap();
        assert!(text.starts_with("**ID:** 10\nA quiet place\n"));
        assert!(text.contains("alice (2000)"));
        assert!(text.contains("Total: 12,345\nBots: 3"));
        assert!(text.contains("Level 2\nBoosts: 9"));
        assert!(text.contains("Prefix: `?`"));
        assert!(text.ends_with("`Animated Icon`, `Community`"));
    }

    #[tokio::test]
    async fn test_serverinfo_outside_or_unknown_guild() {
        let ctx = test_context();

        let (inv, responder) = invocation("d.", "1", None);
        dispatch(&ctx, &inv, "d.server").await;
        assert_eq!(responder.replies()[0].body(), Some(GUILD_ONLY_MESSAGE));

        let (inv, responder) = invocation("d.", "1", Some("10"));
        dispatch(&ctx, &inv, "d.guild").await;
        assert_eq!(
            responder.replies()[0].body(),
            Some("This server's information is not available yet.")
        );
    }

    #[test]
    fn test_server_description_without_owner_or_features() {
        let guild = GuildSummary {
            features: Vec::new(),
            owner_name: None,
            description: None,
            ..sample_guild()
        };
        let text = server_description(&guild, "d.");
        assert!(text.starts_with("**ID:** 10\n\n**👑 Owner**\n2000\n"));
        assert!(text.contains("**📅 Server Created**\nUnknown"));
        assert!(!text.contains("Server Features"));
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("general"), "General");
        assert_eq!(capitalize(""), "");
    }
}
