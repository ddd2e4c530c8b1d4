//! Command handler trait and the per-invocation collaborators
//!
//! - **Version**: 2.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.1.0: Replies carry several embeds and link buttons
//! - 2.0.0: Handlers receive an [`Invocation`] instead of a raw interaction, replies go
//!   through the [`Responder`] seam so messages and slash commands share one pipeline
//! - 1.0.0: Initial implementation for modular command handling

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serenity::model::Permissions;
use std::sync::Arc;
use std::time::Duration;

use super::context::CommandContext;
use crate::core::Embed;
use crate::features::guilds::GuildDirectory;
use crate::features::targets::UserDirectory;

/// Trait for command handlers
///
/// A handler is the executable body of a leaf command. It receives the
/// arguments left over after the subcommand walk, with their original casing.
///
/// # Example
///
/// ```ignore
/// pub struct Ping;
///
/// #[async_trait]
/// impl CommandHandler for Ping {
///     async fn execute(
///         &self,
///         _ctx: Arc<CommandContext>,
///         invocation: &Invocation,
///         _args: &[String],
///     ) -> Result<()> {
///         invocation.reply(Reply::text("Pong!")).await
///     }
/// }
/// ```
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn execute(
        &self,
        ctx: Arc<CommandContext>,
        invocation: &Invocation,
        args: &[String],
    ) -> Result<()>;
}

/// Where replies for one originating message or interaction go
#[async_trait]
pub trait Responder: Send + Sync {
    async fn reply(&self, reply: Reply) -> Result<()>;

    /// Signal that a slow reply is being prepared
    async fn typing(&self) -> Result<()> {
        Ok(())
    }

    /// Remove the message that triggered the command, where that makes sense
    async fn delete_invocation(&self) -> Result<()> {
        Ok(())
    }
}

/// Effective permissions for the caller and for the bot in the current channel
///
/// Both return `None` outside of a guild.
#[async_trait]
pub trait PermissionSource: Send + Sync {
    async fn caller_permissions(&self) -> Result<Option<Permissions>>;
    async fn bot_permissions(&self) -> Result<Option<Permissions>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: String,
    pub name: String,
    pub bot: bool,
}

/// Everything a handler knows about the event that triggered it
#[derive(Clone)]
pub struct Invocation {
    pub caller: Caller,
    pub guild_id: Option<String>,
    pub channel_id: String,
    /// The prefix that matched, or "/" for slash commands
    pub prefix: String,
    pub sent_at: DateTime<Utc>,
    pub responder: Arc<dyn Responder>,
    pub permissions: Arc<dyn PermissionSource>,
    pub users: Arc<dyn UserDirectory>,
    pub guilds: Arc<dyn GuildDirectory>,
}

impl Invocation {
    pub async fn reply(&self, reply: Reply) -> Result<()> {
        self.responder.reply(reply).await
    }

    pub fn in_guild(&self) -> bool {
        self.guild_id.is_some()
    }
}

/// A link button shown under a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkButton {
    pub label: String,
    pub url: String,
}

/// A single outgoing reply
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reply {
    pub content: Option<String>,
    pub embeds: Vec<Embed>,
    /// Shown in one row, in order
    pub links: Vec<LinkButton>,
    /// Only honoured by interaction responders
    pub ephemeral: bool,
    /// Sent to the channel instead of as a reply to the invoking message
    pub detached: bool,
    pub delete_after: Option<Duration>,
}

impl Reply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            embeds: vec![embed],
            ..Default::default()
        }
    }

    pub fn with_embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    pub fn info(description: impl Into<String>) -> Self {
        Self::embed(Embed::info(description))
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self::embed(Embed::error(description)).ephemeral()
    }

    pub fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }

    pub fn detached(mut self) -> Self {
        self.detached = true;
        self
    }

    pub fn link(mut self, label: impl Into<String>, url: impl Into<String>) -> Self {
        self.links.push(LinkButton {
            label: label.into(),
            url: url.into(),
        });
        self
    }

    pub fn delete_after(mut self, after: Duration) -> Self {
        self.delete_after = Some(after);
        self
    }

    /// The main text of the reply, whichever form it took
    pub fn body(&self) -> Option<&str> {
        self.content
            .as_deref()
            .or_else(|| self.embeds.first().and_then(|e| e.description.as_deref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::colors;

    fn _assert_object_safe(_: &dyn CommandHandler, _: &dyn Responder, _: &dyn PermissionSource) {}

    #[test]
    fn test_reply_text_body() {
        let reply = Reply::text("Pong!");
        assert_eq!(reply.body(), Some("Pong!"));
        assert!(reply.embeds.is_empty());
        assert!(!reply.ephemeral);
    }

    #[test]
    fn test_reply_error_is_ephemeral_embed() {
        let reply = Reply::error("nope");
        assert!(reply.ephemeral);
        assert_eq!(reply.embeds.first().map(|e| e.color), Some(colors::HOT_PINK_POP));
        assert_eq!(reply.body(), Some("nope"));
    }

    #[test]
    fn test_reply_link_and_detached() {
        let reply = Reply::text("hi").detached().link("Invite", "https://discord.com");
        assert!(reply.detached);
        assert_eq!(reply.links[0].label, "Invite");
    }

    #[test]
    fn test_reply_with_two_embeds_and_links() {
        let reply = Reply::embed(Embed::info("avatar"))
            .with_embed(Embed::info("banner"))
            .link("Avatar URL", "https://a")
            .link("Banner URL", "https://b");
        assert_eq!(reply.embeds.len(), 2);
        assert_eq!(reply.body(), Some("avatar"));
        let labels: Vec<_> = reply.links.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(labels, vec!["Avatar URL", "Banner URL"]);
    }

    #[test]
    fn test_reply_delete_after() {
        let reply = Reply::info("bye").delete_after(Duration::from_secs(10));
        assert_eq!(reply.delete_after, Some(Duration::from_secs(10)));
    }
}
