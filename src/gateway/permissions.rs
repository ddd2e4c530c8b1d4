//! Channel permissions from the serenity cache

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serenity::cache::Cache;
use serenity::model::id::{ChannelId, GuildId, UserId};
use serenity::model::Permissions;
use std::sync::Arc;

use crate::commands::PermissionSource;

/// Computes effective permissions in one channel for the caller and the bot
pub struct ChannelPermissions {
    cache: Arc<Cache>,
    guild_id: Option<GuildId>,
    channel_id: ChannelId,
    caller: UserId,
    /// Interactions carry the caller's resolved permissions
    caller_override: Option<Permissions>,
}

impl ChannelPermissions {
    pub fn new(cache: Arc<Cache>, guild_id: Option<GuildId>, channel_id: ChannelId, caller: UserId) -> Self {
        Self {
            cache,
            guild_id,
            channel_id,
            caller,
            caller_override: None,
        }
    }

    pub fn with_caller_permissions(mut self, permissions: Option<Permissions>) -> Self {
        self.caller_override = permissions;
        self
    }

    fn permissions_of(&self, user_id: UserId) -> Result<Option<Permissions>> {
        if self.guild_id.is_none() {
            return Ok(None);
        }
        let channel = self
            .cache
            .guild_channel(self.channel_id)
            .ok_or_else(|| anyhow!("channel {} is not cached", self.channel_id))?;
        let permissions = channel.permissions_for_user(&self.cache, user_id)?;
        Ok(Some(permissions))
    }
}

#[async_trait]
impl PermissionSource for ChannelPermissions {
    async fn caller_permissions(&self) -> Result<Option<Permissions>> {
        if self.guild_id.is_none() {
            return Ok(None);
        }
        match self.caller_override {
            Some(permissions) => Ok(Some(permissions)),
            None => self.permissions_of(self.caller),
        }
    }

    async fn bot_permissions(&self) -> Result<Option<Permissions>> {
        let bot = self.cache.current_user_id();
        self.permissions_of(bot)
    }
}
