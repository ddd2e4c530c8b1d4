//! Cache-or-fetch user lookups backed by serenity

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use serenity::cache::Cache;
use serenity::http::Http;
use serenity::model::id::{GuildId, UserId};
use serenity::model::user::User;
use std::sync::Arc;

use crate::features::targets::{MemberSummary, TargetUser, UserDirectory};

pub struct SerenityUsers {
    cache: Arc<Cache>,
    http: Arc<Http>,
}

impl SerenityUsers {
    pub fn new(cache: Arc<Cache>, http: Arc<Http>) -> Self {
        Self { cache, http }
    }
}

pub(super) fn parse_id(value: &str) -> Result<u64> {
    value
        .parse::<u64>()
        .with_context(|| format!("`{value}` is not a snowflake"))
}

pub fn to_target_user(user: &User) -> TargetUser {
    TargetUser {
        id: user.id.to_string(),
        username: user.name.clone(),
        display_name: None,
        bot: user.bot,
        avatar_url: user.face(),
        banner_url: user.banner_url(),
        created_at: DateTime::<Utc>::from_timestamp(user.id.created_at().unix_timestamp(), 0),
    }
}

#[async_trait]
impl UserDirectory for SerenityUsers {
    async fn fetch_user(&self, user_id: &str) -> Result<TargetUser> {
        let id = parse_id(user_id)?;
        if let Some(user) = self.cache.user(UserId(id)) {
            return Ok(to_target_user(&user));
        }

        debug!("User {user_id} not cached, fetching");
        let user = self.http.get_user(id).await?;
        Ok(to_target_user(&user))
    }

    async fn fetch_profile(&self, user_id: &str) -> Result<TargetUser> {
        let user = self.http.get_user(parse_id(user_id)?).await?;
        Ok(to_target_user(&user))
    }

    async fn guild_members(&self, guild_id: &str) -> Vec<MemberSummary> {
        let Ok(id) = parse_id(guild_id) else {
            return Vec::new();
        };
        let Some(guild) = self.cache.guild(GuildId(id)) else {
            return Vec::new();
        };

        guild
            .members
            .values()
            .map(|member| MemberSummary {
                id: member.user.id.to_string(),
                username: member.user.name.clone(),
                display_name: member.nick.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("1234").unwrap(), 1234);
        assert!(parse_id("abc").is_err());
    }
}
