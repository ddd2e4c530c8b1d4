//! # Feature: Targets
//!
//! Turns the user argument of commands like `avatar` and `userinfo` into a
//! fetched user.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.3.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Profile fetches with banners
//! - 1.0.0: Id, mention and name lookups

pub mod identifier;
pub mod target;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use identifier::resolve_user_id;
pub use target::{resolve_target, TargetError};

/// A user as the commands see it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetUser {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub bot: bool,
    pub avatar_url: String,
    /// Only known after a [`UserDirectory::fetch_profile`]
    pub banner_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl TargetUser {
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }

    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }
}

/// Searchable snapshot of one guild member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberSummary {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
}

/// Cache-or-fetch access to users
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn fetch_user(&self, user_id: &str) -> Result<TargetUser>;

    /// Fetch the full profile from the API, skipping the cache
    async fn fetch_profile(&self, user_id: &str) -> Result<TargetUser> {
        self.fetch_user(user_id).await
    }

    /// Members of a guild in cache order; empty when the guild is unknown
    async fn guild_members(&self, guild_id: &str) -> Vec<MemberSummary>;
}

/// Resolve the first argument to a target, defaulting to the caller.
///
/// Used by every command that takes an optional user argument.
pub async fn target_or_caller(
    users: &dyn UserDirectory,
    token: Option<&str>,
    caller_id: &str,
    guild_id: Option<&str>,
    allow_bots: bool,
) -> Result<TargetUser, TargetError> {
    let id = match token {
        None => Some(caller_id.to_string()),
        Some(token) => {
            let members = match guild_id {
                Some(guild_id) => Some(users.guild_members(guild_id).await),
                None => None,
            };
            resolve_user_id(token, members.as_deref())
        }
    };
    resolve_target(users, id.as_deref(), allow_bots).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockUsers;

    #[tokio::test]
    async fn test_defaults_to_caller() {
        let users = MockUsers::new().with_user("1", "me", false);
        let user = target_or_caller(&users, None, "1", None, false).await.unwrap();
        assert_eq!(user.id, "1");
    }

    #[tokio::test]
    async fn test_name_lookup_needs_guild() {
        let users = MockUsers::new()
            .with_user("1", "me", false)
            .with_user("2", "alice", false)
            .with_member("9", "2");

        let found = target_or_caller(&users, Some("ali"), "1", Some("9"), false)
            .await
            .unwrap();
        assert_eq!(found.id, "2");

        let err = target_or_caller(&users, Some("ali"), "1", None, false)
            .await
            .unwrap_err();
        assert_eq!(err, TargetError::NoId);
    }

    #[test]
    fn test_display_name_fallback() {
        let user = TargetUser {
            id: "1".into(),
            username: "alice".into(),
            display_name: None,
            bot: false,
            avatar_url: String::new(),
            banner_url: None,
            created_at: None,
        };
        assert_eq!(user.name(), "alice");
        assert_eq!(user.mention(), "<@1>");
    }
}
