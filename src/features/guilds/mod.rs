//! # Feature: Guilds
//!
//! Read-only guild summaries for `serverinfo` and member nickname changes
//! for `nick`.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.5.0
//! - **Toggleable**: false

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Discord's limit on nickname length, in characters
pub const MAX_NICKNAME_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelCounts {
    pub total: usize,
    pub text: usize,
    pub voice: usize,
    pub announcement: usize,
    pub forum: usize,
    pub category: usize,
    pub stage: usize,
}

/// What `serverinfo` shows about a guild
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GuildSummary {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub icon_url: Option<String>,
    pub banner_url: Option<String>,
    pub owner_id: String,
    /// `None` when the owner is not cached
    pub owner_name: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub member_count: u64,
    /// Bots among the cached members
    pub bot_count: usize,
    pub channels: ChannelCounts,
    pub boost_tier: u8,
    pub boost_count: u64,
    pub verification: String,
    pub content_filter: String,
    pub nsfw_level: String,
    /// Raw feature flags, e.g. `ANIMATED_ICON`
    pub features: Vec<String>,
}

/// Guild lookups and member edits
#[async_trait]
pub trait GuildDirectory: Send + Sync {
    /// `None` when the guild is not cached
    async fn guild_summary(&self, guild_id: &str) -> Result<Option<GuildSummary>>;

    async fn set_nickname(&self, guild_id: &str, user_id: &str, nickname: &str) -> Result<()>;
}

/// `ANIMATED_ICON` -> `Animated Icon`
pub fn feature_label(raw: &str) -> String {
    raw.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NicknameError {
    #[error("Please provide a new nickname!")]
    Empty,

    #[error("Nickname must be {MAX_NICKNAME_LEN} characters or less!")]
    TooLong,
}

/// Join the arguments into a nickname Discord will accept
pub fn validate_nickname(args: &[String]) -> Result<String, NicknameError> {
    let nickname = args.join(" ");
    if nickname.is_empty() {
        return Err(NicknameError::Empty);
    }
    if nickname.chars().count() > MAX_NICKNAME_LEN {
        return Err(NicknameError::TooLong);
    }
    Ok(nickname)
}
