//! Guild summaries and member edits backed by serenity

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use serenity::cache::Cache;
use serenity::http::Http;
use serenity::model::channel::{Channel, ChannelType};
use serenity::model::guild::{
    ExplicitContentFilter, Guild, NsfwLevel, PremiumTier, VerificationLevel,
};
use serenity::model::id::{GuildId, UserId};
use std::sync::Arc;

use super::directory::parse_id;
use crate::features::guilds::{ChannelCounts, GuildDirectory, GuildSummary};

pub struct SerenityGuilds {
    cache: Arc<Cache>,
    http: Arc<Http>,
}

impl SerenityGuilds {
    pub fn new(cache: Arc<Cache>, http: Arc<Http>) -> Self {
        Self { cache, http }
    }
}

fn count_channels(guild: &Guild) -> ChannelCounts {
    let mut counts = ChannelCounts {
        total: guild.channels.len(),
        ..ChannelCounts::default()
    };
    for channel in guild.channels.values() {
        match channel {
            Channel::Category(_) => counts.category += 1,
            Channel::Guild(channel) => match channel.kind {
                ChannelType::Text => counts.text += 1,
                ChannelType::Voice => counts.voice += 1,
                ChannelType::News => counts.announcement += 1,
                ChannelType::Forum => counts.forum += 1,
                ChannelType::Stage => counts.stage += 1,
                ChannelType::Category => counts.category += 1,
                _ => {}
            },
            _ => {}
        }
    }
    counts
}

fn boost_tier(tier: PremiumTier) -> u8 {
    match tier {
        PremiumTier::Tier1 => 1,
        PremiumTier::Tier2 => 2,
        PremiumTier::Tier3 => 3,
        _ => 0,
    }
}

fn verification_name(level: VerificationLevel) -> &'static str {
    match level {
        VerificationLevel::None => "None",
        VerificationLevel::Low => "Low",
        VerificationLevel::Medium => "Medium",
        VerificationLevel::High => "High",
        VerificationLevel::Higher => "Very High",
        _ => "Unknown",
    }
}

fn content_filter_name(filter: ExplicitContentFilter) -> &'static str {
    match filter {
        ExplicitContentFilter::None => "Disabled",
        ExplicitContentFilter::WithoutRole => "Members Without Roles",
        ExplicitContentFilter::All => "All Members",
        _ => "Unknown",
    }
}

fn nsfw_name(level: NsfwLevel) -> &'static str {
    match level {
        NsfwLevel::Default => "Default",
        NsfwLevel::Explicit => "Explicit",
        NsfwLevel::Safe => "Safe",
        NsfwLevel::AgeRestricted => "Age Restricted",
        _ => "Unknown",
    }
}

pub fn to_guild_summary(guild: &Guild) -> GuildSummary {
    GuildSummary {
        id: guild.id.to_string(),
        name: guild.name.clone(),
        description: guild.description.clone().filter(|d| !d.is_empty()),
        icon_url: guild.icon_url(),
        banner_url: guild.banner_url(),
        owner_id: guild.owner_id.to_string(),
        owner_name: guild.members.get(&guild.owner_id).map(|m| m.user.name.clone()),
        created_at: DateTime::<Utc>::from_timestamp(guild.id.created_at().unix_timestamp(), 0),
        member_count: guild.member_count,
        bot_count: guild.members.values().filter(|m| m.user.bot).count(),
        channels: count_channels(guild),
        boost_tier: boost_tier(guild.premium_tier),
        boost_count: guild.premium_subscription_count,
        verification: verification_name(guild.verification_level).to_string(),
        content_filter: content_filter_name(guild.explicit_content_filter).to_string(),
        nsfw_level: nsfw_name(guild.nsfw_level).to_string(),
        features: guild.features.clone(),
    }
}

#[async_trait]
impl GuildDirectory for SerenityGuilds {
    async fn guild_summary(&self, guild_id: &str) -> Result<Option<GuildSummary>> {
        let id = GuildId(parse_id(guild_id)?);
        let Some(guild) = self.cache.guild(id) else {
            debug!("Guild {guild_id} not cached");
            return Ok(None);
        };
        Ok(Some(to_guild_summary(&guild)))
    }

    async fn set_nickname(&self, guild_id: &str, user_id: &str, nickname: &str) -> Result<()> {
        let guild = GuildId(parse_id(guild_id)?);
        let user = UserId(parse_id(user_id)?);
        guild
            .edit_member(&self.http, user, |member| member.nickname(nickname))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_names() {
        assert_eq!(verification_name(VerificationLevel::Higher), "Very High");
        assert_eq!(content_filter_name(ExplicitContentFilter::None), "Disabled");
        assert_eq!(nsfw_name(NsfwLevel::AgeRestricted), "Age Restricted");
        assert_eq!(boost_tier(PremiumTier::Tier2), 2);
        assert_eq!(boost_tier(PremiumTier::Tier0), 0);
    }
}
