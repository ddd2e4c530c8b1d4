//! Applies presence rotations to the gateway session

use async_trait::async_trait;
use serenity::model::gateway::Activity;
use serenity::prelude::Context;

use crate::features::presence::{PresenceTarget, StatusKind, DEFAULT_STREAM_URL};

pub struct GatewayPresence {
    ctx: Context,
}

impl GatewayPresence {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }
}

/// serenity has no custom status activity, so those show as playing
pub fn to_activity(kind: StatusKind, text: &str, url: Option<&str>) -> Activity {
    match kind {
        StatusKind::Playing | StatusKind::Custom => Activity::playing(text),
        StatusKind::Watching => Activity::watching(text),
        StatusKind::Listening => Activity::listening(text),
        StatusKind::Competing => Activity::competing(text),
        StatusKind::Streaming => Activity::streaming(text, url.unwrap_or(DEFAULT_STREAM_URL)),
    }
}

#[async_trait]
impl PresenceTarget for GatewayPresence {
    async fn set_activity(&self, kind: StatusKind, text: &str, url: Option<&str>) {
        self.ctx.set_activity(to_activity(kind, text, url)).await;
    }

    fn guild_count(&self) -> usize {
        self.ctx.cache.guild_count()
    }

    fn user_count(&self) -> usize {
        self.ctx.cache.user_count()
    }
}
