//! Fun command handlers
//!
//! Handles: gayrate
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.3.0

use anyhow::Result;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::users::lookup_target;
use crate::commands::command::{Command, CommandBuilder};
use crate::commands::context::CommandContext;
use crate::commands::handler::{CommandHandler, Invocation, Reply};

const BAR_SLOTS: u32 = 10;
const FILLED: &str = "🏳️‍🌈";
const EMPTY: &str = "⬜";

pub fn commands() -> Vec<CommandBuilder> {
    vec![Command::builder("gayrate", "Replies with how gay a user is.")
        .handler(GayRate)
        .alias("gay")
        .category("fun")
        .example("gayrate\ngayrate @someone")]
}

pub struct GayRate;

#[async_trait]
impl CommandHandler for GayRate {
    async fn execute(&self, _ctx: Arc<CommandContext>, inv: &Invocation, args: &[String]) -> Result<()> {
        let Some(user) = lookup_target(inv, args).await? else {
            return Ok(());
        };

        let rate = rate_for(&user.id);
        inv.reply(Reply::info(format!(
            "**{}** is {rate}% gay\n\n{}",
            user.username,
            progress_bar(rate)
        )))
        .await
    }
}

/// 1..=100, stable for a given user id
fn rate_for(user_id: &str) -> u32 {
    let mut hasher = DefaultHasher::new();
    user_id.hash(&mut hasher);
    StdRng::seed_from_u64(hasher.finish()).random_range(1..=100)
}

fn progress_bar(percent: u32) -> String {
    let filled = ((percent.min(100) as f64 / 100.0) * BAR_SLOTS as f64).round() as usize;
    let empty = BAR_SLOTS as usize - filled;
    format!("{}{}", FILLED.repeat(filled), EMPTY.repeat(empty))
}
