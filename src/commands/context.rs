//! Shared context for command handlers
//!
//! - **Version**: 2.1.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 2.1.0: Debug logging switch
//! - 2.0.0: Registry, prefix/blacklist/cooldown caches, AI queue and presence
//! - 1.0.0: Initial implementation with core shared state

use anyhow::Result;
use log::info;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use super::registry::CommandRegistry;
use crate::core::logging::base_level;
use crate::core::{Config, DebugSwitch};
use crate::database::Store;
use crate::features::{AiQueue, Blacklist, CooldownTracker, PrefixCache, Presence};

/// The bot's own account, known once the gateway is ready
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotUser {
    pub id: String,
    pub username: String,
}

/// Shared context for all command handlers
///
/// Built once at startup and shared behind an `Arc`. Contains:
/// - the immutable command registry
/// - the prefix, blacklist and cooldown caches read by dispatch
/// - the store that backs the caches
/// - the AI request queue, when an API key is configured
/// - presence rotation and a few gateway facts for info commands
/// - the runtime debug logging switch
#[derive(Clone)]
pub struct CommandContext {
    pub config: Arc<Config>,
    pub registry: Arc<CommandRegistry>,
    pub prefixes: PrefixCache,
    pub blacklist: Blacklist,
    pub cooldowns: CooldownTracker,
    pub store: Arc<dyn Store>,
    pub ai: Option<AiQueue>,
    pub presence: Presence,
    pub bot_user: Arc<OnceLock<BotUser>>,
    pub guild_count: Arc<AtomicUsize>,
    pub start_time: Instant,
    pub debug: DebugSwitch,
}

impl CommandContext {
    pub fn new(
        config: Config,
        registry: CommandRegistry,
        store: Arc<dyn Store>,
        ai: Option<AiQueue>,
    ) -> Self {
        let presence = Presence::new(Arc::clone(&store), registry.len());
        let debug = DebugSwitch::new(base_level(&config.log_level));
        Self {
            prefixes: PrefixCache::new(&config.default_prefix),
            config: Arc::new(config),
            registry: Arc::new(registry),
            blacklist: Blacklist::new(),
            cooldowns: CooldownTracker::new(),
            store,
            ai,
            presence,
            bot_user: Arc::new(OnceLock::new()),
            guild_count: Arc::new(AtomicUsize::new(0)),
            start_time: Instant::now(),
            debug,
        }
    }

    /// Replace the debug switch, e.g. with the one matching the installed logger
    pub fn with_debug(mut self, debug: DebugSwitch) -> Self {
        self.debug = debug;
        self
    }

    /// Fill the in-memory caches from the store
    pub async fn load_caches(&self) -> Result<()> {
        let users = self.store.load_user_prefixes().await?;
        let guilds = self.store.load_guild_prefixes().await?;
        let blacklist = self.store.load_blacklist().await?;

        info!(
            "Loaded {} user prefixes, {} guild prefixes, {} blacklisted users",
            users.len(),
            guilds.len(),
            blacklist.len()
        );

        self.prefixes.load(users, guilds);
        self.blacklist.load(blacklist);
        Ok(())
    }

    pub fn is_owner(&self, user_id: &str) -> bool {
        self.config.owner_id == user_id
    }

    pub fn set_bot_user(&self, user: BotUser) {
        // a reconnect reports the same account again
        let _ = self.bot_user.set(user);
    }

    pub fn bot_user(&self) -> Option<&BotUser> {
        self.bot_user.get()
    }

    pub fn guilds(&self) -> usize {
        self.guild_count.load(Ordering::Relaxed)
    }

    pub fn set_guilds(&self, count: usize) {
        self.guild_count.store(count, Ordering::Relaxed);
    }

    pub fn guild_joined(&self) {
        self.guild_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn guild_left(&self) {
        let _ = self
            .guild_count
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }
}
