//! Test doubles for the dispatch pipeline, stores and providers

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serenity::model::Permissions;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::commands::handlers::create_registry;
use crate::commands::{
    Caller, CommandContext, CommandHandler, CommandRegistry, Invocation, PermissionSource, Reply,
    Responder,
};
use crate::core::Config;
use crate::database::Store;
use crate::features::ai::{CompletionProvider, ConversationTurn};
use crate::features::guilds::{GuildDirectory, GuildSummary};
use crate::features::presence::{NewStatus, PresenceTarget, StatusEntry, StatusKind};
use crate::features::targets::{MemberSummary, TargetUser, UserDirectory};

pub const OWNER_ID: &str = "1000";

pub struct NoopHandler;

#[async_trait]
impl CommandHandler for NoopHandler {
    async fn execute(&self, _: Arc<CommandContext>, _: &Invocation, _: &[String]) -> Result<()> {
        Ok(())
    }
}

pub struct FailingHandler;

#[async_trait]
impl CommandHandler for FailingHandler {
    async fn execute(&self, _: Arc<CommandContext>, _: &Invocation, _: &[String]) -> Result<()> {
        bail!("handler exploded")
    }
}

/// Records the arguments of every call
#[derive(Clone, Default)]
pub struct RecordingHandler {
    calls: Arc<Mutex<Vec<Vec<String>>>>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandHandler for RecordingHandler {
    async fn execute(&self, _: Arc<CommandContext>, _: &Invocation, args: &[String]) -> Result<()> {
        self.calls.lock().unwrap().push(args.to_vec());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingResponder {
    replies: Mutex<Vec<Reply>>,
    typing: AtomicUsize,
    deleted: AtomicUsize,
}

impl RecordingResponder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replies(&self) -> Vec<Reply> {
        self.replies.lock().unwrap().clone()
    }

    pub fn typing_count(&self) -> usize {
        self.typing.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> usize {
        self.deleted.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Responder for RecordingResponder {
    async fn reply(&self, reply: Reply) -> Result<()> {
        self.replies.lock().unwrap().push(reply);
        Ok(())
    }

    async fn typing(&self) -> Result<()> {
        self.typing.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete_invocation(&self) -> Result<()> {
        self.deleted.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Fixed permissions; lookups fail when built with [`StaticPermissions::failing`]
pub struct StaticPermissions {
    caller: Permissions,
    bot: Permissions,
    fail: bool,
}

impl StaticPermissions {
    pub fn new(caller: Permissions, bot: Permissions) -> Self {
        Self {
            caller,
            bot,
            fail: false,
        }
    }

    pub fn all() -> Self {
        Self::new(Permissions::all(), Permissions::all())
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::all()
        }
    }
}

#[async_trait]
impl PermissionSource for StaticPermissions {
    async fn caller_permissions(&self) -> Result<Option<Permissions>> {
        if self.fail {
            bail!("permission lookup failed");
        }
        Ok(Some(self.caller))
    }

    async fn bot_permissions(&self) -> Result<Option<Permissions>> {
        if self.fail {
            bail!("permission lookup failed");
        }
        Ok(Some(self.bot))
    }
}

#[derive(Default)]
pub struct MockUsers {
    users: HashMap<String, TargetUser>,
    members: HashMap<String, Vec<String>>,
}

impl MockUsers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, id: &str, username: &str, bot: bool) -> Self {
        self.users.insert(
            id.to_string(),
            TargetUser {
                id: id.to_string(),
                username: username.to_string(),
                display_name: None,
                bot,
                avatar_url: format!("https://cdn.discordapp.com/avatars/{id}/a.png"),
                banner_url: None,
                created_at: None,
            },
        );
        self
    }

    pub fn with_banner(mut self, id: &str, url: &str) -> Self {
        if let Some(user) = self.users.get_mut(id) {
            user.banner_url = Some(url.to_string());
        }
        self
    }

    pub fn with_member(mut self, guild_id: &str, user_id: &str) -> Self {
        self.members
            .entry(guild_id.to_string())
            .or_default()
            .push(user_id.to_string());
        self
    }
}

#[async_trait]
impl UserDirectory for MockUsers {
    /// Cached users carry no banner
    async fn fetch_user(&self, user_id: &str) -> Result<TargetUser> {
        self.fetch_profile(user_id).await.map(|user| TargetUser {
            banner_url: None,
            ..user
        })
    }

    async fn fetch_profile(&self, user_id: &str) -> Result<TargetUser> {
        self.users
            .get(user_id)
            .cloned()
            .ok_or_else(|| anyhow!("Unknown User"))
    }

    async fn guild_members(&self, guild_id: &str) -> Vec<MemberSummary> {
        self.members
            .get(guild_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.users.get(id))
            .map(|user| MemberSummary {
                id: user.id.clone(),
                username: user.username.clone(),
                display_name: user.display_name.clone(),
            })
            .collect()
    }
}

/// Known guilds plus a log of nickname changes
#[derive(Default)]
pub struct MockGuilds {
    guilds: HashMap<String, GuildSummary>,
    nicknames: Mutex<Vec<(String, String, String)>>,
    fail_nicknames: bool,
}

impl MockGuilds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_guild(mut self, summary: GuildSummary) -> Self {
        self.guilds.insert(summary.id.clone(), summary);
        self
    }

    pub fn refusing_nicknames(mut self) -> Self {
        self.fail_nicknames = true;
        self
    }

    /// `(guild, user, nickname)` in the order they were set
    pub fn nicknames(&self) -> Vec<(String, String, String)> {
        self.nicknames.lock().unwrap().clone()
    }
}

#[async_trait]
impl GuildDirectory for MockGuilds {
    async fn guild_summary(&self, guild_id: &str) -> Result<Option<GuildSummary>> {
        Ok(self.guilds.get(guild_id).cloned())
    }

    async fn set_nickname(&self, guild_id: &str, user_id: &str, nickname: &str) -> Result<()> {
        if self.fail_nicknames {
            bail!("Missing Permissions");
        }
        self.nicknames.lock().unwrap().push((
            guild_id.to_string(),
            user_id.to_string(),
            nickname.to_string(),
        ));
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    guild_prefixes: Mutex<HashMap<String, String>>,
    user_prefixes: Mutex<HashMap<String, String>>,
    blacklist: Mutex<HashMap<String, DateTime<Utc>>>,
    statuses: Mutex<Vec<StatusEntry>>,
    next_status_id: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn load_guild_prefixes(&self) -> Result<HashMap<String, String>> {
        Ok(self.guild_prefixes.lock().unwrap().clone())
    }

    async fn load_user_prefixes(&self) -> Result<HashMap<String, String>> {
        Ok(self.user_prefixes.lock().unwrap().clone())
    }

    async fn load_blacklist(&self) -> Result<HashMap<String, DateTime<Utc>>> {
        Ok(self.blacklist.lock().unwrap().clone())
    }

    async fn set_guild_prefix(&self, guild_id: &str, prefix: Option<&str>) -> Result<()> {
        let mut prefixes = self.guild_prefixes.lock().unwrap();
        match prefix {
            Some(prefix) => prefixes.insert(guild_id.to_string(), prefix.to_string()),
            None => prefixes.remove(guild_id),
        };
        Ok(())
    }

    async fn set_user_prefix(&self, user_id: &str, prefix: Option<&str>) -> Result<()> {
        let mut prefixes = self.user_prefixes.lock().unwrap();
        match prefix {
            Some(prefix) => prefixes.insert(user_id.to_string(), prefix.to_string()),
            None => prefixes.remove(user_id),
        };
        Ok(())
    }

    async fn set_blacklisted(&self, user_id: &str, since: Option<DateTime<Utc>>) -> Result<()> {
        let mut blacklist = self.blacklist.lock().unwrap();
        match since {
            Some(since) => blacklist.insert(user_id.to_string(), since),
            None => blacklist.remove(user_id),
        };
        Ok(())
    }

    async fn list_statuses(&self) -> Result<Vec<StatusEntry>> {
        Ok(self.statuses.lock().unwrap().clone())
    }

    async fn add_status(&self, status: &NewStatus) -> Result<StatusEntry> {
        let id = self.next_status_id.fetch_add(1, Ordering::SeqCst) as i64 + 1;
        let entry = StatusEntry {
            id,
            kind: status.kind,
            text: status.text.clone(),
            url: status.url.clone(),
        };
        self.statuses.lock().unwrap().push(entry.clone());
        Ok(entry)
    }

    async fn remove_status(&self, id: i64) -> Result<Option<StatusEntry>> {
        let mut statuses = self.statuses.lock().unwrap();
        let index = statuses.iter().position(|s| s.id == id);
        Ok(index.map(|i| statuses.remove(i)))
    }
}

/// Completion provider with a canned or echoed reply
#[derive(Default)]
pub struct ScriptedProvider {
    reply: Option<String>,
    delay: Duration,
    fail_on: Option<String>,
    calls: AtomicUsize,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedProvider {
    /// Replies with the content of the last turn
    pub fn echo() -> Self {
        Self::default()
    }

    pub fn replying(text: &str) -> Self {
        Self {
            reply: Some(text.to_string()),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fail whenever the last turn contains `marker`
    pub fn failing_on(mut self, marker: &str) -> Self {
        self.fail_on = Some(marker.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, turns: &[ConversationTurn]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(active, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        let last = turns.last().map(|t| t.content.clone()).unwrap_or_default();
        if let Some(marker) = &self.fail_on {
            if last.contains(marker.as_str()) {
                bail!("scripted failure");
            }
        }
        Ok(self.reply.clone().unwrap_or(last))
    }
}

pub struct RecordingPresence {
    guilds: usize,
    users: usize,
    applied: Mutex<Vec<(StatusKind, String, Option<String>)>>,
}

impl RecordingPresence {
    pub fn new(guilds: usize, users: usize) -> Self {
        Self {
            guilds,
            users,
            applied: Mutex::new(Vec::new()),
        }
    }

    pub fn last(&self) -> Option<(StatusKind, String, Option<String>)> {
        self.applied.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl PresenceTarget for RecordingPresence {
    async fn set_activity(&self, kind: StatusKind, text: &str, url: Option<&str>) {
        self.applied
            .lock()
            .unwrap()
            .push((kind, text.to_string(), url.map(String::from)));
    }

    fn guild_count(&self) -> usize {
        self.guilds
    }

    fn user_count(&self) -> usize {
        self.users
    }
}

pub fn test_config() -> Config {
    Config {
        discord_token: "token".to_string(),
        owner_id: OWNER_ID.to_string(),
        ..Config::default()
    }
}

/// Context with the real command set and an in-memory store
pub fn test_context() -> Arc<CommandContext> {
    let registry = create_registry().unwrap();
    test_context_with(registry)
}

pub fn test_context_with(registry: CommandRegistry) -> Arc<CommandContext> {
    Arc::new(CommandContext::new(
        test_config(),
        registry,
        Arc::new(MemoryStore::new()),
        None,
    ))
}

/// Context whose AI queue answers through `provider`; needs a runtime
pub fn test_context_with_ai(provider: Arc<dyn CompletionProvider>) -> Arc<CommandContext> {
    let config = test_config();
    let queue = crate::features::ai::AiQueue::new(
        provider,
        crate::features::ai::QueueSettings::from_config(&config),
    );
    Arc::new(CommandContext::new(
        config,
        create_registry().unwrap(),
        Arc::new(MemoryStore::new()),
        Some(queue),
    ))
}

pub fn invocation(
    prefix: &str,
    caller_id: &str,
    guild_id: Option<&str>,
) -> (Invocation, Arc<RecordingResponder>) {
    invocation_with(prefix, caller_id, guild_id, StaticPermissions::all())
}

pub fn invocation_with(
    prefix: &str,
    caller_id: &str,
    guild_id: Option<&str>,
    permissions: StaticPermissions,
) -> (Invocation, Arc<RecordingResponder>) {
    let users = MockUsers::new()
        .with_user(caller_id, "caller", false)
        .with_user("2000", "alice", false)
        .with_user("3000", "helperbot", true)
        .with_member("10", caller_id)
        .with_member("10", "2000")
        .with_member("10", "3000");
    invocation_full(prefix, caller_id, guild_id, permissions, users)
}

pub fn invocation_full(
    prefix: &str,
    caller_id: &str,
    guild_id: Option<&str>,
    permissions: StaticPermissions,
    users: MockUsers,
) -> (Invocation, Arc<RecordingResponder>) {
    let responder = Arc::new(RecordingResponder::new());
    let invocation = Invocation {
        caller: Caller {
            id: caller_id.to_string(),
            name: "caller".to_string(),
            bot: false,
        },
        guild_id: guild_id.map(String::from),
        channel_id: "20".to_string(),
        prefix: prefix.to_string(),
        sent_at: Utc::now(),
        responder: responder.clone(),
        permissions: Arc::new(permissions),
        users: Arc::new(users),
        guilds: Arc::new(MockGuilds::new()),
    };
    (invocation, responder)
}
