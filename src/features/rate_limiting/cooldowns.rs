//! Per-command cooldowns
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Keyed by (root command, user) with a fixed expiry instead of a sliding window
//! - 1.0.0: Initial release with per-user sliding window rate limiting

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Composite key: (root command name, user id)
type CooldownKey = (String, String);

/// Prune expired entries once the map grows past this many keys
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Clone, Default)]
pub struct CooldownTracker {
    expiries: Arc<DashMap<CooldownKey, Instant>>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn make_key(command: &str, user_id: &str) -> CooldownKey {
        (command.to_string(), user_id.to_string())
    }

    /// Check and start a cooldown in one step.
    ///
    /// Returns `Err(remaining)` while a previous use is still cooling down,
    /// otherwise records `now + cooldown` and returns `Ok(())`. The check and
    /// the write happen under the same shard lock.
    pub fn try_acquire(&self, command: &str, user_id: &str, cooldown: Duration) -> Result<(), Duration> {
        self.try_acquire_at(command, user_id, cooldown, Instant::now())
    }

    fn try_acquire_at(
        &self,
        command: &str,
        user_id: &str,
        cooldown: Duration,
        now: Instant,
    ) -> Result<(), Duration> {
        if cooldown.is_zero() {
            return Ok(());
        }

        if self.expiries.len() > PRUNE_THRESHOLD {
            self.prune_at(now);
        }

        match self.expiries.entry(Self::make_key(command, user_id)) {
            Entry::Occupied(mut entry) => {
                let expires = *entry.get();
                if expires > now {
                    return Err(expires - now);
                }
                entry.insert(now + cooldown);
            }
            Entry::Vacant(entry) => {
                entry.insert(now + cooldown);
            }
        }
        Ok(())
    }

    /// Time left before `user_id` may run `command` again
    pub fn remaining(&self, command: &str, user_id: &str) -> Option<Duration> {
        let key = Self::make_key(command, user_id);
        let expires = *self.expiries.get(&key)?;
        expires.checked_duration_since(Instant::now())
    }

    /// Drop every entry whose cooldown is over
    pub fn prune(&self) {
        self.prune_at(Instant::now());
    }

    fn prune_at(&self, now: Instant) {
        self.expiries.retain(|_, expires| *expires > now);
    }

    pub fn len(&self) -> usize {
        self.expiries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expiries.is_empty()
    }
}

/// "Please wait 2.5 more seconds before reusing the `ai` command."
pub fn cooldown_message(remaining: Duration, command: &str) -> String {
    let seconds = remaining.as_secs_f64();
    let unit = if (seconds * 10.0).round() == 10.0 { "second" } else { "seconds" };
    format!(
        "Please wait {:.1} more {} before reusing the `{}` command.",
        seconds, unit, command
    )
}
