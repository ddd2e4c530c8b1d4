//! Prefix cache and resolution
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.3.0
//!
//! ## Changelog
//! - 1.0.0: User and guild overrides next to the configured default

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

pub const MAX_PREFIX_LEN: usize = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PrefixError {
    #[error("The prefix cannot be empty.")]
    Empty,

    #[error("The prefix cannot be longer than {MAX_PREFIX_LEN} characters.")]
    TooLong,

    #[error("The prefix cannot contain spaces.")]
    Whitespace,
}

/// In-memory view of every prefix override
///
/// The store is written first by the commands that change prefixes; this
/// cache is what message dispatch reads.
#[derive(Clone)]
pub struct PrefixCache {
    default: String,
    users: Arc<DashMap<String, String>>,
    guilds: Arc<DashMap<String, String>>,
}

impl PrefixCache {
    pub fn new(default: &str) -> Self {
        Self {
            default: default.to_lowercase(),
            users: Arc::new(DashMap::new()),
            guilds: Arc::new(DashMap::new()),
        }
    }

    pub fn default_prefix(&self) -> &str {
        &self.default
    }

    /// Replace the cached overrides with what was loaded from the store
    pub fn load(&self, users: HashMap<String, String>, guilds: HashMap<String, String>) {
        self.users.clear();
        self.guilds.clear();
        for (id, prefix) in users {
            self.users.insert(id, prefix);
        }
        for (id, prefix) in guilds {
            self.guilds.insert(id, prefix);
        }
    }

    pub fn user_prefix(&self, user_id: &str) -> Option<String> {
        self.users.get(user_id).map(|p| p.clone())
    }

    pub fn guild_prefix(&self, guild_id: &str) -> Option<String> {
        self.guilds.get(guild_id).map(|p| p.clone())
    }

    pub fn set_user_prefix(&self, user_id: &str, prefix: Option<&str>) {
        match prefix {
            Some(prefix) => {
                self.users.insert(user_id.to_string(), prefix.to_lowercase());
            }
            None => {
                self.users.remove(user_id);
            }
        }
    }

    pub fn set_guild_prefix(&self, guild_id: &str, prefix: Option<&str>) {
        match prefix {
            Some(prefix) => {
                self.guilds.insert(guild_id.to_string(), prefix.to_lowercase());
            }
            None => {
                self.guilds.remove(guild_id);
            }
        }
    }

    /// Which prefix, if any, the message starts with.
    ///
    /// Candidates are tried in order: the default, the caller's own prefix,
    /// then the guild prefix (guild messages only). Comparison is
    /// case-insensitive and the returned prefix is the lowercased candidate.
    pub fn resolve(&self, text: &str, user_id: &str, guild_id: Option<&str>) -> Option<String> {
        let lowered = text.to_lowercase();

        let mut candidates = vec![self.default.clone()];
        if let Some(prefix) = self.user_prefix(user_id) {
            candidates.push(prefix);
        }
        if let Some(prefix) = guild_id.and_then(|id| self.guild_prefix(id)) {
            candidates.push(prefix);
        }

        candidates
            .into_iter()
            .filter(|candidate| !candidate.is_empty())
            .find(|candidate| lowered.starts_with(candidate.as_str()))
    }
}

/// Check a prefix a user asked for, returning it lowercased
pub fn validate_prefix(prefix: &str) -> Result<String, PrefixError> {
    if prefix.is_empty() {
        return Err(PrefixError::Empty);
    }
    if prefix.chars().any(char::is_whitespace) {
        return Err(PrefixError::Whitespace);
    }
    if prefix.chars().count() > MAX_PREFIX_LEN {
        return Err(PrefixError::TooLong);
    }
    Ok(prefix.to_lowercase())
}

/// Strip a matched prefix off the front of a message.
///
/// The prefix was matched against the lowercased text, so the cut is made by
/// character count to stay on a char boundary of the original.
pub fn strip_prefix<'a>(text: &'a str, prefix: &str) -> &'a str {
    let count = prefix.chars().count();
    match text.char_indices().nth(count) {
        Some((index, _)) => &text[index..],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> PrefixCache {
        let cache = PrefixCache::new("d.");
        cache.set_user_prefix("100", Some("!"));
        cache.set_guild_prefix("900", Some("?"));
        cache
    }

    #[test]
    fn test_default_prefix_matches() {
        assert_eq!(cache().resolve("d.ping", "1", None), Some("d.".to_string()));
    }

    #[test]
    fn test_match_is_case_insensitive() {
        assert_eq!(cache().resolve("D.PING", "1", None), Some("d.".to_string()));
    }

    #[test]
    fn test_user_prefix_applies_everywhere() {
        let cache = cache();
        assert_eq!(cache.resolve("!ping", "100", None), Some("!".to_string()));
        assert_eq!(cache.resolve("!ping", "100", Some("555")), Some("!".to_string()));
        assert_eq!(cache.resolve("!ping", "200", None), None);
    }

    #[test]
    fn test_guild_prefix_only_in_guild() {
        let cache = cache();
        assert_eq!(cache.resolve("?ping", "1", Some("900")), Some("?".to_string()));
        assert_eq!(cache.resolve("?ping", "1", None), None);
        assert_eq!(cache.resolve("?ping", "1", Some("901")), None);
    }

    #[test]
    fn test_default_wins_over_overrides() {
        let cache = PrefixCache::new("d.");
        cache.set_user_prefix("1", Some("d"));
        assert_eq!(cache.resolve("d.ping", "1", None), Some("d.".to_string()));
        assert_eq!(cache.resolve("dping", "1", None), Some("d".to_string()));
    }

    #[test]
    fn test_no_prefix_no_match() {
        assert_eq!(cache().resolve("hello there", "100", Some("900")), None);
    }

    #[test]
    fn test_remove_and_load() {
        let cache = cache();
        cache.set_user_prefix("100", None);
        assert!(cache.user_prefix("100").is_none());

        cache.load(
            HashMap::from([("7".to_string(), "x".to_string())]),
            HashMap::new(),
        );
        assert_eq!(cache.user_prefix("7").as_deref(), Some("x"));
        assert!(cache.guild_prefix("900").is_none());
    }

    #[test]
    fn test_validate_prefix() {
        assert_eq!(validate_prefix("AB"), Ok("ab".to_string()));
        assert_eq!(validate_prefix("abcd"), Err(PrefixError::TooLong));
        assert_eq!(validate_prefix(""), Err(PrefixError::Empty));
        assert_eq!(validate_prefix("a b"), Err(PrefixError::Whitespace));
        assert_eq!(validate_prefix("éé!"), Ok("éé!".to_string()));
    }

    #[test]
    fn test_strip_prefix_multibyte() {
        assert_eq!(strip_prefix("d.ping", "d."), "ping");
        assert_eq!(strip_prefix("ÉÉping", "éé"), "ping");
        assert_eq!(strip_prefix("d.", "d."), "");
    }
}
