//! # Feature: Blacklist
//!
//! Users who are refused every command. Loaded from the store at startup and
//! kept in sync by the `blacklist` developer command.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.3.0
//! - **Toggleable**: false

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;

pub const BLACKLISTED_MESSAGE: &str = "You are blacklisted from using the bot.";

#[derive(Clone, Default)]
pub struct Blacklist {
    entries: Arc<DashMap<String, DateTime<Utc>>>,
}

impl Blacklist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self, entries: HashMap<String, DateTime<Utc>>) {
        self.entries.clear();
        for (user_id, since) in entries {
            self.entries.insert(user_id, since);
        }
    }

    pub fn is_blacklisted(&self, user_id: &str) -> bool {
        self.entries.contains_key(user_id)
    }

    pub fn since(&self, user_id: &str) -> Option<DateTime<Utc>> {
        self.entries.get(user_id).map(|since| *since)
    }

    /// Returns false when the user was already listed
    pub fn add(&self, user_id: &str, since: DateTime<Utc>) -> bool {
        self.entries.insert(user_id.to_string(), since).is_none()
    }

    /// Returns false when the user was not listed
    pub fn remove(&self, user_id: &str) -> bool {
        self.entries.remove(user_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
