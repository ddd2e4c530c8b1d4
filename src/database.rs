//! # Database
//!
//! SQLite persistence for prefixes, the blacklist and presence statuses.
//! Everything here is loaded into in-memory caches at startup; commands that
//! change state write here first and then update the cache.
//!
//! - **Version**: 2.0.1
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.1: Open with a serialized connection
//! - 2.0.0: Store trait, prefix/blacklist/status tables
//! - 1.0.0: Initial SQLite database

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{info, warn};
use sqlite::{Connection, ConnectionWithFullMutex, State};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::features::presence::{NewStatus, StatusEntry, StatusKind};

/// Persistence used by the bot's caches and dev commands
#[async_trait]
pub trait Store: Send + Sync {
    async fn load_guild_prefixes(&self) -> Result<HashMap<String, String>>;
    async fn load_user_prefixes(&self) -> Result<HashMap<String, String>>;
    async fn load_blacklist(&self) -> Result<HashMap<String, DateTime<Utc>>>;

    /// `None` clears the prefix
    async fn set_guild_prefix(&self, guild_id: &str, prefix: Option<&str>) -> Result<()>;
    async fn set_user_prefix(&self, user_id: &str, prefix: Option<&str>) -> Result<()>;
    /// `None` lifts the blacklist
    async fn set_blacklisted(&self, user_id: &str, since: Option<DateTime<Utc>>) -> Result<()>;

    async fn list_statuses(&self) -> Result<Vec<StatusEntry>>;
    async fn add_status(&self, status: &NewStatus) -> Result<StatusEntry>;
    /// Returns the removed row, or `None` when no status had that id
    async fn remove_status(&self, id: i64) -> Result<Option<StatusEntry>>;
}

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS guilds (
        id TEXT PRIMARY KEY,
        prefix TEXT
    );
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        prefix TEXT,
        blacklisted_since TEXT
    );
    CREATE TABLE IF NOT EXISTS statuses (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        kind TEXT NOT NULL,
        text TEXT NOT NULL,
        url TEXT
    );
";

#[derive(Clone)]
pub struct Database {
    connection: Arc<Mutex<ConnectionWithFullMutex>>,
}

impl Database {
    pub async fn new(path: &str) -> Result<Self> {
        let connection = Connection::open_with_full_mutex(path)
            .with_context(|| format!("Failed to open database at {path}"))?;
        connection
            .execute(SCHEMA)
            .context("Failed to create database schema")?;
        info!("Database ready at {path}");

        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    pub async fn in_memory() -> Result<Self> {
        Self::new(":memory:").await
    }

    async fn load_prefixes(&self, table: &str) -> Result<HashMap<String, String>> {
        let conn = self.connection.lock().await;
        let mut statement = conn.prepare(format!(
            "SELECT id, prefix FROM {table} WHERE prefix IS NOT NULL"
        ))?;

        let mut prefixes = HashMap::new();
        while let State::Row = statement.next()? {
            prefixes.insert(
                statement.read::<String, _>("id")?,
                statement.read::<String, _>("prefix")?,
            );
        }
        Ok(prefixes)
    }

    async fn set_prefix(&self, table: &str, id: &str, prefix: Option<&str>) -> Result<()> {
        let conn = self.connection.lock().await;
        match prefix {
            Some(prefix) => {
                let mut statement = conn.prepare(format!(
                    "INSERT INTO {table} (id, prefix) VALUES (?, ?)
                     ON CONFLICT(id) DO UPDATE SET prefix = excluded.prefix"
                ))?;
                statement.bind((1, id))?;
                statement.bind((2, prefix))?;
                statement.next()?;
            }
            None => {
                let mut statement =
                    conn.prepare(format!("UPDATE {table} SET prefix = NULL WHERE id = ?"))?;
                statement.bind((1, id))?;
                statement.next()?;
            }
        }
        Ok(())
    }
}

fn read_status(statement: &sqlite::Statement<'_>) -> Result<Option<StatusEntry>> {
    let id = statement.read::<i64, _>("id")?;
    let kind_name = statement.read::<String, _>("kind")?;
    let Some(kind) = StatusKind::parse(&kind_name) else {
        warn!("Skipping status {id} with unknown kind {kind_name:?}");
        return Ok(None);
    };
    let url = statement.read::<String, _>("url")?;

    Ok(Some(StatusEntry {
        id,
        kind,
        text: statement.read::<String, _>("text")?,
        url: (!url.is_empty()).then_some(url),
    }))
}

#[async_trait]
impl Store for Database {
    async fn load_guild_prefixes(&self) -> Result<HashMap<String, String>> {
        self.load_prefixes("guilds").await
    }

    async fn load_user_prefixes(&self) -> Result<HashMap<String, String>> {
        self.load_prefixes("users").await
    }

    async fn load_blacklist(&self) -> Result<HashMap<String, DateTime<Utc>>> {
        let conn = self.connection.lock().await;
        let mut statement = conn.prepare(
            "SELECT id, blacklisted_since FROM users WHERE blacklisted_since IS NOT NULL",
        )?;

        let mut entries = HashMap::new();
        while let State::Row = statement.next()? {
            let id = statement.read::<String, _>("id")?;
            let raw = statement.read::<String, _>("blacklisted_since")?;
            match DateTime::parse_from_rfc3339(&raw) {
                Ok(since) => {
                    entries.insert(id, since.with_timezone(&Utc));
                }
                Err(e) => warn!("Ignoring bad blacklist timestamp for {id}: {e}"),
            }
        }
        Ok(entries)
    }

    async fn set_guild_prefix(&self, guild_id: &str, prefix: Option<&str>) -> Result<()> {
        self.set_prefix("guilds", guild_id, prefix).await
    }

    async fn set_user_prefix(&self, user_id: &str, prefix: Option<&str>) -> Result<()> {
        self.set_prefix("users", user_id, prefix).await
    }

    async fn set_blacklisted(&self, user_id: &str, since: Option<DateTime<Utc>>) -> Result<()> {
        let conn = self.connection.lock().await;
        match since {
            Some(since) => {
                let mut statement = conn.prepare(
                    "INSERT INTO users (id, blacklisted_since) VALUES (?, ?)
                     ON CONFLICT(id) DO UPDATE SET blacklisted_since = excluded.blacklisted_since",
                )?;
                statement.bind((1, user_id))?;
                statement.bind((2, since.to_rfc3339().as_str()))?;
                statement.next()?;
            }
            None => {
                let mut statement =
                    conn.prepare("UPDATE users SET blacklisted_since = NULL WHERE id = ?")?;
                statement.bind((1, user_id))?;
                statement.next()?;
            }
        }
        Ok(())
    }

    async fn list_statuses(&self) -> Result<Vec<StatusEntry>> {
        let conn = self.connection.lock().await;
        let mut statement = conn
            .prepare("SELECT id, kind, text, COALESCE(url, '') AS url FROM statuses ORDER BY id")?;

        let mut statuses = Vec::new();
        while let State::Row = statement.next()? {
            if let Some(status) = read_status(&statement)? {
                statuses.push(status);
            }
        }
        Ok(statuses)
    }

    async fn add_status(&self, status: &NewStatus) -> Result<StatusEntry> {
        let conn = self.connection.lock().await;

        let mut statement = match &status.url {
            Some(url) => {
                let mut statement =
                    conn.prepare("INSERT INTO statuses (kind, text, url) VALUES (?, ?, ?)")?;
                statement.bind((3, url.as_str()))?;
                statement
            }
            None => conn.prepare("INSERT INTO statuses (kind, text) VALUES (?, ?)")?,
        };
        statement.bind((1, status.kind.as_str()))?;
        statement.bind((2, status.text.as_str()))?;
        statement.next()?;

        let mut statement = conn.prepare("SELECT last_insert_rowid() AS id")?;
        statement.next()?;
        let id = statement.read::<i64, _>("id")?;

        Ok(StatusEntry {
            id,
            kind: status.kind,
            text: status.text.clone(),
            url: status.url.clone(),
        })
    }

    async fn remove_status(&self, id: i64) -> Result<Option<StatusEntry>> {
        let conn = self.connection.lock().await;

        let mut statement = conn.prepare(
            "SELECT id, kind, text, COALESCE(url, '') AS url FROM statuses WHERE id = ?",
        )?;
        statement.bind((1, id))?;
        let existing = match statement.next()? {
            State::Row => read_status(&statement)?,
            State::Done => None,
        };
        drop(statement);

        let mut statement = conn.prepare("DELETE FROM statuses WHERE id = ?")?;
        statement.bind((1, id))?;
        statement.next()?;

        Ok(existing)
    }
}
