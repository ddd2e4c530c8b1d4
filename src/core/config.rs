//! Process configuration loaded from the environment
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.0.0: Owner id, default prefix and AI queue tuning read from env

use std::env;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_PREFIX: &str = "d.";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    /// The single account allowed to run dev-only commands
    pub owner_id: String,
    pub default_prefix: String,
    pub bot_name: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub database_path: String,
    pub log_level: String,
    pub discord_guild_id: Option<String>,
    pub ai_cooldown: Duration,
    pub ai_max_concurrent: usize,
    /// 0 means unbounded
    pub ai_max_queue: usize,
    pub status_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            discord_token: String::new(),
            owner_id: String::new(),
            default_prefix: DEFAULT_PREFIX.to_string(),
            bot_name: "Daisy".to_string(),
            openai_api_key: None,
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            database_path: "daisy.db".to_string(),
            log_level: "info".to_string(),
            discord_guild_id: None,
            ai_cooldown: Duration::from_millis(3000),
            ai_max_concurrent: 2,
            ai_max_queue: 0,
            status_interval: Duration::from_secs(300),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let discord_token = required("DISCORD_TOKEN")?;
        let owner_id = required("OWNER_ID")?;
        if !is_snowflake(&owner_id) {
            return Err(ConfigError::Invalid {
                name: "OWNER_ID",
                value: owner_id,
            });
        }

        let discord_guild_id = optional("DISCORD_GUILD_ID");
        if let Some(id) = &discord_guild_id {
            if !is_snowflake(id) {
                return Err(ConfigError::Invalid {
                    name: "DISCORD_GUILD_ID",
                    value: id.clone(),
                });
            }
        }

        Ok(Self {
            discord_token,
            owner_id,
            default_prefix: optional("DEFAULT_PREFIX")
                .map(|p| p.to_lowercase())
                .unwrap_or(defaults.default_prefix),
            bot_name: optional("BOT_NAME").unwrap_or(defaults.bot_name),
            openai_api_key: optional("OPENAI_API_KEY"),
            openai_model: optional("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            database_path: optional("DATABASE_PATH").unwrap_or(defaults.database_path),
            log_level: optional("LOG_LEVEL").unwrap_or(defaults.log_level),
            discord_guild_id,
            ai_cooldown: Duration::from_millis(parse_or("AI_COOLDOWN_MS", 3000)?),
            ai_max_concurrent: parse_or("AI_MAX_CONCURRENT", 2)?.max(1) as usize,
            ai_max_queue: parse_or("AI_MAX_QUEUE", 0)? as usize,
            status_interval: Duration::from_secs(parse_or("STATUS_INTERVAL_SECS", 300)?.max(15)),
        })
    }

    /// Whether the AI completion path can be used at all
    pub fn ai_enabled(&self) -> bool {
        self.openai_api_key.is_some()
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::Missing(name))
}

fn optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match optional(name) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

fn is_snowflake(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}
