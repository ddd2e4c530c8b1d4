//! # Features
//!
//! Self-contained pieces of bot behaviour used by commands and the gateway.
//!
//! - **Version**: 2.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.1.0: Guild summaries and nicknames
//! - 2.0.0: Prefixes, blacklist, targets, AI queue and presence
//! - 1.0.0: Initial feature layout

pub mod ai;
pub mod blacklist;
pub mod guilds;
pub mod prefixes;
pub mod presence;
pub mod rate_limiting;
pub mod targets;

pub use ai::{AiQueue, CompletionProvider, ConversationTurn, OpenAiProvider, QueueError};
pub use blacklist::Blacklist;
pub use guilds::{GuildDirectory, GuildSummary};
pub use prefixes::PrefixCache;
pub use presence::{Presence, PresenceTarget, StatusKind};
pub use rate_limiting::CooldownTracker;
pub use targets::{TargetError, TargetUser, UserDirectory};
