//! # Rate Limiting Feature
//!
//! Per-user, per-command cooldowns checked by the dispatcher.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod cooldowns;

pub use cooldowns::{cooldown_message, CooldownTracker};
