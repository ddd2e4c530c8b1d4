//! # Core Module
//!
//! Configuration, logging, reply formatting and size limits shared by every layer.
//!
//! - **Version**: 2.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.1.0: Runtime debug logging switch
//! - 2.0.0: Platform-neutral embeds, character based limits
//! - 1.0.0: Initial creation with config and response modules

pub mod config;
pub mod embeds;
pub mod logging;
pub mod response;

pub use config::{Config, ConfigError};
pub use embeds::{colors, Embed, EmbedField};
pub use logging::DebugSwitch;
pub use response::{
    chunk_for_embed, chunk_for_message, chunk_text, escape_markdown, truncate, truncate_for_embed,
    truncate_for_message, with_commas, EMBED_LIMIT, MESSAGE_LIMIT,
};
