//! # Gateway
//!
//! serenity side of the bot: turns messages and interactions into
//! invocations and implements the collaborator traits on top of the cache
//! and HTTP client.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.3.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Guild lookups and shared link buttons
//! - 1.0.0: Message and interaction entry points

pub mod components;
pub mod directory;
pub mod guilds;
pub mod interaction;
pub mod message;
pub mod permissions;
pub mod presence;

pub use directory::SerenityUsers;
pub use guilds::SerenityGuilds;
pub use interaction::{handle_command, InteractionResponder};
pub use message::{handle_message, MessageResponder};
pub use permissions::ChannelPermissions;
pub use presence::GatewayPresence;
