//! Per-command handler implementations
//!
//! Each module exposes `commands()`, the builders for the command trees it
//! owns; [`create_registry`] collects them into the frozen registry.
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 3.0.0: Prefix command trees (general, users, fun, admin, ai, dev)
//! - 1.0.0: Initial split into per-area handler modules

pub mod admin;
pub mod ai;
pub mod dev;
pub mod fun;
pub mod general;
pub mod users;

use super::registry::{CommandRegistry, RegistryError};

/// Build the registry with every command the bot ships
pub fn create_registry() -> Result<CommandRegistry, RegistryError> {
    CommandRegistry::builder()
        .commands(general::commands())
        .commands(users::commands())
        .commands(fun::commands())
        .commands(admin::commands())
        .commands(ai::commands())
        .commands(dev::commands())
        .build()
}
