//! # Command System
//!
//! Prefixed message commands and slash commands share one registry and one
//! gate chain.
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 3.0.0: Command trees with aliases, dispatch gates, prefix commands back
//! - 2.1.0: Add modular handler infrastructure (handler trait, context, registry)
//! - 2.0.0: Remove bang commands, slash-only command system
//! - 1.0.0: Initial reorganization with modular command structure

pub mod command;
pub mod context;
pub mod dispatch;
pub mod handler;
pub mod handlers;
pub mod registry;
pub mod slash;

pub use command::{Command, CommandBuilder, CommandKind};
pub use context::{BotUser, CommandContext};
pub use dispatch::{dispatch, dispatch_path, DispatchOutcome};
pub use handler::{Caller, CommandHandler, Invocation, LinkButton, PermissionSource, Reply, Responder};
pub use registry::{CommandRegistry, RegistryError};
pub use slash::{create_slash_commands, interaction_tokens, register_commands, SlashOption};
