//! # Slash Commands (/)
//!
//! Slash commands are generated from the command registry, so every prefix
//! command (except dev-only ones) is also reachable as `/name`.
//!
//! - Pure namespaces become a slash command with one subcommand option per
//!   subcommand, each taking a free-form `args` string.
//! - Everything else takes a single `args` string, which may start with a
//!   subcommand name (`/prefix args:set !`).
//!
//! Interaction options are folded back into the same token list a prefixed
//! message would produce and go through the same gates.
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 3.0.0: Generated from the command registry
//! - 1.0.0: Initial slash command registration

use anyhow::Result;
use log::info;
use serenity::builder::{CreateApplicationCommand, CreateApplicationCommandOption};
use serenity::json::Value;
use serenity::model::application::command::{Command as ApplicationCommand, CommandOptionType};
use serenity::model::application::interaction::application_command::CommandDataOption;
use serenity::model::id::GuildId;
use serenity::prelude::Context;

use super::command::{Command, CommandKind};
use super::registry::CommandRegistry;
use crate::core::truncate;

/// Name of the free-form string option every command takes
pub const ARGS_OPTION: &str = "args";

/// Discord caps command and option descriptions at 100 characters
const DESCRIPTION_LIMIT: usize = 100;

/// Creates slash command definitions for every public command
pub fn create_slash_commands(registry: &CommandRegistry) -> Vec<CreateApplicationCommand> {
    registry
        .commands()
        .into_iter()
        .filter(|command| !command.dev_only)
        .map(|command| create_command(command))
        .collect()
}

fn create_command(command: &Command) -> CreateApplicationCommand {
    let mut builder = CreateApplicationCommand::default();
    builder
        .name(&command.name)
        .description(describe(&command.description));

    match &command.kind {
        CommandKind::Namespace(subcommands) => {
            for sub in subcommands {
                let mut option = CreateApplicationCommandOption::default();
                option
                    .name(&sub.name)
                    .description(describe(&sub.description))
                    .kind(CommandOptionType::SubCommand)
                    .add_sub_option(args_option("Arguments for this subcommand"));
                builder.add_option(option);
            }
        }
        CommandKind::Leaf(_) => {
            builder.add_option(args_option("Arguments for this command"));
        }
        CommandKind::LeafWithNamespace { .. } => {
            builder.add_option(args_option("Subcommand and arguments"));
        }
    }
    builder
}

fn args_option(description: &str) -> CreateApplicationCommandOption {
    let mut option = CreateApplicationCommandOption::default();
    option
        .name(ARGS_OPTION)
        .description(description)
        .kind(CommandOptionType::String)
        .required(false);
    option
}

fn describe(description: &str) -> String {
    if description.is_empty() {
        "No description".to_string()
    } else {
        truncate(description, DESCRIPTION_LIMIT)
    }
}

/// An interaction option reduced to what token building needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashOption {
    SubCommand { name: String, options: Vec<SlashOption> },
    Value { name: String, value: String },
}

impl From<&CommandDataOption> for SlashOption {
    fn from(option: &CommandDataOption) -> Self {
        match option.kind {
            CommandOptionType::SubCommand | CommandOptionType::SubCommandGroup => {
                SlashOption::SubCommand {
                    name: option.name.clone(),
                    options: option.options.iter().map(SlashOption::from).collect(),
                }
            }
            _ => SlashOption::Value {
                name: option.name.clone(),
                value: match &option.value {
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                    None => String::new(),
                },
            },
        }
    }
}

/// Fold a slash invocation into the token list a prefixed message would give
pub fn interaction_tokens(command_name: &str, options: &[SlashOption]) -> Vec<String> {
    let mut tokens = vec![command_name.to_string()];
    push_option_tokens(&mut tokens, options);
    tokens
}

fn push_option_tokens(tokens: &mut Vec<String>, options: &[SlashOption]) {
    for option in options {
        match option {
            SlashOption::SubCommand { name, options } => {
                tokens.push(name.clone());
                push_option_tokens(tokens, options);
            }
            SlashOption::Value { value, .. } => {
                tokens.extend(value.split_whitespace().map(String::from));
            }
        }
    }
}

/// Registers slash commands globally, or for one guild when given (faster for testing)
pub async fn register_commands(
    ctx: &Context,
    registry: &CommandRegistry,
    guild_id: Option<GuildId>,
) -> Result<()> {
    let commands = create_slash_commands(registry);
    let count = commands.len();

    match guild_id {
        Some(guild_id) => {
            guild_id
                .set_application_commands(&ctx.http, |builder| {
                    for command in commands {
                        builder.add_application_command(command);
                    }
                    builder
                })
                .await?;
            info!("Guild slash commands registered for guild {guild_id} ({count} commands)");
        }
        None => {
            ApplicationCommand::set_global_application_commands(&ctx.http, |builder| {
                for command in commands {
                    builder.add_application_command(command);
                }
                builder
            })
            .await?;
            info!("Global slash commands registered successfully ({count} commands)");
        }
    }
    Ok(())
}
