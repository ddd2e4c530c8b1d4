//! Command registry
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 2.0.0: Registry holds full command trees with an alias index and is frozen after startup
//! - 1.0.0: Initial implementation for handler dispatch

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use super::command::{Command, CommandBuilder};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("command `{0}` has neither a handler nor subcommands")]
    InertCommand(String),

    #[error("command `{parent}` declares subcommand `{name}` twice")]
    DuplicateSubcommand { parent: String, name: String },

    #[error("command name `{0}` is already registered")]
    DuplicateName(String),

    #[error("alias `{alias}` of `{command}` collides with an existing name or alias")]
    DuplicateAlias { alias: String, command: String },

    #[error("`{0}` is not a valid command name (lowercase, no whitespace)")]
    InvalidName(String),
}

/// Result of walking an argument list down a command tree
#[derive(Debug)]
pub struct Resolved<'a> {
    pub root: &'a Command,
    /// Innermost command that matched
    pub command: &'a Command,
    /// Canonical names from the root to `command`
    pub path: Vec<&'a str>,
    /// Tokens left for the handler, casing preserved
    pub args: Vec<String>,
}

impl Resolved<'_> {
    pub fn qualified_name(&self) -> String {
        self.path.join(" ")
    }
}

/// Immutable mapping from command name (or alias) to command tree
///
/// Built once at startup through [`RegistryBuilder`] and shared behind an `Arc`.
///
/// # Example
///
/// ```ignore
/// let registry = CommandRegistry::builder()
///     .command(Command::builder("ping", "Ping the bot").handler(Ping))
///     .build()?;
///
/// let resolved = registry.resolve(&["ping".into(), "stats".into()]);
/// ```
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Arc<Command>>,
    aliases: HashMap<String, String>,
}

impl CommandRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Look up a root command by canonical name, then by alias
    pub fn get(&self, name: &str) -> Option<&Arc<Command>> {
        self.commands.get(name).or_else(|| {
            self.aliases
                .get(name)
                .and_then(|canonical| self.commands.get(canonical))
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Resolve tokens into the deepest matching command.
    ///
    /// The first token is lowercased and looked up by name or alias. Each
    /// following token is lowercased and matched against the current command's
    /// subcommands by exact name; the walk stops at the first token that is not
    /// a subcommand and everything from there on becomes the argument list.
    pub fn resolve(&self, tokens: &[String]) -> Option<Resolved<'_>> {
        let (first, rest) = tokens.split_first()?;
        let root = self.get(&first.to_lowercase())?.as_ref();

        let mut command = root;
        let mut path = vec![root.name.as_str()];
        let mut consumed = 0;

        for token in rest {
            match command.subcommand(&token.to_lowercase()) {
                Some(sub) => {
                    command = sub;
                    path.push(sub.name.as_str());
                    consumed += 1;
                }
                None => break,
            }
        }

        Some(Resolved {
            root,
            command,
            path,
            args: rest[consumed..].to_vec(),
        })
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Root commands sorted by category, then name
    pub fn commands(&self) -> Vec<&Arc<Command>> {
        let mut commands: Vec<_> = self.commands.values().collect();
        commands.sort_by(|a, b| a.category.cmp(&b.category).then_with(|| a.name.cmp(&b.name)));
        commands
    }
}

#[derive(Default)]
pub struct RegistryBuilder {
    pending: Vec<CommandBuilder>,
}

impl RegistryBuilder {
    pub fn command(mut self, command: CommandBuilder) -> Self {
        self.pending.push(command);
        self
    }

    pub fn commands(mut self, commands: impl IntoIterator<Item = CommandBuilder>) -> Self {
        self.pending.extend(commands);
        self
    }

    pub fn build(self) -> Result<CommandRegistry, RegistryError> {
        let mut registry = CommandRegistry::default();

        for builder in self.pending {
            let command = builder.build()?;
            if registry.commands.contains_key(&command.name)
                || registry.aliases.contains_key(&command.name)
            {
                return Err(RegistryError::DuplicateName(command.name));
            }
            registry
                .commands
                .insert(command.name.clone(), Arc::new(command));
        }

        // aliases are indexed after every name is known so order of registration does not matter
        let mut roots: Vec<_> = registry.commands.values().cloned().collect();
        roots.sort_by(|a, b| a.name.cmp(&b.name));
        for command in roots {
            for alias in &command.aliases {
                if registry.commands.contains_key(alias) || registry.aliases.contains_key(alias) {
                    return Err(RegistryError::DuplicateAlias {
                        alias: alias.clone(),
                        command: command.name.clone(),
                    });
                }
                registry.aliases.insert(alias.clone(), command.name.clone());
            }
        }

        Ok(registry)
    }
}
