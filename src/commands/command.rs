//! Command definitions and their builder
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.1.0: Dev-only is set per subcommand instead of inherited
//! - 1.0.0: Tagged command kinds, inherited gates for subcommands

use serenity::model::Permissions;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::handler::CommandHandler;
use super::registry::RegistryError;

pub const UNCATEGORIZED: &str = "uncategorized";

/// What happens when a command is the innermost match of an invocation
#[derive(Clone)]
pub enum CommandKind {
    Leaf(Arc<dyn CommandHandler>),
    /// Only groups subcommands, invoking it directly shows usage
    Namespace(Vec<Command>),
    /// Runs its handler unless a subcommand matches first
    LeafWithNamespace {
        handler: Arc<dyn CommandHandler>,
        subcommands: Vec<Command>,
    },
}

#[derive(Clone)]
pub struct Command {
    pub name: String,
    pub description: String,
    pub aliases: Vec<String>,
    pub kind: CommandKind,
    pub dev_only: bool,
    pub caller_permissions: Permissions,
    pub bot_permissions: Permissions,
    pub cooldown: Duration,
    pub category: String,
    pub example: String,
}

impl Command {
    pub fn builder(name: &str, description: &str) -> CommandBuilder {
        CommandBuilder::new(name, description)
    }

    pub fn handler(&self) -> Option<&Arc<dyn CommandHandler>> {
        match &self.kind {
            CommandKind::Leaf(handler) | CommandKind::LeafWithNamespace { handler, .. } => {
                Some(handler)
            }
            CommandKind::Namespace(_) => None,
        }
    }

    pub fn subcommands(&self) -> &[Command] {
        match &self.kind {
            CommandKind::Namespace(subcommands)
            | CommandKind::LeafWithNamespace { subcommands, .. } => subcommands,
            CommandKind::Leaf(_) => &[],
        }
    }

    /// Exact-name lookup among direct children
    pub fn subcommand(&self, name: &str) -> Option<&Command> {
        self.subcommands().iter().find(|sub| sub.name == name)
    }

    pub fn has_cooldown(&self) -> bool {
        !self.cooldown.is_zero()
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("has_handler", &self.handler().is_some())
            .field("subcommands", &self.subcommands())
            .field("dev_only", &self.dev_only)
            .field("cooldown", &self.cooldown)
            .field("category", &self.category)
            .finish()
    }
}

/// Builder for [`Command`]; `build` refuses inert commands and duplicate siblings
pub struct CommandBuilder {
    name: String,
    description: String,
    aliases: Vec<String>,
    handler: Option<Arc<dyn CommandHandler>>,
    subcommands: Vec<CommandBuilder>,
    dev_only: bool,
    caller_permissions: Permissions,
    bot_permissions: Permissions,
    cooldown: Duration,
    category: Option<String>,
    example: String,
}

/// Gates a parent passes down to its subcommands; `dev_only` stays per command
struct Inherited<'a> {
    path: String,
    caller_permissions: Permissions,
    bot_permissions: Permissions,
    category: &'a str,
}

impl CommandBuilder {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            aliases: Vec::new(),
            handler: None,
            subcommands: Vec::new(),
            dev_only: false,
            caller_permissions: Permissions::empty(),
            bot_permissions: Permissions::empty(),
            cooldown: Duration::ZERO,
            category: None,
            example: String::new(),
        }
    }

    pub fn handler(mut self, handler: impl CommandHandler + 'static) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    pub fn aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases.extend(aliases.iter().map(|a| a.to_string()));
        self
    }

    pub fn sub(mut self, subcommand: CommandBuilder) -> Self {
        self.subcommands.push(subcommand);
        self
    }

    pub fn dev_only(mut self) -> Self {
        self.dev_only = true;
        self
    }

    pub fn caller_permissions(mut self, permissions: Permissions) -> Self {
        self.caller_permissions |= permissions;
        self
    }

    pub fn bot_permissions(mut self, permissions: Permissions) -> Self {
        self.bot_permissions |= permissions;
        self
    }

    pub fn cooldown_secs(mut self, seconds: u64) -> Self {
        self.cooldown = Duration::from_secs(seconds);
        self
    }

    pub fn category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    pub fn example(mut self, example: &str) -> Self {
        self.example = example.to_string();
        self
    }

    pub fn build(self) -> Result<Command, RegistryError> {
        self.build_under(None)
    }

    fn build_under(self, parent: Option<&Inherited<'_>>) -> Result<Command, RegistryError> {
        validate_name(&self.name)?;

        let path = match parent {
            Some(parent) => format!("{} {}", parent.path, self.name),
            None => self.name.clone(),
        };

        let mut caller_permissions = self.caller_permissions;
        let mut bot_permissions = self.bot_permissions;
        let mut category = self.category;
        if let Some(parent) = parent {
            caller_permissions |= parent.caller_permissions;
            bot_permissions |= parent.bot_permissions;
            if category.is_none() {
                category = Some(parent.category.to_string());
            }
        }
        let category = category.unwrap_or_else(|| UNCATEGORIZED.to_string());

        let inherited = Inherited {
            path: path.clone(),
            caller_permissions,
            bot_permissions,
            category: &category,
        };

        let mut subcommands: Vec<Command> = Vec::with_capacity(self.subcommands.len());
        for builder in self.subcommands {
            let sub = builder.build_under(Some(&inherited))?;
            if subcommands.iter().any(|existing| existing.name == sub.name) {
                return Err(RegistryError::DuplicateSubcommand {
                    parent: path,
                    name: sub.name,
                });
            }
            subcommands.push(sub);
        }

        let kind = match (self.handler, subcommands.is_empty()) {
            (Some(handler), true) => CommandKind::Leaf(handler),
            (Some(handler), false) => CommandKind::LeafWithNamespace {
                handler,
                subcommands,
            },
            (None, false) => CommandKind::Namespace(subcommands),
            (None, true) => return Err(RegistryError::InertCommand(path)),
        };

        for alias in &self.aliases {
            validate_name(alias)?;
        }

        Ok(Command {
            name: self.name,
            description: self.description,
            aliases: self.aliases,
            kind,
            dev_only: self.dev_only,
            caller_permissions,
            bot_permissions,
            cooldown: self.cooldown,
            category,
            example: self.example,
        })
    }
}

/// Names are matched against lowercased tokens, so they must be lowercase single words
fn validate_name(name: &str) -> Result<(), RegistryError> {
    let valid = !name.is_empty()
        && !name.chars().any(char::is_whitespace)
        && name.to_lowercase() == name;
    if valid {
        Ok(())
    } else {
        Err(RegistryError::InvalidName(name.to_string()))
    }
}
