//! Command dispatch
//!
//! Turns an invocation into exactly one handler call or one reply. The gates
//! run in a fixed order and the first one that refuses ends the dispatch:
//!
//! 1. blacklist
//! 2. command lookup and subcommand walk (unknown commands are ignored)
//! 3. dev-only
//! 4. caller permissions
//! 5. bot permissions (guild only)
//! 6. cooldown
//! 7. usage reply for commands without a handler
//! 8. handler, with faults turned into a generic reply
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.3.0
//!
//! ## Changelog
//! - 1.0.0: Shared gate chain for prefixed messages and slash commands

use log::{debug, error, info, warn};
use serenity::model::Permissions;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::context::CommandContext;
use super::handler::{Invocation, Reply};
use super::registry::Resolved;
use crate::core::{colors, Embed};
use crate::features::blacklist::BLACKLISTED_MESSAGE;
use crate::features::prefixes::strip_prefix;
use crate::features::rate_limiting::cooldown_message;

pub const DEV_ONLY_MESSAGE: &str = "This command is only available to the bot owner.";
pub const GUILD_ONLY_MESSAGE: &str = "This command can only be used in a server.";
pub const FAULT_MESSAGE: &str = "Something went wrong while executing the command.";

const BLACKLIST_NOTICE_TTL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    DevOnly,
    GuildOnly,
    CallerPermissions(Permissions),
    BotPermissions(Permissions),
}

/// How a dispatch ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Empty input or unknown command, nothing was sent
    NoCommand,
    Blacklisted,
    Denied(DenyReason),
    RateLimited { remaining: Duration },
    /// The command only groups subcommands, usage was shown
    Usage,
    Invoked,
    /// The handler or a permission lookup failed, the generic reply was sent
    Failed,
}

/// Split command text on whitespace
pub fn tokenize(body: &str) -> Vec<String> {
    body.split_whitespace().map(String::from).collect()
}

/// Dispatch a message that already matched `invocation.prefix`
pub async fn dispatch(
    ctx: &Arc<CommandContext>,
    invocation: &Invocation,
    text: &str,
) -> DispatchOutcome {
    let body = strip_prefix(text, &invocation.prefix);
    dispatch_path(ctx, invocation, tokenize(body)).await
}

/// Run the gate chain for pre-split tokens: a command name, then subcommands
/// and arguments
pub async fn dispatch_path(
    ctx: &Arc<CommandContext>,
    invocation: &Invocation,
    tokens: Vec<String>,
) -> DispatchOutcome {
    let request_id = Uuid::new_v4();
    let caller = &invocation.caller;

    if tokens.is_empty() {
        return DispatchOutcome::NoCommand;
    }

    if ctx.blacklist.is_blacklisted(&caller.id) {
        info!(
            "[{request_id}] Ignoring blacklisted user {} ({})",
            caller.name, caller.id
        );
        send(
            invocation,
            Reply::error(BLACKLISTED_MESSAGE).delete_after(BLACKLIST_NOTICE_TTL),
            request_id,
        )
        .await;
        return DispatchOutcome::Blacklisted;
    }

    let Some(resolved) = ctx.registry.resolve(&tokens) else {
        debug!("[{request_id}] Unknown command {:?}", tokens[0]);
        return DispatchOutcome::NoCommand;
    };
    let command = resolved.command;
    let path = resolved.qualified_name();

    debug!(
        "[{request_id}] Received command {path} from {} ({}) with {} args",
        caller.name,
        caller.id,
        resolved.args.len()
    );

    if let Some(outcome) = check_gates(ctx, invocation, &resolved, &path, request_id).await {
        return outcome;
    }

    let Some(handler) = command.handler() else {
        send(invocation, Reply::embed(usage_embed(&resolved, &invocation.prefix)), request_id).await;
        return DispatchOutcome::Usage;
    };

    info!(
        "[{request_id}] Command {path} executed by {} ({}) in {}",
        caller.name,
        caller.id,
        invocation.guild_id.as_deref().unwrap_or("DM")
    );

    match handler
        .execute(Arc::clone(ctx), invocation, &resolved.args)
        .await
    {
        Ok(()) => DispatchOutcome::Invoked,
        Err(e) => {
            error!("[{request_id}] Command {path} failed: {e:?}");
            send(invocation, Reply::error(FAULT_MESSAGE), request_id).await;
            DispatchOutcome::Failed
        }
    }
}

/// Dev-only, permission and cooldown gates; `Some` when one refused
async fn check_gates(
    ctx: &CommandContext,
    invocation: &Invocation,
    resolved: &Resolved<'_>,
    path: &str,
    request_id: Uuid,
) -> Option<DispatchOutcome> {
    let caller = &invocation.caller;
    let command = resolved.command;

    if command.dev_only && !ctx.is_owner(&caller.id) {
        warn!(
            "[{request_id}] {} ({}) tried dev-only command {path}",
            caller.name, caller.id
        );
        send(invocation, Reply::error(DEV_ONLY_MESSAGE), request_id).await;
        return Some(DispatchOutcome::Denied(DenyReason::DevOnly));
    }

    if !command.caller_permissions.is_empty() {
        if !invocation.in_guild() {
            send(invocation, Reply::error(GUILD_ONLY_MESSAGE), request_id).await;
            return Some(DispatchOutcome::Denied(DenyReason::GuildOnly));
        }
        let have = match invocation.permissions.caller_permissions().await {
            Ok(have) => have.unwrap_or_else(Permissions::empty),
            Err(e) => return Some(lookup_failed(invocation, path, e, request_id).await),
        };
        let missing = missing_permissions(command.caller_permissions, have);
        if !missing.is_empty() {
            info!(
                "[{request_id}] {} ({}) lacks {:?} for {path}",
                caller.name, caller.id, missing
            );
            let text = format!(
                "You are missing the following permissions: `{}`",
                permission_names(missing)
            );
            send(invocation, Reply::error(text), request_id).await;
            return Some(DispatchOutcome::Denied(DenyReason::CallerPermissions(missing)));
        }
    }

    if invocation.in_guild() && !command.bot_permissions.is_empty() {
        let have = match invocation.permissions.bot_permissions().await {
            Ok(have) => have.unwrap_or_else(Permissions::empty),
            Err(e) => return Some(lookup_failed(invocation, path, e, request_id).await),
        };
        let missing = missing_permissions(command.bot_permissions, have);
        if !missing.is_empty() {
            info!("[{request_id}] Bot lacks {:?} for {path}", missing);
            let text = format!(
                "I am missing the following permissions: `{}`",
                permission_names(missing)
            );
            send(invocation, Reply::error(text), request_id).await;
            return Some(DispatchOutcome::Denied(DenyReason::BotPermissions(missing)));
        }
    }

    // one window per root command, sized by the resolved command
    if command.has_cooldown() {
        let root = resolved.root.name.as_str();
        if let Err(remaining) = ctx.cooldowns.try_acquire(root, &caller.id, command.cooldown) {
            debug!(
                "[{request_id}] {} is on cooldown for {root} ({}ms left)",
                caller.id,
                remaining.as_millis()
            );
            send(invocation, Reply::error(cooldown_message(remaining, root)), request_id).await;
            return Some(DispatchOutcome::RateLimited { remaining });
        }
    }

    None
}

async fn lookup_failed(
    invocation: &Invocation,
    path: &str,
    e: anyhow::Error,
    request_id: Uuid,
) -> DispatchOutcome {
    error!("[{request_id}] Permission lookup for {path} failed: {e:?}");
    send(invocation, Reply::error(FAULT_MESSAGE), request_id).await;
    DispatchOutcome::Failed
}

/// Permissions in `required` that `have` does not grant; administrators have everything
pub fn missing_permissions(required: Permissions, have: Permissions) -> Permissions {
    if have.administrator() {
        return Permissions::empty();
    }
    required & !have
}

pub fn permission_names(permissions: Permissions) -> String {
    permissions.get_permission_names().join(", ")
}

/// Help shown when a command that only groups subcommands is invoked directly
pub fn usage_embed(resolved: &Resolved<'_>, prefix: &str) -> Embed {
    let path = resolved.qualified_name();
    let example = if resolved.command.example.is_empty() {
        &resolved.root.example
    } else {
        &resolved.command.example
    };
    let subcommands = resolved
        .command
        .subcommands()
        .iter()
        .map(|sub| sub.name.as_str())
        .collect::<Vec<_>>();

    let mut embed = Embed::new(colors::HOT_PINK_POP).title(format!("Help: {path}"));
    if !example.is_empty() {
        embed = embed.description(example.as_str());
    }
    embed
        .field("Usage", format!("{prefix}{path} [subcommand] [options]"), false)
        .field(
            "Subcommands",
            if subcommands.is_empty() {
                "None".to_string()
            } else {
                subcommands.join(", ")
            },
            false,
        )
}

async fn send(invocation: &Invocation, reply: Reply, request_id: Uuid) {
    if let Err(e) = invocation.reply(reply).await {
        warn!("[{request_id}] Failed to send reply: {e:?}");
    }
}
