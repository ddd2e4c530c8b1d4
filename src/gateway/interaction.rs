//! Slash command interactions
//!
//! An interaction must be answered once within three seconds; later replies
//! are follow-ups. The responder tracks which of these it is on.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use serenity::http::Http;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::application::interaction::InteractionResponseType;
use serenity::prelude::Context;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::components::add_link_buttons;
use super::directory::SerenityUsers;
use super::guilds::SerenityGuilds;
use super::permissions::ChannelPermissions;
use crate::commands::{
    dispatch_path, interaction_tokens, Caller, CommandContext, Invocation, Reply, Responder, SlashOption,
};
use crate::core::truncate_for_message;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseState {
    Pending,
    Deferred,
    Replied,
}

pub struct InteractionResponder {
    http: Arc<Http>,
    interaction: ApplicationCommandInteraction,
    state: Mutex<ResponseState>,
}

impl InteractionResponder {
    pub fn new(http: Arc<Http>, interaction: ApplicationCommandInteraction) -> Self {
        Self {
            http,
            interaction,
            state: Mutex::new(ResponseState::Pending),
        }
    }
}

#[async_trait]
impl Responder for InteractionResponder {
    async fn reply(&self, reply: Reply) -> Result<()> {
        let mut state = self.state.lock().await;
        let content = reply.content.as_deref().map(truncate_for_message);

        match *state {
            ResponseState::Pending => {
                self.interaction
                    .create_interaction_response(&self.http, |response| {
                        response
                            .kind(InteractionResponseType::ChannelMessageWithSource)
                            .interaction_response_data(|data| {
                                if let Some(content) = &content {
                                    data.content(content);
                                }
                                for embed in &reply.embeds {
                                    data.embed(|e| embed.apply_to(e));
                                }
                                if !reply.links.is_empty() {
                                    data.components(|c| {
                                        c.create_action_row(|row| add_link_buttons(row, &reply.links))
                                    });
                                }
                                data.ephemeral(reply.ephemeral)
                            })
                    })
                    .await?;
            }
            ResponseState::Deferred => {
                self.interaction
                    .edit_original_interaction_response(&self.http, |edit| {
                        if let Some(content) = &content {
                            edit.content(content);
                        }
                        for embed in &reply.embeds {
                            edit.embed(|e| embed.apply_to(e));
                        }
                        if !reply.links.is_empty() {
                            edit.components(|c| {
                                c.create_action_row(|row| add_link_buttons(row, &reply.links))
                            });
                        }
                        edit
                    })
                    .await?;
            }
            ResponseState::Replied => {
                self.interaction
                    .create_followup_message(&self.http, |followup| {
                        if let Some(content) = &content {
                            followup.content(content);
                        }
                        for embed in &reply.embeds {
                            followup.embed(|e| embed.apply_to(e));
                        }
                        followup.ephemeral(reply.ephemeral)
                    })
                    .await?;
            }
        }

        let answered_original = *state != ResponseState::Replied;
        *state = ResponseState::Replied;
        drop(state);

        if let (Some(after), true) = (reply.delete_after, answered_original) {
            let http = Arc::clone(&self.http);
            let interaction = self.interaction.clone();
            tokio::spawn(async move {
                tokio::time::sleep(after).await;
                if let Err(e) = interaction.delete_original_interaction_response(&http).await {
                    debug!("Could not delete expired interaction reply: {e}");
                }
            });
        }
        Ok(())
    }

    /// Defers the response so slow work does not miss the deadline
    async fn typing(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if *state != ResponseState::Pending {
            return Ok(());
        }
        self.interaction
            .create_interaction_response(&self.http, |response| {
                response.kind(InteractionResponseType::DeferredChannelMessageWithSource)
            })
            .await?;
        *state = ResponseState::Deferred;
        Ok(())
    }
}

fn interaction_time(interaction: &ApplicationCommandInteraction) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(interaction.id.created_at().unix_timestamp(), 0)
        .unwrap_or_else(Utc::now)
}

/// Run a slash command through the shared gate chain
pub async fn handle_command(
    state: &Arc<CommandContext>,
    ctx: &Context,
    interaction: ApplicationCommandInteraction,
) {
    let options: Vec<SlashOption> = interaction.data.options.iter().map(SlashOption::from).collect();
    let tokens = interaction_tokens(&interaction.data.name, &options);
    let user = interaction.user.clone();

    let permissions = ChannelPermissions::new(
        Arc::clone(&ctx.cache),
        interaction.guild_id,
        interaction.channel_id,
        user.id,
    )
    .with_caller_permissions(interaction.member.as_ref().and_then(|m| m.permissions));

    let invocation = Invocation {
        caller: Caller {
            id: user.id.to_string(),
            name: user.name.clone(),
            bot: user.bot,
        },
        guild_id: interaction.guild_id.map(|id| id.to_string()),
        channel_id: interaction.channel_id.to_string(),
        prefix: "/".to_string(),
        sent_at: interaction_time(&interaction),
        permissions: Arc::new(permissions),
        users: Arc::new(SerenityUsers::new(Arc::clone(&ctx.cache), Arc::clone(&ctx.http))),
        guilds: Arc::new(SerenityGuilds::new(Arc::clone(&ctx.cache), Arc::clone(&ctx.http))),
        responder: Arc::new(InteractionResponder::new(Arc::clone(&ctx.http), interaction)),
    };

    let outcome = dispatch_path(state, &invocation, tokens).await;
    debug!("Slash command from {} dispatched: {outcome:?}", invocation.caller.id);
}
