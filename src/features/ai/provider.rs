//! Completion providers
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.4.0
//!
//! ## Changelog
//! - 1.0.0: OpenAI chat completions behind a provider trait

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use openai::chat::{ChatCompletion, ChatCompletionMessage, ChatCompletionMessageRole};
use std::time::Duration;
use tokio::time::timeout;

use super::history::{ConversationTurn, TurnRole};

pub const COMPLETION_TIMEOUT: Duration = Duration::from_secs(45);

/// Anything that can turn a conversation into a reply
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, turns: &[ConversationTurn]) -> Result<String>;
}

/// Chat completions through the `openai` crate.
///
/// The crate reads its key from the environment, so the binary exports
/// `OPENAI_KEY` before this provider is used.
pub struct OpenAiProvider {
    model: String,
    timeout: Duration,
}

impl OpenAiProvider {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            timeout: COMPLETION_TIMEOUT,
        }
    }

    fn to_message(turn: &ConversationTurn) -> ChatCompletionMessage {
        let role = match turn.role {
            TurnRole::System => ChatCompletionMessageRole::System,
            TurnRole::User => ChatCompletionMessageRole::User,
            TurnRole::Assistant => ChatCompletionMessageRole::Assistant,
        };
        ChatCompletionMessage {
            role,
            content: Some(turn.content.clone()),
            name: None,
            function_call: None,
            tool_call_id: None,
            tool_calls: None,
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(&self, turns: &[ConversationTurn]) -> Result<String> {
        let messages: Vec<ChatCompletionMessage> = turns.iter().map(Self::to_message).collect();

        debug!("Sending {} messages to OpenAI ({})", messages.len(), self.model);

        let completion = timeout(
            self.timeout,
            ChatCompletion::builder(&self.model, messages).create(),
        )
        .await
        .map_err(|_| {
            anyhow::anyhow!(
                "OpenAI request timed out after {} seconds",
                self.timeout.as_secs()
            )
        })??;

        let response = completion
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default()
            .trim()
            .to_string();

        if response.is_empty() {
            anyhow::bail!("OpenAI returned an empty completion");
        }

        debug!("Got completion: {} chars", response.len());
        Ok(response)
    }
}
