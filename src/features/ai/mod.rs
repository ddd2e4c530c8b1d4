//! # Feature: AI Replies
//!
//! Conversational replies through a completion provider, rate limited per
//! user and bounded in concurrency by a request queue.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.4.0
//! - **Toggleable**: true (disabled without `OPENAI_API_KEY`)

pub mod history;
pub mod provider;
pub mod queue;

pub use history::{
    build_history, format_user_message, system_prompt, ConversationTurn, HistoryMessage,
    ReplyTarget, TurnRole, HISTORY_LIMIT,
};
pub use provider::{CompletionProvider, OpenAiProvider};
pub use queue::{AiQueue, AiReply, QueueError, QueueSettings};
