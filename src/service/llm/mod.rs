pub mod openai;

use crate::base::types::{ChatTurn, Res, TurnRole};
use async_trait::async_trait;
use std::ops::Deref;
use std::sync::Arc;

// Traits.

/// Generic LLM client trait that clients must implement.
///
/// This trait defines the core functionality for interacting with large language models.
/// Implementing this trait allows different LLM providers to be used with the docs-bot.
#[async_trait]
pub trait GenericLlmClient: Send + Sync + 'static {
    /// Generate a conversational reply.
    ///
    /// The model sees the system directive, then the running summary (if any),
    /// then the buffered turns, and finally the new user input.
    async fn get_chat_response(&self, system_directive: &str, summary: &str, history: &[ChatTurn], input: &str) -> Res<String>;

    /// Fold conversation turns into a running summary.
    ///
    /// Returns the new summary, which replaces `summary`.
    async fn get_summary(&self, summary: &str, turns: &[ChatTurn]) -> Res<String>;

    /// Embed texts for similarity search, one vector per input, in order.
    async fn get_embeddings(&self, inputs: &[String]) -> Res<Vec<Vec<f32>>>;

    /// Whether the safety classifier flags the text.
    async fn is_unsafe_content(&self, text: &str) -> Res<bool>;
}

// Structs.

/// LLM client for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct LlmClient {
    inner: Arc<dyn GenericLlmClient>,
}

impl Deref for LlmClient {
    type Target = dyn GenericLlmClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl LlmClient {
    pub fn new(inner: Arc<dyn GenericLlmClient>) -> Self {
        Self { inner }
    }
}

/// Renders turns as transcript lines (`Human: ...` / `AI: ...`).
pub fn format_transcript(turns: &[ChatTurn]) -> String {
    turns
        .iter()
        .map(|turn| match turn.role {
            TurnRole::Human => format!("Human: {}", turn.content),
            TurnRole::Ai => format!("AI: {}", turn.content),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// Tests.
