//! Integration with Large Language Model services.
//!
//! This module provides the OpenAI implementation of `GenericLlmClient`:
//! conversational replies, running summaries, embeddings, and moderation.

use std::sync::Arc;

use crate::base::{
    config::Config,
    types::{ChatTurn, Res, TurnRole},
};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
        CreateEmbeddingRequestArgs, CreateModerationRequestArgs,
    },
};
use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use super::{GenericLlmClient, LlmClient, format_transcript};

// Extra methods on `LlmClient` applied by the openai implementation.

impl LlmClient {
    pub fn openai(config: &Config) -> Self {
        let client = OpenAiLlmClient::new(config);
        Self { inner: Arc::new(client) }
    }
}

// Specific implementations.

/// OpenAI LLM client implementation.
#[derive(Clone)]
pub struct OpenAiLlmClient {
    client: Client<OpenAIConfig>,
    config: Config,
}

impl OpenAiLlmClient {
    /// Create a new OpenAI LLM client.
    #[instrument(name = "OpenAiLlmClient::new", skip_all)]
    pub fn new(config: &Config) -> Self {
        let cfg = OpenAIConfig::new().with_api_key(config.openai_api_key.clone());

        Self {
            client: Client::with_config(cfg),
            config: config.clone(),
        }
    }

    /// Build the messages for a conversational reply.
    fn build_chat_messages(&self, system_directive: &str, summary: &str, history: &[ChatTurn], input: &str) -> Res<Vec<ChatCompletionRequestMessage>> {
        let mut messages: Vec<ChatCompletionRequestMessage> = vec![ChatCompletionRequestSystemMessageArgs::default().content(system_directive).build()?.into()];

        if !summary.is_empty() {
            messages.push(ChatCompletionRequestSystemMessageArgs::default().content(format!("## Summary of the conversation so far\n\n{summary}")).build()?.into());
        }

        for turn in history {
            let message = match turn.role {
                TurnRole::Human => ChatCompletionRequestUserMessageArgs::default().content(turn.content.as_str()).build()?.into(),
                TurnRole::Ai => ChatCompletionRequestAssistantMessageArgs::default().content(turn.content.as_str()).build()?.into(),
            };

            messages.push(message);
        }

        messages.push(ChatCompletionRequestUserMessageArgs::default().content(input).build()?.into());

        Ok(messages)
    }

    /// Send a chat completion request, and return the first choice's text.
    async fn call_chat_api(&self, messages: Vec<ChatCompletionRequestMessage>, temperature: f32) -> Res<String> {
        let mut request = CreateChatCompletionRequestArgs::default();
        request.model(&self.config.openai_chat_model).messages(messages);

        // Reasoning models reject a sampling temperature.
        if self.config.openai_chat_model.starts_with("gpt") {
            request.temperature(temperature);
        }

        let response = self.client.chat().create(request.build()?).await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow::anyhow!("OpenAI returned no message content."))?;

        Ok(content)
    }
}

#[async_trait]
impl GenericLlmClient for OpenAiLlmClient {
    #[instrument(name = "OpenAiLlmClient::get_chat_response", skip_all)]
    async fn get_chat_response(&self, system_directive: &str, summary: &str, history: &[ChatTurn], input: &str) -> Res<String> {
        debug!("Generating a reply with {} buffered turns.", history.len());

        let messages = self.build_chat_messages(system_directive, summary, history, input)?;

        self.call_chat_api(messages, self.config.openai_chat_temperature).await
    }

    #[instrument(name = "OpenAiLlmClient::get_summary", skip_all)]
    async fn get_summary(&self, summary: &str, turns: &[ChatTurn]) -> Res<String> {
        info!("Folding {} turns into the running summary.", turns.len());

        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default().content(self.config.summary_directive.as_str()).build()?.into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(format!("## Current summary\n\n{summary}\n\n## New lines of conversation\n\n{}\n\n## New summary\n\n", format_transcript(turns)))
                .build()?
                .into(),
        ];

        self.call_chat_api(messages, 0.0).await
    }

    #[instrument(name = "OpenAiLlmClient::get_embeddings", skip_all)]
    async fn get_embeddings(&self, inputs: &[String]) -> Res<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let request = CreateEmbeddingRequestArgs::default().model(&self.config.openai_embedding_model).input(inputs.to_vec()).build()?;

        let mut data = self.client.embeddings().create(request).await?.data;

        if data.len() != inputs.len() {
            return Err(anyhow::anyhow!("OpenAI returned {} embeddings for {} inputs.", data.len(), inputs.len()));
        }

        data.sort_by_key(|embedding| embedding.index);

        Ok(data.into_iter().map(|embedding| embedding.embedding).collect())
    }

    #[instrument(name = "OpenAiLlmClient::is_unsafe_content", skip_all)]
    async fn is_unsafe_content(&self, text: &str) -> Res<bool> {
        let request = CreateModerationRequestArgs::default().input(text.to_string()).build()?;

        let response = self.client.moderations().create(request).await?;
        let flagged = response.results.iter().any(|result| result.flagged);

        if flagged {
            warn!("Moderation flagged a response.");
        }

        Ok(flagged)
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use async_openai::types::ChatCompletionRequestSystemMessageContent;

    use super::*;
    use crate::base::config::ConfigInner;

    fn create_test_config() -> Config {
        Config {
            inner: Arc::new(ConfigInner {
                openai_api_key: "test_key".to_string(),
                openai_chat_model: "gpt-4".to_string(),
                openai_chat_temperature: 0.3,
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_build_chat_messages_without_summary() {
        let client = OpenAiLlmClient::new(&create_test_config());
        let history = vec![ChatTurn::human("hi"), ChatTurn::ai("hello")];

        let messages = client.build_chat_messages("be nice", "", &history, "how are you?").unwrap();

        assert_eq!(messages.len(), 4);
        assert!(matches!(messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(messages[1], ChatCompletionRequestMessage::User(_)));
        assert!(matches!(messages[2], ChatCompletionRequestMessage::Assistant(_)));
        assert!(matches!(messages[3], ChatCompletionRequestMessage::User(_)));
    }

    #[test]
    fn test_build_chat_messages_with_summary() {
        let client = OpenAiLlmClient::new(&create_test_config());

        let messages = client.build_chat_messages("be nice", "The human said hi.", &[], "again?").unwrap();

        assert_eq!(messages.len(), 3);

        let ChatCompletionRequestMessage::System(summary) = &messages[1] else {
            panic!("The summary should be a system message.");
        };

        let ChatCompletionRequestSystemMessageContent::Text(text) = &summary.content else {
            panic!("The summary should be plain text.");
        };

        assert!(text.contains("The human said hi."));
    }
}
