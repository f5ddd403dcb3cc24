//! Load configuration via `config` crate with env-override support.

use std::{ops::Deref, sync::Arc};

use serde::Deserialize;

use crate::base::prompts;

use super::types::Res;

/// Default OpenAI chat model to use
fn default_openai_chat_model() -> String {
    "gpt-4".to_string()
}

/// Default sampling temperature for the chat model
fn default_openai_chat_temperature() -> f32 {
    0.3
}

/// Default OpenAI embedding model to use
fn default_openai_embedding_model() -> String {
    "text-embedding-ada-002".to_string()
}

/// Default system directive for the conversational model.
fn default_assistant_system_directive() -> String {
    prompts::ASSISTANT_SYSTEM_DIRECTIVE.to_string()
}

/// Default directive for folding old turns into the running summary.
fn default_summary_directive() -> String {
    prompts::SUMMARY_DIRECTIVE.to_string()
}

/// Default terms of service shown before consent.
fn default_terms_of_service() -> String {
    prompts::TERMS_OF_SERVICE.to_string()
}

fn default_memory_max_tokens() -> usize {
    1000
}

fn default_deny_unlisted_channels() -> bool {
    true
}

fn default_db_endpoint() -> String {
    "mem://".to_string()
}

fn default_db_namespace() -> String {
    "docs".to_string()
}

fn default_db_database() -> String {
    "bot".to_string()
}

fn default_docs_search_limit() -> usize {
    4
}

fn default_docs_chunk_max_tokens() -> usize {
    500
}

fn default_docs_embedding_batch_size() -> usize {
    256
}

fn default_port() -> u16 {
    3000
}

/// Configuration for the docs-bot application.
#[derive(Debug, Clone)]
pub struct Config {
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ConfigInner {
    /// OpenAI API key (`OPENAI_API_KEY`).
    pub openai_api_key: String,
    /// OpenAI chat model to use (`OPENAI_CHAT_MODEL`).
    #[serde(default = "default_openai_chat_model")]
    pub openai_chat_model: String,
    /// Sampling temperature for the chat model (`OPENAI_CHAT_TEMPERATURE`).
    /// Value between 0 and 2.
    #[serde(default = "default_openai_chat_temperature")]
    pub openai_chat_temperature: f32,
    /// OpenAI embedding model used to index and search documents (`OPENAI_EMBEDDING_MODEL`).
    #[serde(default = "default_openai_embedding_model")]
    pub openai_embedding_model: String,
    /// Optional custom system directive to override the default (`ASSISTANT_SYSTEM_DIRECTIVE`).
    #[serde(default = "default_assistant_system_directive")]
    pub assistant_system_directive: String,
    /// Optional custom summary directive to override the default (`SUMMARY_DIRECTIVE`).
    #[serde(default = "default_summary_directive")]
    pub summary_directive: String,
    /// Optional custom terms of service to override the default (`TERMS_OF_SERVICE`).
    #[serde(default = "default_terms_of_service")]
    pub terms_of_service: String,
    /// Approximate token budget of the unsummarized conversation buffer (`MEMORY_MAX_TOKENS`).
    #[serde(default = "default_memory_max_tokens")]
    pub memory_max_tokens: usize,
    /// Slack app token (`SLACK_APP_TOKEN`).
    pub slack_app_token: String,
    /// Slack bot token (`SLACK_BOT_TOKEN`).
    pub slack_bot_token: String,
    /// Channels the bot may talk in (`ALLOWED_CHANNELS`, comma-separated).
    #[serde(default)]
    pub allowed_channels: Vec<String>,
    /// Refuse to talk in channels that are not allowed (`DENY_UNLISTED_CHANNELS`).
    #[serde(default = "default_deny_unlisted_channels")]
    pub deny_unlisted_channels: bool,
    /// Database endpoint URL (`DB_ENDPOINT`), e.g. `mem://` or `ws://localhost:8000`.
    #[serde(default = "default_db_endpoint")]
    pub db_endpoint: String,
    /// Database username (`DB_USERNAME`).
    #[serde(default)]
    pub db_username: Option<String>,
    /// Database password (`DB_PASSWORD`).
    #[serde(default)]
    pub db_password: Option<String>,
    /// Database namespace (`DB_NAMESPACE`).
    #[serde(default = "default_db_namespace")]
    pub db_namespace: String,
    /// Database name (`DB_DATABASE`).
    #[serde(default = "default_db_database")]
    pub db_database: String,
    /// Number of fragments returned by a document search (`DOCS_SEARCH_LIMIT`).
    #[serde(default = "default_docs_search_limit")]
    pub docs_search_limit: usize,
    /// Approximate token size of an indexed chunk (`DOCS_CHUNK_MAX_TOKENS`).
    #[serde(default = "default_docs_chunk_max_tokens")]
    pub docs_chunk_max_tokens: usize,
    /// Most chunks sent in one embeddings request (`DOCS_EMBEDDING_BATCH_SIZE`).
    #[serde(default = "default_docs_embedding_batch_size")]
    pub docs_embedding_batch_size: usize,
    /// Port of the liveness endpoint (`PORT`).
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Config {
    pub fn load(explicit_path: Option<&std::path::Path>) -> Res<Self> {
        let env = config::Environment::default()
            .prefix("DOCS_BOT")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("allowed_channels");

        let mut cfg = config::Config::builder();

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if std::path::Path::new(".hidden/config.toml").exists() {
            cfg = cfg.add_source(config::File::with_name(".hidden/config.toml"));
        }

        // Hosting platforms hand out the listening port as a bare `PORT`.
        let port = std::env::var("PORT").ok().map(|p| p.parse::<u16>()).transpose()?;

        let cfg = cfg.add_source(env).set_override_option("port", port.map(i64::from))?;

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        result.validate()?;

        Ok(result)
    }

    /// Checks value ranges that serde cannot express.
    pub fn validate(&self) -> Res<()> {
        if self.openai_chat_temperature < 0.0 || self.openai_chat_temperature > 2.0 {
            return Err(anyhow::anyhow!("OpenAI chat temperature must be between 0 and 2."));
        }

        if self.memory_max_tokens == 0 {
            return Err(anyhow::anyhow!("Memory max tokens must be greater than 0."));
        }

        if self.docs_search_limit == 0 {
            return Err(anyhow::anyhow!("Docs search limit must be greater than 0."));
        }

        if self.docs_chunk_max_tokens == 0 {
            return Err(anyhow::anyhow!("Docs chunk max tokens must be greater than 0."));
        }

        if self.docs_embedding_batch_size == 0 {
            return Err(anyhow::anyhow!("Docs embedding batch size must be greater than 0."));
        }

        Ok(())
    }

    /// Whether the bot may talk in the given channel.
    pub fn is_channel_allowed(&self, channel_id: &str) -> bool {
        !self.deny_unlisted_channels || self.allowed_channels.iter().any(|c| c == channel_id)
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_applies_defaults() {
        let file = write_config(
            r#"
            openai_api_key = "sk-test"
            slack_app_token = "xapp-test"
            slack_bot_token = "xoxb-test"
            allowed_channels = ["C1", "C2"]
            "#,
        );

        let config = Config::load(Some(file.path())).unwrap();

        assert_eq!(config.openai_chat_model, "gpt-4");
        assert_eq!(config.memory_max_tokens, 1000);
        assert_eq!(config.db_endpoint, "mem://");
        assert_eq!(config.docs_embedding_batch_size, 256);
        assert_eq!(config.allowed_channels, vec!["C1".to_string(), "C2".to_string()]);
        assert!(config.deny_unlisted_channels);
        assert!(config.terms_of_service.contains("Terms of Service"));
    }

    #[test]
    fn test_load_rejects_bad_temperature() {
        let file = write_config(
            r#"
            openai_api_key = "sk-test"
            slack_app_token = "xapp-test"
            slack_bot_token = "xoxb-test"
            openai_chat_temperature = 2.5
            "#,
        );

        assert!(Config::load(Some(file.path())).is_err());
    }

    #[test]
    fn test_load_rejects_zero_embedding_batch() {
        let file = write_config(
            r#"
            openai_api_key = "sk-test"
            slack_app_token = "xapp-test"
            slack_bot_token = "xoxb-test"
            docs_embedding_batch_size = 0
            "#,
        );

        assert!(Config::load(Some(file.path())).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_memory() {
        let config = Config {
            inner: Arc::new(ConfigInner {
                memory_max_tokens: 0,
                docs_search_limit: 4,
                docs_chunk_max_tokens: 500,
                docs_embedding_batch_size: 256,
                ..Default::default()
            }),
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_channel_gating() {
        let gated = Config {
            inner: Arc::new(ConfigInner {
                allowed_channels: vec!["C1".to_string()],
                deny_unlisted_channels: true,
                ..Default::default()
            }),
        };

        assert!(gated.is_channel_allowed("C1"));
        assert!(!gated.is_channel_allowed("C2"));

        let open = Config {
            inner: Arc::new(ConfigInner {
                deny_unlisted_channels: false,
                ..Default::default()
            }),
        };

        assert!(open.is_channel_allowed("C2"));
    }
}
