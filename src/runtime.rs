//! Runtime services and shared state for docs-bot.

use tracing::{error, instrument};

use crate::{
    base::{
        config::Config,
        types::{Res, Void},
    },
    service::{chat::ChatClient, db::DbClient, docs::DocsClient, health, llm::LlmClient, memory::MemoryClient},
};

/// Runtime service context that can be shared across the application.
///
/// This struct holds the service clients and configuration.
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The database client instance.
    pub db: DbClient,
    /// The LLM client instance.
    pub llm: LlmClient,
    /// The document index instance.
    pub docs: DocsClient,
    /// Per-user conversation memory.
    pub memory: MemoryClient,
    /// The chat client instance.
    pub chat: ChatClient,
}

impl Runtime {
    /// Create a new runtime instance.
    #[instrument(skip_all)]
    pub async fn new(config: Config) -> Res<Self> {
        // Initialize the database.
        let conn = crate::service::db::surreal::connect(&config).await?;
        let db = DbClient::surreal(conn.clone()).await?;

        // Initialize the LLM client.
        let llm = LlmClient::openai(&config);

        // Initialize the document index.
        let docs = DocsClient::surreal(conn, llm.clone(), &config).await?;

        // Initialize the conversation memory.
        let memory = MemoryClient::new(config.memory_max_tokens);

        // Initialize the slack client.
        let chat = ChatClient::slack(&config, db.clone(), llm.clone(), docs.clone(), memory.clone()).await?;

        Ok(Self { config, db, llm, docs, memory, chat })
    }

    /// Starts the health endpoint in the background, then listens for chat events.
    pub async fn start(&self) -> Void {
        let port = self.config.port;

        tokio::spawn(async move {
            if let Err(err) = health::serve(port).await {
                error!("Health endpoint stopped: {:#}", err);
            }
        });

        self.chat.start().await
    }
}
