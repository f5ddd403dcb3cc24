//! Library root for `docs-bot`.
//!
//! Docs-bot is an OpenAI-powered Slack assistant that:
//! - Asks every user to agree to its terms of service before talking
//! - Indexes PDF and CSV files attached to a mention
//! - Answers `+docs` questions from the indexed documents
//! - Chats, with a rolling summarized memory per user
//!
//! The bot integrates with Slack for chat, SurrealDB for storage and vector
//! search, and OpenAI for responses and embeddings.  Each service sits behind a
//! trait, so the handlers can be tested against mocks.

pub mod base;
pub mod interaction;
pub mod runtime;
pub mod service;

use base::{config::Config, types::Void};
use rustls::crypto;
use tracing::info;

/// Public async entry for the binary crate.
///
/// Sets up necessary services and starts the docs-bot runtime:
/// - Initializes the crypto provider
/// - Creates the runtime context with database, LLM, document, and chat clients
/// - Starts the health endpoint and the main event loop
pub async fn start(config: Config) -> Void {
    info!("Starting docs-bot ...");

    // Start the crypto provider.
    crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install the rustls crypto provider."))?;

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config).await?;

    // Start the runtime.
    runtime.start().await?;

    Ok(())
}
