//! Service integrations for external APIs and clients.
//!
//! This module contains implementations for the services used by docs-bot:
//! - Chat services (e.g., Slack)
//! - Database services (e.g., SurrealDB)
//! - Document indexing (extraction, chunking, vector search)
//! - LLM services (e.g., OpenAI)
//!
//! Each external service module defines both a generic trait and a concrete
//! implementation, so handlers can be tested against mocks.

pub mod chat;
pub mod db;
pub mod docs;
pub mod health;
pub mod llm;
pub mod memory;
