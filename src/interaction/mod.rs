//! Event handling and user interactions for docs-bot.
//!
//! This module provides the handlers behind a mention of the bot:
//! - Routing a mention (channel gating, terms of service, dispatch)
//! - Uploading attached documents
//! - Answering questions about uploaded documents
//! - Plain chat with rolling conversation memory

pub mod app_mention;
pub mod chat;
pub mod docs_query;
pub mod upload;

use crate::{
    base::types::{MentionEvent, Void},
    runtime::Runtime,
};

/// Replies in the thread of the mention.
pub(crate) async fn reply(runtime: &Runtime, event: &MentionEvent, text: &str) -> Void {
    runtime.chat.send_message(&event.channel, &event.ts, text).await
}
