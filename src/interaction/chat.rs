//! Plain chat, with rolling conversation memory.

use tracing::{debug, error, info, instrument};

use crate::{
    base::{
        replies,
        types::{MentionEvent, Res, Void},
    },
    runtime::Runtime,
};

use super::reply;

/// Records the message, and answers it.
#[instrument(skip_all)]
pub async fn handle_chat(event: &MentionEvent, text: &str, runtime: &Runtime) -> Void {
    let user = event.user.as_str();

    runtime.db.add_user_chat(user, text).await?;

    let response = converse(runtime, user, text).await?;

    reply(runtime, event, &replies::chat_answer(user, &response)).await
}

/// Runs one exchange through the model with the conversation's memory.
///
/// The memory stays locked for the whole exchange, so concurrent messages for
/// the same key are answered one at a time.  Turns pruned past the token limit
/// are folded into the running summary; if that fails, they stay buffered.
#[instrument(skip(runtime, input))]
pub async fn converse(runtime: &Runtime, key: &str, input: &str) -> Res<String> {
    let memory = runtime.memory.conversation(key).await;
    let mut memory = memory.lock().await;

    let response = runtime
        .llm
        .get_chat_response(&runtime.config.assistant_system_directive, memory.summary(), &memory.history(), input)
        .await?;

    memory.push_exchange(input, &response);

    let pruned = memory.prune(runtime.memory.max_tokens);

    if !pruned.is_empty() {
        debug!("Summarizing {} pruned turns.", pruned.len());

        let summary = runtime.llm.get_summary(memory.summary(), &pruned).await;

        match summary {
            Ok(summary) => {
                memory.set_summary(summary);
                info!("Updated the conversation summary.");
            }
            Err(err) => {
                // Keep the turns buffered; the next exchange tries again.
                error!("Failed to update the conversation summary: {:#}", err);
                memory.restore(pruned);
            }
        }
    }

    Ok(response)
}
