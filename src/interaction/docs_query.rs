//! Answering questions about uploaded documents.

use tracing::{error, info, instrument, warn};

use crate::{
    base::{
        prompts::{DOCS_CONTEXT_POSTAMBLE, DOCS_CONTEXT_PREAMBLE, DOCS_CONTEXT_SEPARATOR},
        replies::{self, DOCS_QUERY_FAILURE, DOCS_REVIEW_FAILURE, UNSAFE_RESPONSE},
        types::{DocFragment, MentionEvent, Res, Void},
    },
    runtime::Runtime,
};

use super::{chat::converse, reply};

/// Builds the model input from the retrieved fragments and the question.
pub fn compose_docs_prompt(fragments: &[DocFragment], query: &str) -> String {
    let context = fragments.iter().map(|fragment| fragment.text.as_str()).collect::<Vec<_>>().join("\n\n");

    format!("{DOCS_CONTEXT_PREAMBLE}\n\nContext:{context}{DOCS_CONTEXT_SEPARATOR}{DOCS_CONTEXT_POSTAMBLE}\n\nHuman: {query}")
}

/// Records the question, and answers it from the indexed documents.
#[instrument(skip_all)]
pub async fn handle_docs_query(event: &MentionEvent, query: &str, runtime: &Runtime) -> Void {
    let user = event.user.as_str();

    if let Err(err) = runtime.db.add_user_query(user, query).await {
        error!("Failed to record a docs question: {:#}", err);
        return reply(runtime, event, DOCS_QUERY_FAILURE).await;
    }

    let response = answer_docs_query(runtime, user, query).await.unwrap_or_else(|err| {
        error!("Failed to answer a docs question: {:#}", err);
        DOCS_REVIEW_FAILURE.to_string()
    });

    reply(runtime, event, &replies::docs_answer(user, &response)).await
}

async fn answer_docs_query(runtime: &Runtime, user: &str, query: &str) -> Res<String> {
    let fragments = runtime.docs.get_docs(query).await?;

    info!("Answering with {} fragments of context.", fragments.len());

    let prompt = compose_docs_prompt(&fragments, query);
    let response = converse(runtime, user, &prompt).await?;

    if runtime.llm.is_unsafe_content(&response).await? {
        warn!("The response was flagged as unsafe.");
        return Ok(UNSAFE_RESPONSE.to_string());
    }

    Ok(response)
}

// Tests.
