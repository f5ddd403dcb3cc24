use tracing::{Instrument, error, info, instrument, warn};

use crate::{
    base::{
        replies::{self, AGREE_TOKEN, CHANNEL_NOT_ALLOWED, DOCS_TOKEN, GENERIC_FAILURE},
        types::{MentionEvent, Void},
    },
    runtime::Runtime,
};

use super::{chat, docs_query, reply, upload};

/// Handles a mention of the bot in the background.
#[instrument(skip_all)]
pub fn handle_app_mention(event: MentionEvent, runtime: Runtime) {
    tokio::spawn(
        async move {
            process_app_mention(&event, &runtime).await;
        }
        .in_current_span(),
    );
}

/// Routes a mention to the right handler.
///
/// Faults never escape: the user gets the generic apology instead.
#[instrument(skip_all, fields(user = %event.user, channel = %event.channel))]
pub async fn process_app_mention(event: &MentionEvent, runtime: &Runtime) {
    let Err(err) = route_app_mention(event, runtime).await else {
        return;
    };

    error!("Error while handling: {:#}", err);

    if let Err(err) = reply(runtime, event, GENERIC_FAILURE).await {
        error!("Failed to send the apology: {:#}", err);
    }
}

async fn route_app_mention(event: &MentionEvent, runtime: &Runtime) -> Void {
    let user = event.user.as_str();

    if !runtime.config.is_channel_allowed(&event.channel) {
        warn!("Ignoring mention in a channel that is not allowed.");
        return reply(runtime, event, CHANNEL_NOT_ALLOWED).await;
    }

    let text = strip_bot_mention(&event.text, runtime.chat.bot_user_id());

    // Terms of service.

    if text.contains(AGREE_TOKEN) {
        info!("User agreed to the terms of service.");

        runtime.db.set_agreed_to_terms(user).await?;
        return reply(runtime, event, &replies::welcome(user)).await;
    }

    let record = runtime.db.get_or_create_user(user).await?;

    if !record.agreed_to_terms {
        info!("User has not agreed to the terms of service.");
        return reply(runtime, event, &replies::terms_required(user, &runtime.config.terms_of_service)).await;
    }

    // Dispatch.

    if let Some(files) = event.attachments() {
        return upload::handle_upload(event, files, runtime).await;
    }

    if text.contains(DOCS_TOKEN) {
        let query = text.replace(DOCS_TOKEN, "");
        return docs_query::handle_docs_query(event, query.trim(), runtime).await;
    }

    chat::handle_chat(event, &text, runtime).await
}

/// Removes the bot's own `<@ID>` tag from the text.
fn strip_bot_mention(text: &str, bot_user_id: &str) -> String {
    text.replace(&replies::mention(bot_user_id), "").trim().to_string()
}

// Tests.
