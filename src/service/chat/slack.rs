//! Slack integration for docs-bot.
//!
//! This module provides the Slack implementation of `GenericChatClient`:
//! - Receiving `app_mention` events over socket mode
//! - Sending threaded replies

use crate::{
    base::{
        config::Config,
        types::{FileDescriptor, MentionEvent, Res, Void},
    },
    interaction,
    runtime::Runtime,
    service::{db::DbClient, docs::DocsClient, llm::LlmClient, memory::MemoryClient},
};
use async_trait::async_trait;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use slack_morphism::prelude::*;
use tracing::{info, instrument, warn};

use std::sync::Arc;

use super::{ChatClient, GenericChatClient};

// Type aliases.

type FullClient = slack_morphism::SlackClient<SlackClientHyperConnector<HttpsConnector<HttpConnector>>>;

// Extra methods on `ChatClient` applied by the slack implementation.

impl ChatClient {
    /// Creates a new Slack chat client.
    pub async fn slack(config: &Config, db: DbClient, llm: LlmClient, docs: DocsClient, memory: MemoryClient) -> Res<Self> {
        let client = SlackChatClient::new(config, db, llm, docs, memory).await?;
        Ok(Self { inner: Arc::new(client) })
    }
}

impl From<SlackChatClient> for ChatClient {
    fn from(client: SlackChatClient) -> Self {
        Self { inner: Arc::new(client) }
    }
}

// Structs.

/// User state for the slack socket client.
struct SlackUserState {
    runtime: Runtime,
}

/// Slack client implementation.
#[derive(Clone)]
struct SlackChatClient {
    config: Config,
    app_token: SlackApiToken,
    bot_token: SlackApiToken,
    bot_user_id: String,
    client: Arc<FullClient>,
    db: DbClient,
    llm: LlmClient,
    docs: DocsClient,
    memory: MemoryClient,
}

impl SlackChatClient {
    /// Create a new Slack chat client.
    #[instrument(name = "SlackChatClient::new", skip_all)]
    pub async fn new(config: &Config, db: DbClient, llm: LlmClient, docs: DocsClient, memory: MemoryClient) -> Res<Self> {
        // Initialize tokens.

        let app_token = SlackApiToken::new(SlackApiTokenValue(config.slack_app_token.clone()));
        let bot_token = SlackApiToken::new(SlackApiTokenValue(config.slack_bot_token.clone()));

        // Initialize the Slack client.

        let https_connector = HttpsConnector::<HttpConnector>::builder().with_native_roots()?.https_only().enable_all_versions().build();
        let connector = SlackClientHyperConnector::with_connector(https_connector);
        let client = Arc::new(slack_morphism::SlackClient::new(connector));

        // Get the bot's user ID.

        let session = client.open_session(&bot_token);
        let bot_user = session.auth_test().await?;
        let bot_user_id = bot_user.user_id.0;

        info!("Slack bot user ID: {}", bot_user_id);

        Ok(Self {
            config: config.clone(),
            app_token,
            bot_token,
            bot_user_id,
            client,
            db,
            llm,
            docs,
            memory,
        })
    }
}

#[async_trait]
impl GenericChatClient for SlackChatClient {
    fn bot_user_id(&self) -> &str {
        &self.bot_user_id
    }

    async fn start(&self) -> Void {
        // Initialize the socket mode listener.

        let socket_mode_callbacks = SlackSocketModeListenerCallbacks::new().with_push_events(handle_push_event);

        // The handlers get the whole runtime, with this client as the chat service.

        let runtime = Runtime {
            config: self.config.clone(),
            db: self.db.clone(),
            llm: self.llm.clone(),
            docs: self.docs.clone(),
            memory: self.memory.clone(),
            chat: ChatClient::from(self.clone()),
        };

        let listener_environment = Arc::new(SlackClientEventsListenerEnvironment::new(self.client.clone()).with_user_state(SlackUserState { runtime }));

        let socket_mode_listener = Arc::new(SlackClientSocketModeListener::new(
            &SlackClientSocketModeConfig::new(),
            listener_environment.clone(),
            socket_mode_callbacks,
        ));

        // Register an app token to listen for events.
        socket_mode_listener.listen_for(&self.app_token).await?;

        // Open the websocket connections, and wait for Ctrl-C to shutdown.
        socket_mode_listener.serve().await;

        Ok(())
    }

    #[instrument(skip(self, text))]
    async fn send_message(&self, channel_id: &str, thread_ts: &str, text: &str) -> Void {
        let message = SlackMessageContent::new().with_text(text.to_string());

        let request = SlackApiChatPostMessageRequest::new(SlackChannelId(channel_id.to_string()), message)
            .with_as_user(true)
            .with_thread_ts(SlackTs(thread_ts.to_string()))
            .with_link_names(true);

        let session = self.client.open_session(&self.bot_token);

        let _ = session.chat_post_message(&request).await.map_err(|e| anyhow::anyhow!("Failed to send message: {}", e))?;

        Ok(())
    }
}

// Conversions.

impl From<&SlackAppMentionEvent> for MentionEvent {
    fn from(event: &SlackAppMentionEvent) -> Self {
        let files = event.content.files.as_ref().map(|files| {
            files
                .iter()
                .map(|file| FileDescriptor {
                    filetype: file.filetype.as_ref().map(|t| t.0.clone()).unwrap_or_default(),
                    url_private_download: file.url_private_download.as_ref().map(|u| u.to_string()).unwrap_or_default(),
                })
                .collect()
        });

        MentionEvent {
            user: event.user.0.clone(),
            ts: event.origin.ts.0.clone(),
            channel: event.channel.0.clone(),
            text: event.content.text.clone().unwrap_or_default(),
            files,
        }
    }
}

// Socket mode listener callbacks for Slack.

/// Handles push events from Slack.
#[instrument(skip_all)]
async fn handle_push_event(event_callback: SlackPushEventCallback, _client: Arc<SlackHyperClient>, states: SlackClientEventsUserState) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let states = states.read().await;
    let user_state = states.get_user_state::<SlackUserState>().ok_or(anyhow::anyhow!("Failed to get user state"))?;

    match event_callback.event {
        SlackEventCallbackBody::AppMention(slack_app_mention_event) => {
            info!("Received app mention event ...");

            let event = MentionEvent::from(&slack_app_mention_event);
            interaction::app_mention::handle_app_mention(event, user_state.runtime.clone());
        }
        _ => {
            warn!("Received unhandled push event.")
        }
    }

    Ok(())
}
