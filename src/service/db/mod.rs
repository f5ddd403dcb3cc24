use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::base::types::{Res, Void};

pub mod surreal;

// Traits.

/// Generic database client trait that clients must implement.
///
/// This trait defines the user record operations the bot relies on.
/// Implementing this trait allows different database backends to be used
/// with the docs-bot.
#[async_trait]
pub trait GenericDbClient: Send + Sync + 'static {
    /// Gets the user from the database by their ID; or, creates a new user if they don't exist.
    ///
    /// A new user has not agreed to the terms, and has no documents, queries, or chats.
    /// Calling this repeatedly never changes an existing record.
    async fn get_or_create_user(&self, user_id: &str) -> Res<UserRecord>;

    /// Records that the user agreed to the terms of service.
    ///
    /// The user is created first if needed, so agreeing on first contact sticks.
    async fn set_agreed_to_terms(&self, user_id: &str) -> Void;

    /// Appends a document question to the user's history.
    async fn add_user_query(&self, user_id: &str, query: &str) -> Void;

    /// Appends a chat message to the user's history.
    async fn add_user_chat(&self, user_id: &str, chat: &str) -> Void;

    /// Associates an indexed document with the user.
    ///
    /// Associating the same document twice keeps a single entry.
    async fn add_user_doc(&self, user_id: &str, doc_id: &str) -> Void;
}

/// Database client for docs-bot.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct DbClient {
    inner: Arc<dyn GenericDbClient>,
}

impl Deref for DbClient {
    type Target = dyn GenericDbClient;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl DbClient {
    pub fn new(inner: Arc<dyn GenericDbClient>) -> Self {
        Self { inner }
    }
}

// Data types.

/// A user record in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: String,
    #[serde(default)]
    pub doc_ids: Vec<String>,
    #[serde(default)]
    pub queries: Vec<String>,
    #[serde(default)]
    pub chats: Vec<String>,
    #[serde(default)]
    pub agreed_to_terms: bool,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// The state of a user on first contact.
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            doc_ids: Vec::new(),
            queries: Vec::new(),
            chats: Vec::new(),
            agreed_to_terms: false,
            created_at: Utc::now(),
        }
    }
}
