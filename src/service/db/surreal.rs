//! SurrealDB implementation for docs-bot data storage.

use std::sync::Arc;

use async_trait::async_trait;
use surrealdb::{
    Surreal,
    engine::any::{self, Any},
    opt::auth::Root,
};
use tracing::{info, instrument, warn};

use crate::base::{
    config::Config,
    types::{Res, Void},
};

use super::{DbClient, GenericDbClient, UserRecord};

const USER_TABLE: &str = "user";

// Extra methods on `DbClient` applied by the surreal implementation.

impl DbClient {
    /// Creates a user store on an existing SurrealDB connection.
    pub async fn surreal(db: Surreal<Any>) -> Res<Self> {
        let client = SurrealDbClient::new(db).await?;
        Ok(Self { inner: Arc::new(client) })
    }

    /// Creates a user store on a fresh in-memory database.
    pub async fn surreal_memory() -> Res<Self> {
        let db = connect_memory().await?;
        Self::surreal(db).await
    }
}

/// Connects to the configured database, and selects the namespace and database.
#[instrument(skip_all)]
pub async fn connect(config: &Config) -> Res<Surreal<Any>> {
    let db = any::connect(config.db_endpoint.as_str()).await?;

    // Authenticate with the database when credentials are provided.
    if let (Some(username), Some(password)) = (&config.db_username, &config.db_password) {
        db.signin(Root { username, password }).await?;
    }

    db.use_ns(&config.db_namespace).use_db(&config.db_database).await?;

    info!("Connected to database at `{}`.", config.db_endpoint);

    Ok(db)
}

/// Connects to a fresh in-memory database.
pub async fn connect_memory() -> Res<Surreal<Any>> {
    let db = any::connect("mem://").await?;
    db.use_ns("docs").use_db("bot").await?;

    Ok(db)
}

/// SurrealDB user store.
struct SurrealDbClient {
    db: Surreal<Any>,
}

impl SurrealDbClient {
    #[instrument(name = "SurrealDbClient::new", skip_all)]
    async fn new(db: Surreal<Any>) -> Res<Self> {
        // Define schemas.

        db.query("DEFINE TABLE IF NOT EXISTS user SCHEMALESS;").await?.check()?;

        info!("User store initialized successfully.");

        Ok(Self { db })
    }

    async fn select_user(&self, user_id: &str) -> Res<Option<UserRecord>> {
        Ok(self.db.select((USER_TABLE, user_id)).await?)
    }
}

#[async_trait]
impl GenericDbClient for SurrealDbClient {
    #[instrument(skip(self))]
    async fn get_or_create_user(&self, user_id: &str) -> Res<UserRecord> {
        if let Some(user) = self.select_user(user_id).await? {
            return Ok(user);
        }

        info!("User `{}` not found, creating a new one.", user_id);

        let created: Res<Option<UserRecord>> = self.db.create((USER_TABLE, user_id)).content(UserRecord::new(user_id)).await.map_err(Into::into);

        match created {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(anyhow::anyhow!("Creating user `{user_id}` returned nothing.")),
            Err(err) => {
                // Another event for the same user may have created the record first.
                warn!("Failed to create user `{}` ({}), selecting again.", user_id, err);

                self.select_user(user_id).await?.ok_or(err)
            }
        }
    }

    #[instrument(skip(self))]
    async fn set_agreed_to_terms(&self, user_id: &str) -> Void {
        self.get_or_create_user(user_id).await?;

        self.db
            .query("UPDATE type::thing($table, $id) SET agreed_to_terms = true;")
            .bind(("table", USER_TABLE))
            .bind(("id", user_id.to_string()))
            .await?
            .check()?;

        Ok(())
    }

    #[instrument(skip(self, query))]
    async fn add_user_query(&self, user_id: &str, query: &str) -> Void {
        self.get_or_create_user(user_id).await?;

        self.db
            .query("UPDATE type::thing($table, $id) SET queries += $query;")
            .bind(("table", USER_TABLE))
            .bind(("id", user_id.to_string()))
            .bind(("query", query.to_string()))
            .await?
            .check()?;

        Ok(())
    }

    #[instrument(skip(self, chat))]
    async fn add_user_chat(&self, user_id: &str, chat: &str) -> Void {
        self.get_or_create_user(user_id).await?;

        self.db
            .query("UPDATE type::thing($table, $id) SET chats += $chat;")
            .bind(("table", USER_TABLE))
            .bind(("id", user_id.to_string()))
            .bind(("chat", chat.to_string()))
            .await?
            .check()?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn add_user_doc(&self, user_id: &str, doc_id: &str) -> Void {
        self.get_or_create_user(user_id).await?;

        self.db
            .query("UPDATE type::thing($table, $id) SET doc_ids = array::union(doc_ids, [$doc_id]);")
            .bind(("table", USER_TABLE))
            .bind(("id", user_id.to_string()))
            .bind(("doc_id", doc_id.to_string()))
            .await?
            .check()?;

        Ok(())
    }
}

// Tests.
