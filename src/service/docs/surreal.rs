//! SurrealDB-backed document index.
//!
//! Documents are keyed by the SHA-256 of their bytes, so re-uploading a file is
//! detected as a duplicate.  Chunks carry their embedding, and search ranks them
//! with SurrealDB's cosine similarity.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use surrealdb::{Surreal, engine::any::Any};
use tracing::{debug, error, info, instrument};

use crate::{
    base::{
        config::Config,
        types::{DocFragment, IngestOutcome, Res, Void},
    },
    service::llm::LlmClient,
};

use super::{DocsClient, GenericDocsClient, SupportedFiletype, chunk::chunk_text, extract::extract_text};

const DOCUMENT_TABLE: &str = "document";
const CHUNK_TABLE: &str = "doc_chunk";

// Extra methods on `DocsClient` applied by the surreal implementation.

impl DocsClient {
    /// Creates a document index on an existing SurrealDB connection.
    pub async fn surreal(db: Surreal<Any>, llm: LlmClient, config: &Config) -> Res<Self> {
        let client = SurrealDocsClient::new(db, llm, config).await?;
        Ok(Self { inner: Arc::new(client) })
    }
}

// Records.

/// An indexed document.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DocumentRecord {
    user_id: String,
    filetype: String,
    chunk_count: usize,
    created_at: DateTime<Utc>,
}

/// A chunk of an indexed document, with its embedding.
#[derive(Debug, Clone, Serialize)]
struct ChunkRecord {
    doc_id: String,
    text: String,
    embedding: Vec<f32>,
}

// Specific implementations.

/// SurrealDB document index.
pub struct SurrealDocsClient {
    db: Surreal<Any>,
    llm: LlmClient,
    http: reqwest::Client,
    bot_token: String,
    search_limit: usize,
    chunk_max_tokens: usize,
    embedding_batch_size: usize,
}

impl SurrealDocsClient {
    #[instrument(name = "SurrealDocsClient::new", skip_all)]
    pub async fn new(db: Surreal<Any>, llm: LlmClient, config: &Config) -> Res<Self> {
        // Define schemas.

        db.query(format!("DEFINE TABLE IF NOT EXISTS {DOCUMENT_TABLE} SCHEMALESS;")).await?.check()?;
        db.query(format!("DEFINE TABLE IF NOT EXISTS {CHUNK_TABLE} SCHEMALESS;")).await?.check()?;
        db.query(format!("DEFINE INDEX IF NOT EXISTS {CHUNK_TABLE}_doc_id ON {CHUNK_TABLE} FIELDS doc_id;")).await?.check()?;

        info!("Document index initialized successfully.");

        Ok(Self {
            db,
            llm,
            http: reqwest::Client::new(),
            bot_token: config.slack_bot_token.clone(),
            search_limit: config.docs_search_limit,
            chunk_max_tokens: config.docs_chunk_max_tokens,
            embedding_batch_size: config.docs_embedding_batch_size,
        })
    }

    /// Downloads a private file with the bot token.
    #[instrument(skip(self))]
    async fn download(&self, url: &str) -> Res<Vec<u8>> {
        let response = self.http.get(url).bearer_auth(&self.bot_token).send().await?.error_for_status()?;

        // Without the `files:read` scope, Slack answers with its login page instead of the file.
        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("text/html"));

        if is_html {
            return Err(anyhow::anyhow!("Downloading `{url}` returned an HTML page instead of the file."));
        }

        Ok(response.bytes().await?.to_vec())
    }

    /// Indexes the bytes of a file on behalf of the user.
    ///
    /// The document record is claimed before any work is done, so overlapping
    /// uploads of the same bytes index it once.  If indexing fails, the claim is
    /// released and the upload can be retried.
    #[instrument(skip(self, bytes))]
    pub async fn index_bytes(&self, bytes: Vec<u8>, filetype: SupportedFiletype, user_id: &str) -> Res<IngestOutcome> {
        let doc_id = hex::encode(Sha256::digest(&bytes));

        if !self.claim_document(&doc_id, filetype, user_id).await? {
            info!("Document `{}` is already indexed.", doc_id);
            return Ok(IngestOutcome { doc_id, is_duplicate: true });
        }

        match self.index_claimed(&doc_id, bytes, filetype).await {
            Ok(chunk_count) => {
                info!("Indexed document `{}` ({} chunks).", doc_id, chunk_count);
                Ok(IngestOutcome { doc_id, is_duplicate: false })
            }
            Err(err) => {
                if let Err(release_err) = self.release_document(&doc_id).await {
                    error!("Failed to release document `{}`: {:#}", doc_id, release_err);
                }

                Err(err)
            }
        }
    }

    /// Creates the document record; returns `false` if it already exists.
    async fn claim_document(&self, doc_id: &str, filetype: SupportedFiletype, user_id: &str) -> Res<bool> {
        let existing: Option<DocumentRecord> = self.db.select((DOCUMENT_TABLE, doc_id)).await?;

        if existing.is_some() {
            return Ok(false);
        }

        let document = DocumentRecord {
            user_id: user_id.to_string(),
            filetype: filetype.to_string(),
            chunk_count: 0,
            created_at: Utc::now(),
        };

        let created: Result<Option<DocumentRecord>, surrealdb::Error> = self.db.create((DOCUMENT_TABLE, doc_id)).content(document).await;

        match created {
            Ok(_) => Ok(true),
            Err(err) => {
                // Another upload of the same bytes may have claimed it in between.
                let existing: Option<DocumentRecord> = self.db.select((DOCUMENT_TABLE, doc_id)).await?;

                if existing.is_some() { Ok(false) } else { Err(err.into()) }
            }
        }
    }

    async fn release_document(&self, doc_id: &str) -> Void {
        let _: Option<DocumentRecord> = self.db.delete((DOCUMENT_TABLE, doc_id)).await?;

        Ok(())
    }

    /// Extracts, chunks, and embeds a claimed document, then stores its chunks.
    async fn index_claimed(&self, doc_id: &str, bytes: Vec<u8>, filetype: SupportedFiletype) -> Res<usize> {
        // Parsers can be slow, and `pdf-extract` may panic on malformed input.
        let text = tokio::task::spawn_blocking(move || extract_text(&bytes, filetype))
            .await
            .map_err(|e| anyhow::anyhow!("Text extraction did not complete: {e}"))??;

        let chunks = chunk_text(&text, self.chunk_max_tokens);
        let embeddings = self.embed_chunks(&chunks).await?;

        debug!("Indexing {} chunks for document `{}`.", chunks.len(), doc_id);

        let chunk_count = chunks.len();
        let records = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(text, embedding)| ChunkRecord { doc_id: doc_id.to_string(), text, embedding })
            .collect::<Vec<_>>();

        self.db
            .query(format!(
                "BEGIN TRANSACTION; INSERT INTO {CHUNK_TABLE} $chunks; UPDATE type::thing($table, $id) SET chunk_count = $count; COMMIT TRANSACTION;"
            ))
            .bind(("chunks", records))
            .bind(("table", DOCUMENT_TABLE))
            .bind(("id", doc_id.to_string()))
            .bind(("count", chunk_count))
            .await?
            .check()?;

        Ok(chunk_count)
    }

    /// Embeds chunks in order, at most `embedding_batch_size` per request.
    async fn embed_chunks(&self, chunks: &[String]) -> Res<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(chunks.len());

        for batch in chunks.chunks(self.embedding_batch_size) {
            let batch_embeddings = self.llm.get_embeddings(batch).await?;

            if batch_embeddings.len() != batch.len() {
                return Err(anyhow::anyhow!("Got {} embeddings for {} chunks.", batch_embeddings.len(), batch.len()));
            }

            embeddings.extend(batch_embeddings);
        }

        Ok(embeddings)
    }

    async fn add_file(&self, url: &str, user_id: &str, filetype: SupportedFiletype) -> Res<IngestOutcome> {
        let bytes = self.download(url).await?;

        self.index_bytes(bytes, filetype, user_id).await
    }
}

#[async_trait]
impl GenericDocsClient for SurrealDocsClient {
    #[instrument(skip(self))]
    async fn get_docs(&self, query: &str) -> Res<Vec<DocFragment>> {
        let embedding = self
            .llm
            .get_embeddings(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("No embedding returned for the query."))?;

        let mut response = self
            .db
            .query(format!(
                "SELECT doc_id, text, vector::similarity::cosine(embedding, $embedding) AS score FROM {CHUNK_TABLE} ORDER BY score DESC LIMIT {};",
                self.search_limit
            ))
            .bind(("embedding", embedding))
            .await?
            .check()?;

        let fragments: Vec<DocFragment> = response.take(0)?;

        info!("Found {} relevant fragments.", fragments.len());

        Ok(fragments)
    }

    async fn add_pdf(&self, url: &str, user_id: &str) -> Res<IngestOutcome> {
        self.add_file(url, user_id, SupportedFiletype::Pdf).await
    }

    async fn add_csv(&self, url: &str, user_id: &str) -> Res<IngestOutcome> {
        self.add_file(url, user_id, SupportedFiletype::Csv).await
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use mockall::mock;

    use super::*;
    use crate::{
        base::{
            config::ConfigInner,
            types::ChatTurn,
        },
        service::{db::surreal::connect_memory, llm::GenericLlmClient},
    };

    mock! {
        pub Llm {}

        #[async_trait]
        impl GenericLlmClient for Llm {
            async fn get_chat_response(&self, system_directive: &str, summary: &str, history: &[ChatTurn], input: &str) -> Res<String>;
            async fn get_summary(&self, summary: &str, turns: &[ChatTurn]) -> Res<String>;
            async fn get_embeddings(&self, inputs: &[String]) -> Res<Vec<Vec<f32>>>;
            async fn is_unsafe_content(&self, text: &str) -> Res<bool>;
        }
    }

    /// Embeds texts along two "topics", plus a constant so no vector is zero.
    fn fake_embedding(text: &str) -> Vec<f32> {
        vec![if text.contains("apple") { 1.0 } else { 0.0 }, if text.contains("banana") { 1.0 } else { 0.0 }, 0.1]
    }

    fn get_mock_llm() -> MockLlm {
        let mut llm = MockLlm::new();
        llm.expect_get_embeddings().returning(|inputs| Ok(inputs.iter().map(|i| fake_embedding(i)).collect()));
        llm
    }

    async fn create_test_client() -> SurrealDocsClient {
        create_test_client_with(get_mock_llm(), 500, 256).await
    }

    async fn create_test_client_with(llm: MockLlm, docs_chunk_max_tokens: usize, docs_embedding_batch_size: usize) -> SurrealDocsClient {
        let config = Config {
            inner: Arc::new(ConfigInner {
                slack_bot_token: "xoxb-test".to_string(),
                docs_search_limit: 10,
                docs_chunk_max_tokens,
                docs_embedding_batch_size,
                ..Default::default()
            }),
        };

        let db = connect_memory().await.unwrap();

        SurrealDocsClient::new(db, LlmClient::new(Arc::new(llm)), &config).await.unwrap()
    }

    async fn index_csv(client: &SurrealDocsClient, csv: &str) -> Res<IngestOutcome> {
        client.index_bytes(csv.as_bytes().to_vec(), SupportedFiletype::Csv, "U1").await
    }

    #[tokio::test]
    async fn test_get_docs_ranks_by_similarity() -> Void {
        let client = create_test_client().await;

        index_csv(&client, "fruit,color\napple,red\n").await?;
        index_csv(&client, "fruit,color\nbanana,yellow\n").await?;

        let fragments = client.get_docs("what color is a banana?").await?;

        assert_eq!(fragments.len(), 2);
        assert!(fragments[0].text.contains("banana"));
        assert!(fragments[0].score > fragments[1].score);

        Ok(())
    }

    #[tokio::test]
    async fn test_reindexing_is_a_duplicate() -> Void {
        let client = create_test_client().await;

        let first = index_csv(&client, "fruit,color\napple,red\n").await?;
        let second = index_csv(&client, "fruit,color\napple,red\n").await?;

        assert!(!first.is_duplicate);
        assert!(second.is_duplicate);
        assert_eq!(first.doc_id, second.doc_id);

        // The duplicate did not add chunks.
        assert_eq!(client.get_docs("apple").await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_empty_document_fails() {
        let client = create_test_client().await;

        assert!(index_csv(&client, "fruit,color\n").await.is_err());
    }

    #[tokio::test]
    async fn test_empty_index_returns_no_fragments() -> Void {
        let client = create_test_client().await;

        assert!(client.get_docs("anything").await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_overlapping_uploads_index_once() -> Void {
        let client = create_test_client().await;
        let csv = "fruit,color\napple,red\n";

        let (first, second) = tokio::join!(index_csv(&client, csv), index_csv(&client, csv));
        let (first, second) = (first?, second?);

        assert_eq!(first.doc_id, second.doc_id);
        assert!(first.is_duplicate != second.is_duplicate);
        assert_eq!(client.get_docs("apple").await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_failed_indexing_can_be_retried() -> Void {
        let calls = Arc::new(AtomicUsize::new(0));

        let mut llm = MockLlm::new();
        let counter = calls.clone();
        llm.expect_get_embeddings().returning(move |inputs| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(anyhow::anyhow!("embeddings unavailable"));
            }

            Ok(inputs.iter().map(|i| fake_embedding(i)).collect())
        });

        let client = create_test_client_with(llm, 500, 256).await;
        let csv = "fruit,color\napple,red\n";

        assert!(index_csv(&client, csv).await.is_err());

        let retried = index_csv(&client, csv).await?;

        assert!(!retried.is_duplicate);
        assert_eq!(client.get_docs("apple").await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_embeddings_are_batched_in_order() -> Void {
        let calls = Arc::new(AtomicUsize::new(0));

        // Embeds "n: aK" as (K, 1), and rejects oversized requests.
        let mut llm = MockLlm::new();
        let counter = calls.clone();
        llm.expect_get_embeddings().returning(move |inputs| {
            counter.fetch_add(1, Ordering::SeqCst);

            if inputs.len() > 2 {
                return Err(anyhow::anyhow!("too many inputs: {}", inputs.len()));
            }

            Ok(inputs
                .iter()
                .map(|i| {
                    let n = i.chars().filter(char::is_ascii_digit).collect::<String>().parse::<f32>().unwrap_or(0.0);
                    vec![n, 1.0]
                })
                .collect())
        });

        // 2 tokens per chunk, so every row is its own chunk.
        let client = create_test_client_with(llm, 2, 2).await;

        index_csv(&client, "n\na1\na2\na3\na4\na5\n").await?;

        // 3 batches for the document, 1 for the query.
        let fragments = client.get_docs("a5").await?;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(fragments.len(), 5);
        assert_eq!(fragments[0].text, "n: a5");

        Ok(())
    }
}
