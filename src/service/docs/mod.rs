//! Document ingestion and retrieval.
//!
//! Uploaded files are downloaded, converted to text, chunked, embedded, and stored;
//! questions are answered from the chunks most similar to them.

pub mod chunk;
pub mod extract;
pub mod surreal;

use std::{fmt, ops::Deref, str::FromStr, sync::Arc};

use async_trait::async_trait;

use crate::base::types::{DocFragment, IngestOutcome, Res};

// Types.

/// Filetypes the bot knows how to index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportedFiletype {
    Pdf,
    Csv,
}

impl SupportedFiletype {
    pub const ALL: [SupportedFiletype; 2] = [SupportedFiletype::Pdf, SupportedFiletype::Csv];

    pub fn as_str(&self) -> &'static str {
        match self {
            SupportedFiletype::Pdf => "pdf",
            SupportedFiletype::Csv => "csv",
        }
    }

    /// Comma-separated list of every supported filetype, for user-facing text.
    pub fn list() -> String {
        Self::ALL.iter().map(|t| t.as_str()).collect::<Vec<_>>().join(", ")
    }
}

impl fmt::Display for SupportedFiletype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SupportedFiletype {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pdf" => Ok(SupportedFiletype::Pdf),
            "csv" => Ok(SupportedFiletype::Csv),
            _ => Err(anyhow::anyhow!("Unsupported filetype: `{s}`.")),
        }
    }
}

// Traits.

/// Generic document index trait that clients must implement.
#[async_trait]
pub trait GenericDocsClient: Send + Sync + 'static {
    /// Returns the fragments most relevant to the query, best first.
    async fn get_docs(&self, query: &str) -> Res<Vec<DocFragment>>;

    /// Downloads and indexes a PDF on behalf of the user.
    ///
    /// Fails on download or parse errors.
    async fn add_pdf(&self, url: &str, user_id: &str) -> Res<IngestOutcome>;

    /// Downloads and indexes a CSV on behalf of the user.
    async fn add_csv(&self, url: &str, user_id: &str) -> Res<IngestOutcome>;
}

// Structs.

/// Document index client for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct DocsClient {
    inner: Arc<dyn GenericDocsClient>,
}

impl Deref for DocsClient {
    type Target = dyn GenericDocsClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl DocsClient {
    pub fn new(inner: Arc<dyn GenericDocsClient>) -> Self {
        Self { inner }
    }

    /// Indexes a file with the ingestion call matching its type.
    pub async fn add_file(&self, filetype: SupportedFiletype, url: &str, user_id: &str) -> Res<IngestOutcome> {
        match filetype {
            SupportedFiletype::Pdf => self.add_pdf(url, user_id).await,
            SupportedFiletype::Csv => self.add_csv(url, user_id).await,
        }
    }
}

// Tests.
