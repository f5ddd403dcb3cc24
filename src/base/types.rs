use serde::{Deserialize, Serialize};

pub type Err = anyhow::Error;
pub type Res<T> = Result<T, Err>;
pub type Void = Res<()>;

/// A file attached to a mention event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// The platform's short filetype (e.g., `pdf`, `csv`).
    pub filetype: String,
    /// Private download URL; requires the bot token to fetch.
    pub url_private_download: String,
}

/// A platform-agnostic mention of the bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionEvent {
    pub user: String,
    pub ts: String,
    pub channel: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FileDescriptor>>,
}

impl MentionEvent {
    /// Returns the attachments, if there are any.
    pub fn attachments(&self) -> Option<&[FileDescriptor]> {
        self.files.as_deref().filter(|files| !files.is_empty())
    }
}

/// Who spoke a turn of the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnRole {
    Human,
    Ai,
}

/// A single turn in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub content: String,
}

impl ChatTurn {
    pub fn human(content: impl Into<String>) -> Self {
        Self { role: TurnRole::Human, content: content.into() }
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self { role: TurnRole::Ai, content: content.into() }
    }
}

/// A relevant piece of an indexed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocFragment {
    pub doc_id: String,
    pub text: String,
    #[serde(default)]
    pub score: f64,
}

/// Result of handing a file to the document index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    pub doc_id: String,
    pub is_duplicate: bool,
}

// Tests.
