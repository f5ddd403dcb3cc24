//! Paragraph-boundary text chunker.
//!
//! Splits extracted text into pieces under a `max_tokens` budget.  Splits happen on
//! paragraph boundaries (`\n\n`) where possible; a paragraph that is too large on its
//! own is hard-split at the last newline or space before the limit.

use crate::service::memory::{CHARS_PER_TOKEN, approximate_tokens};

/// Split text into chunks on paragraph boundaries, respecting `max_tokens`.
///
/// Empty paragraphs are dropped, so blank text yields no chunks.
pub fn chunk_text(text: &str, max_tokens: usize) -> Vec<String> {
    let max_chars = (max_tokens * CHARS_PER_TOKEN).max(1);

    let mut chunks = Vec::new();
    let mut current = String::new();

    for paragraph in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        let would_be = if current.is_empty() {
            paragraph.chars().count()
        } else {
            current.chars().count() + 2 + paragraph.chars().count()
        };

        if would_be > max_chars && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }

        if approximate_tokens(paragraph) > max_tokens {
            chunks.extend(hard_split(paragraph, max_chars));
            continue;
        }

        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(paragraph);
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Splits an oversized paragraph into pieces of at most `max_chars` characters.
fn hard_split(paragraph: &str, max_chars: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut remaining = paragraph;

    while !remaining.is_empty() {
        // Byte offset of the `max_chars`-th character, or the whole string.
        let limit = remaining.char_indices().nth(max_chars).map(|(i, _)| i).unwrap_or(remaining.len());

        let split_at = if limit < remaining.len() {
            remaining[..limit].rfind(['\n', ' ']).map(|pos| pos + 1).unwrap_or(limit)
        } else {
            limit
        };

        let piece = remaining[..split_at].trim();
        if !piece.is_empty() {
            pieces.push(piece.to_string());
        }

        remaining = &remaining[split_at..];
    }

    pieces
}

// Tests.
