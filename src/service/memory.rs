//! Rolling conversation memory.
//!
//! Each conversation key (the user ID) gets its own [`ConversationMemory`]: a running
//! summary plus a buffer of the most recent turns.  Once the buffer grows past the
//! token limit, the oldest turns are handed back to the caller to be folded into the
//! summary.
//!
//! In contrast to the other services, this one does not expose a generic trait
//! interface: it is plain in-process state.

use std::{
    collections::{HashMap, VecDeque},
    ops::Deref,
    sync::Arc,
};

use tokio::sync::Mutex;

use crate::base::types::ChatTurn;

/// Approximate chars-per-token ratio.
pub const CHARS_PER_TOKEN: usize = 4;

/// Approximate token count of a text.
pub fn approximate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Summary and recent turns of one conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationMemory {
    summary: String,
    buffer: VecDeque<ChatTurn>,
}

impl ConversationMemory {
    /// The running summary of turns no longer in the buffer.
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Replaces the running summary.
    pub fn set_summary(&mut self, summary: String) {
        self.summary = summary;
    }

    /// The buffered turns, oldest first.
    pub fn history(&self) -> Vec<ChatTurn> {
        self.buffer.iter().cloned().collect()
    }

    /// Approximate token count of the buffered turns.
    pub fn buffer_tokens(&self) -> usize {
        self.buffer.iter().map(|turn| approximate_tokens(&turn.content)).sum()
    }

    /// Records a human input and the AI reply to it.
    pub fn push_exchange(&mut self, input: &str, output: &str) {
        self.buffer.push_back(ChatTurn::human(input));
        self.buffer.push_back(ChatTurn::ai(output));
    }

    /// Pops the oldest turns until the buffer fits in `max_tokens`.
    ///
    /// Returns the popped turns, oldest first; these still need to be summarized.
    pub fn prune(&mut self, max_tokens: usize) -> Vec<ChatTurn> {
        let mut pruned = Vec::new();
        let mut tokens = self.buffer_tokens();

        while tokens > max_tokens {
            let Some(turn) = self.buffer.pop_front() else {
                break;
            };

            tokens -= approximate_tokens(&turn.content);
            pruned.push(turn);
        }

        pruned
    }

    /// Puts pruned turns back at the front of the buffer, in their original order.
    pub fn restore(&mut self, turns: Vec<ChatTurn>) {
        for turn in turns.into_iter().rev() {
            self.buffer.push_front(turn);
        }
    }
}

/// Handle to one conversation's memory.
///
/// Holding the lock for a whole exchange keeps concurrent events for the same
/// conversation from interleaving.
pub type SharedMemory = Arc<Mutex<ConversationMemory>>;

/// Struct for MemoryClient.
///
/// It is designed to be trivially cloneable.
#[derive(Clone)]
pub struct MemoryClient {
    pub inner: Arc<MemoryClientInner>,
}

impl Deref for MemoryClient {
    type Target = MemoryClientInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Inner implementation of the memory client.
pub struct MemoryClientInner {
    /// Token budget of each conversation's buffer.
    pub max_tokens: usize,
    conversations: Mutex<HashMap<String, SharedMemory>>,
}

impl MemoryClient {
    /// Creates an empty memory client.
    pub fn new(max_tokens: usize) -> Self {
        Self {
            inner: Arc::new(MemoryClientInner {
                max_tokens,
                conversations: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Gets the memory for a conversation key, creating an empty one on first use.
    pub async fn conversation(&self, key: &str) -> SharedMemory {
        let mut conversations = self.conversations.lock().await;

        conversations.entry(key.to_string()).or_default().clone()
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approximate_tokens() {
        assert_eq!(approximate_tokens(""), 0);
        assert_eq!(approximate_tokens("abcd"), 1);
        assert_eq!(approximate_tokens("abcde"), 2);
    }

    #[test]
    fn test_prune_keeps_buffer_under_limit() {
        let mut memory = ConversationMemory::default();

        // Each turn is 10 tokens.
        memory.push_exchange(&"a".repeat(40), &"b".repeat(40));
        memory.push_exchange(&"c".repeat(40), &"d".repeat(40));

        assert_eq!(memory.buffer_tokens(), 40);

        let pruned = memory.prune(25);

        assert_eq!(pruned.len(), 2);
        assert_eq!(pruned[0], ChatTurn::human("a".repeat(40)));
        assert_eq!(pruned[1], ChatTurn::ai("b".repeat(40)));
        assert_eq!(memory.buffer_tokens(), 20);
        assert_eq!(memory.history()[0], ChatTurn::human("c".repeat(40)));
    }

    #[test]
    fn test_restore_undoes_prune() {
        let mut memory = ConversationMemory::default();
        memory.push_exchange(&"a".repeat(40), &"b".repeat(40));
        memory.push_exchange("c", "d");

        let before = memory.history();
        let pruned = memory.prune(5);
        memory.restore(pruned);

        assert_eq!(memory.history(), before);
    }

    #[test]
    fn test_prune_under_limit_is_noop() {
        let mut memory = ConversationMemory::default();
        memory.push_exchange("hi", "hello");

        assert!(memory.prune(1000).is_empty());
        assert_eq!(memory.history().len(), 2);
    }

    #[test]
    fn test_prune_oversized_turn_empties_buffer() {
        let mut memory = ConversationMemory::default();
        memory.push_exchange(&"a".repeat(100), "");

        let pruned = memory.prune(10);

        assert_eq!(pruned.len(), 1);
        assert_eq!(memory.buffer_tokens(), 0);
    }

    #[tokio::test]
    async fn test_conversations_are_isolated() {
        let client = MemoryClient::new(1000);

        client.conversation("U1").await.lock().await.push_exchange("from one", "reply one");

        let other = client.conversation("U2").await;
        assert!(other.lock().await.history().is_empty());

        let same = client.conversation("U1").await;
        assert_eq!(same.lock().await.history().len(), 2);
    }
}
