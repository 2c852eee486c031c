//! Conversation store
//!
//! Private message history keyed by the unordered pair of participants.
//! The pair is the conversation: there is no separate creation step.
//! Histories are append-only apart from the `seen` flag and, when a cap is
//! configured, evict their oldest messages first.

use std::collections::{HashMap, VecDeque};

use crate::config::DEFAULT_PRIVATE_HISTORY_LIMIT;
use crate::message::PrivateEntry;
use crate::types::{ConversationKey, MessageId};

#[derive(Debug)]
pub struct ConversationStore {
    conversations: HashMap<ConversationKey, VecDeque<PrivateEntry>>,
    /// Per-conversation cap, `None` for unbounded
    limit: Option<usize>,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new(Some(DEFAULT_PRIVATE_HISTORY_LIMIT))
    }
}

impl ConversationStore {
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            conversations: HashMap::new(),
            limit: limit.map(|l| l.max(1)),
        }
    }

    pub fn append(&mut self, a: &str, b: &str, entry: PrivateEntry) {
        let log = self
            .conversations
            .entry(ConversationKey::new(a, b))
            .or_default();
        log.push_back(entry);

        if let Some(limit) = self.limit {
            while log.len() > limit {
                log.pop_front();
            }
        }
    }

    /// Messages exchanged between `a` and `b`, oldest first
    pub fn history(&self, a: &str, b: &str) -> Vec<PrivateEntry> {
        self.conversations
            .get(&ConversationKey::new(a, b))
            .map(|log| log.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Mark message `id`, sent by `sender` to `recipient`, as seen
    ///
    /// Returns true only when the flag flipped from false to true. Unknown
    /// ids, already-seen messages and receipts from anyone but the
    /// message's recipient are no-ops.
    pub fn mark_seen(&mut self, recipient: &str, sender: &str, id: MessageId) -> bool {
        let Some(entry) = self
            .conversations
            .get_mut(&ConversationKey::new(recipient, sender))
            .and_then(|log| log.iter_mut().find(|e| e.id == id))
        else {
            return false;
        };

        if entry.seen || entry.recipient != recipient || entry.sender != sender {
            return false;
        }

        entry.seen = true;
        true
    }

    /// Number of conversations with at least one message
    pub fn conversation_count(&self) -> usize {
        self.conversations.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_empty_pair() {
        let store = ConversationStore::default();
        assert!(store.history("Ana", "Beto").is_empty());
        assert_eq!(store.conversation_count(), 0);
    }

    #[test]
    fn test_history_symmetric() {
        let mut store = ConversationStore::default();
        store.append("Ana", "Beto", PrivateEntry::new("Ana", "Beto", "hola"));
        store.append("Beto", "Ana", PrivateEntry::new("Beto", "Ana", "qué tal"));

        let ab = store.history("Ana", "Beto");
        assert_eq!(ab, store.history("Beto", "Ana"));
        assert_eq!(ab.len(), 2);
        assert_eq!(ab[0].msg, "hola");
        assert_eq!(ab[1].msg, "qué tal");
        assert_eq!(store.conversation_count(), 1);
    }

    #[test]
    fn test_mark_seen_idempotent() {
        let mut store = ConversationStore::default();
        let first = PrivateEntry::new("Ana", "Beto", "uno");
        let second = PrivateEntry::new("Ana", "Beto", "dos");
        let first_id = first.id;
        store.append("Ana", "Beto", first);
        store.append("Ana", "Beto", second);

        assert!(store.mark_seen("Beto", "Ana", first_id));
        assert!(!store.mark_seen("Beto", "Ana", first_id));

        let history = store.history("Ana", "Beto");
        assert!(history[0].seen);
        assert!(!history[1].seen);
    }

    #[test]
    fn test_mark_seen_unknown_id() {
        let mut store = ConversationStore::default();
        store.append("Ana", "Beto", PrivateEntry::new("Ana", "Beto", "uno"));

        assert!(!store.mark_seen("Ana", "Beto", MessageId::new()));
        assert!(!store.mark_seen("Ana", "Carla", MessageId::new()));
    }

    #[test]
    fn test_author_cannot_mark_own_message() {
        let mut store = ConversationStore::default();
        let entry = PrivateEntry::new("Ana", "Beto", "hola");
        let id = entry.id;
        store.append("Ana", "Beto", entry);

        // Ana claiming Beto sent it, in either argument order
        assert!(!store.mark_seen("Ana", "Beto", id));
        assert!(!store.mark_seen("Beto", "Beto", id));
        assert!(!store.history("Ana", "Beto")[0].seen);

        assert!(store.mark_seen("Beto", "Ana", id));
    }

    #[test]
    fn test_capped_conversation() {
        let mut store = ConversationStore::new(Some(2));
        for msg in ["a", "b", "c"] {
            store.append("Ana", "Beto", PrivateEntry::new("Ana", "Beto", msg));
        }

        let history = store.history("Beto", "Ana");
        let texts: Vec<_> = history.iter().map(|e| e.msg.as_str()).collect();
        assert_eq!(texts, vec!["b", "c"]);
    }

    #[test]
    fn test_unbounded_conversation() {
        let mut store = ConversationStore::new(None);
        for i in 0..1500 {
            store.append("Ana", "Beto", PrivateEntry::new("Ana", "Beto", i.to_string()));
        }
        assert_eq!(store.history("Ana", "Beto").len(), 1500);
    }
}
