//! Room history log
//!
//! Bounded per-room message history, oldest evicted first.

use std::collections::{HashMap, VecDeque};

use crate::config::DEFAULT_HISTORY_LIMIT;
use crate::message::ChatEntry;

#[derive(Debug)]
pub struct RoomHistory {
    logs: HashMap<String, VecDeque<ChatEntry>>,
    limit: usize,
}

impl Default for RoomHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl RoomHistory {
    /// Create a log keeping at most `limit` messages per room
    pub fn new(limit: usize) -> Self {
        Self {
            logs: HashMap::new(),
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn append(&mut self, room: &str, entry: ChatEntry) {
        let log = self.logs.entry(room.to_string()).or_default();
        log.push_back(entry);
        while log.len() > self.limit {
            log.pop_front();
        }
    }

    /// History of `room`, oldest first; empty for unknown rooms
    pub fn snapshot(&self, room: &str) -> Vec<ChatEntry> {
        self.logs
            .get(room)
            .map(|log| log.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn clear(&mut self, room: &str) {
        self.logs.remove(room);
    }

    pub fn len(&self, room: &str) -> usize {
        self.logs.get(room).map_or(0, VecDeque::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(entries: &[ChatEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.msg.as_str()).collect()
    }

    #[test]
    fn test_snapshot_unknown_room() {
        let history = RoomHistory::default();
        assert!(history.snapshot("General").is_empty());
        assert_eq!(history.limit(), 100);
    }

    #[test]
    fn test_append_in_order() {
        let mut history = RoomHistory::default();
        history.append("General", ChatEntry::public("Ana", "uno"));
        history.append("General", ChatEntry::public("Beto", "dos"));
        history.append("Juegos", ChatEntry::public("Ana", "otro"));

        assert_eq!(texts(&history.snapshot("General")), vec!["uno", "dos"]);
        assert_eq!(texts(&history.snapshot("Juegos")), vec!["otro"]);
    }

    #[test]
    fn test_fifo_eviction_at_cap() {
        let mut history = RoomHistory::default();
        for i in 1..=101 {
            history.append("General", ChatEntry::public("Ana", i.to_string()));
        }

        let snapshot = history.snapshot("General");
        assert_eq!(snapshot.len(), 100);
        assert_eq!(snapshot.first().unwrap().msg, "2");
        assert_eq!(snapshot.last().unwrap().msg, "101");
    }

    #[test]
    fn test_small_cap() {
        let mut history = RoomHistory::new(2);
        for msg in ["a", "b", "c", "d"] {
            history.append("General", ChatEntry::public("Ana", msg));
            assert!(history.len("General") <= 2);
        }
        assert_eq!(texts(&history.snapshot("General")), vec!["c", "d"]);
    }

    #[test]
    fn test_clear() {
        let mut history = RoomHistory::default();
        history.append("General", ChatEntry::public("Ana", "hola"));
        history.clear("General");

        assert!(history.snapshot("General").is_empty());
        assert_eq!(history.len("General"), 0);
    }
}
