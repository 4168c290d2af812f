//! Conversation history for KisaanMitra.
//!
//! Handles:
//! - Bounded, newest-first message history
//! - Read-only search and agent filters

use std::collections::VecDeque;

use super::message::{Attribution, Message};
use crate::agent::AgentId;

/// Default history capacity.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Ordered message history, newest first.
///
/// Messages are only ever appended or bulk-cleared. Once capacity is reached,
/// each append drops the oldest entry from the tail.
#[derive(Debug, Clone)]
pub struct ConversationLog {
    messages: VecDeque<Message>,
    capacity: usize,
}

impl ConversationLog {
    /// Create an empty log with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Create an empty log holding at most `capacity` messages (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            messages: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert a message at the head, evicting from the tail past capacity.
    pub fn append(&mut self, message: Message) {
        tracing::debug!(
            "History append: #{} ({}) from {}",
            message.id(),
            message.kind(),
            message
                .agent()
                .map(|a| a.to_string())
                .unwrap_or_else(|| "-".to_string())
        );

        self.messages.push_front(message);

        while self.messages.len() > self.capacity {
            if let Some(evicted) = self.messages.pop_back() {
                tracing::debug!("History evicted #{}", evicted.id());
            }
        }
    }

    /// Remove every message.
    pub fn clear(&mut self) {
        let removed = self.messages.len();
        self.messages.clear();
        tracing::debug!("History cleared ({} messages)", removed);
    }

    /// Snapshot of the history, newest first.
    pub fn all(&self) -> Vec<Message> {
        self.messages.iter().cloned().collect()
    }

    /// Messages whose content contains `keyword` (case-insensitive), newest first.
    pub fn search(&self, keyword: &str) -> Vec<Message> {
        let needle = keyword.trim().to_lowercase();
        if needle.is_empty() {
            return self.all();
        }

        self.messages
            .iter()
            .filter(|m| m.content().to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    /// Messages attributed to (or addressed to) `agent`, newest first.
    pub fn by_agent(&self, agent: AgentId) -> Vec<Message> {
        self.messages
            .iter()
            .filter(|m| m.agent() == Some(Attribution::Agent(agent)))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ConversationLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Status;

    #[test]
    fn test_append_newest_first() {
        let mut log = ConversationLog::new();
        log.append(Message::user("one", None));
        log.append(Message::user("two", None));

        let all = log.all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].content(), "two");
        assert_eq!(all[1].content(), "one");
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut log = ConversationLog::new();
        let mut ids = Vec::new();

        for i in 0..51 {
            let msg = Message::user(&format!("msg {}", i), None);
            ids.push(msg.id());
            log.append(msg);
            assert_eq!(log.len(), (i + 1).min(50));
        }

        let all = log.all();
        assert_eq!(all.len(), 50);
        // The very first message is gone; everything else stays in order
        assert!(all.iter().all(|m| m.id() != ids[0]));
        assert_eq!(all[0].id(), ids[50]);
        assert_eq!(all[49].id(), ids[1]);
        assert!(all.windows(2).all(|w| w[0].id() > w[1].id()));
    }

    #[test]
    fn test_clear() {
        let mut log = ConversationLog::with_capacity(3);
        log.append(Message::user("a", None));
        log.clear();
        assert!(log.is_empty());

        // Clearing an empty log is fine
        log.clear();
        assert!(log.all().is_empty());
    }

    #[test]
    fn test_search_and_filter_are_read_only() {
        let mut log = ConversationLog::new();
        log.append(Message::user("What is the wheat price?", Some(AgentId::Mia)));
        log.append(Message::agent_reply(AgentId::Mia, "Wheat is ₹2,275", Status::Success, 89));
        log.append(Message::agent_reply(AgentId::Cra, "Rain expected", Status::Warning, 84));

        let wheat = log.search("WHEAT");
        assert_eq!(wheat.len(), 2);

        let mia = log.by_agent(AgentId::Mia);
        assert_eq!(mia.len(), 2);
        assert_eq!(mia[0].kind(), crate::core::message::MessageKind::Agent);

        assert!(log.search("tractor").is_empty());
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut log = ConversationLog::with_capacity(0);
        log.append(Message::user("a", None));
        log.append(Message::user("b", None));
        assert_eq!(log.capacity(), 1);
        assert_eq!(log.all()[0].content(), "b");
    }
}
