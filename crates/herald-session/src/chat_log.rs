// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded per-chat log of recent messages.

use std::collections::VecDeque;
use std::sync::Arc;

use dashmap::DashMap;
use herald_core::ChatEvent;

/// Default number of entries kept per chat.
pub const DEFAULT_CHAT_LOG_CAPACITY: usize = 1000;

/// One archived event. Never mutated after append.
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Admission sequence number; orders the log.
    pub seq: u64,
    pub event: Arc<ChatEvent>,
    /// Sent by the operator or by the bot's own identity.
    pub self_originated: bool,
}

impl LogEntry {
    pub fn new(seq: u64, event: Arc<ChatEvent>) -> Self {
        let self_originated = event.is_self_originated();
        Self {
            seq,
            event,
            self_originated,
        }
    }
}

/// Storage for the recent message log of every chat.
///
/// Entries of one chat are kept in admission-sequence order, whatever order
/// the appends happen in. Each chat keeps at most its capacity, evicting the
/// lowest sequence first.
pub trait ChatLogStore: Send + Sync {
    fn append(&self, chat_id: &str, entry: LogEntry);

    /// Looks up an entry by event id.
    fn find(&self, chat_id: &str, event_id: &str) -> Option<LogEntry>;

    /// All entries of a chat, oldest first.
    fn recent(&self, chat_id: &str) -> Vec<LogEntry>;

    fn len(&self, chat_id: &str) -> usize;
}

/// In-process [`ChatLogStore`] sharded by chat.
#[derive(Debug)]
pub struct InMemoryChatLog {
    capacity: usize,
    chats: DashMap<String, VecDeque<LogEntry>>,
}

impl InMemoryChatLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            chats: DashMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryChatLog {
    fn default() -> Self {
        Self::new(DEFAULT_CHAT_LOG_CAPACITY)
    }
}

impl ChatLogStore for InMemoryChatLog {
    fn append(&self, chat_id: &str, entry: LogEntry) {
        let mut log = self.chats.entry(chat_id.to_string()).or_default();
        // Archival can finish out of admission order; slot late entries in.
        let at = log
            .iter()
            .rposition(|e| e.seq <= entry.seq)
            .map_or(0, |i| i + 1);
        log.insert(at, entry);
        while log.len() > self.capacity {
            log.pop_front();
        }
    }

    fn find(&self, chat_id: &str, event_id: &str) -> Option<LogEntry> {
        let log = self.chats.get(chat_id)?;
        log.iter().rev().find(|e| e.event.id == event_id).cloned()
    }

    fn recent(&self, chat_id: &str) -> Vec<LogEntry> {
        self.chats
            .get(chat_id)
            .map(|log| log.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn len(&self, chat_id: &str) -> usize {
        self.chats.get(chat_id).map_or(0, |log| log.len())
    }
}
