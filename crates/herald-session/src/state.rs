// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide session state container.
//!
//! Created at process start, shared by every dispatch, never persisted and
//! cleared only by restart. Each table sits behind its own trait so a
//! distributed backend can replace it without touching the dispatcher.

use std::sync::Arc;

use herald_core::ChatEvent;
use tracing::trace;

use crate::activity::{ActivityStat, ActivityStore, InMemoryActivity};
use crate::chat_log::{ChatLogStore, InMemoryChatLog, LogEntry};
use crate::pending::{InMemoryPendingRequests, PendingRequestStore};

#[derive(Clone)]
pub struct SessionStateStore {
    chat_log: Arc<dyn ChatLogStore>,
    pending: Arc<dyn PendingRequestStore>,
    activity: Arc<dyn ActivityStore>,
}

impl SessionStateStore {
    pub fn new(
        chat_log: Arc<dyn ChatLogStore>,
        pending: Arc<dyn PendingRequestStore>,
        activity: Arc<dyn ActivityStore>,
    ) -> Self {
        Self {
            chat_log,
            pending,
            activity,
        }
    }

    /// All tables in process memory, with the chat log bounded to `chat_log_capacity`.
    pub fn in_memory(chat_log_capacity: usize) -> Self {
        Self::new(
            Arc::new(InMemoryChatLog::new(chat_log_capacity)),
            Arc::new(InMemoryPendingRequests::new()),
            Arc::new(InMemoryActivity::new()),
        )
    }

    /// Appends an event to its chat's recent message log at its admission `seq`.
    pub fn append_message(&self, chat_id: &str, seq: u64, event: Arc<ChatEvent>) {
        trace!(chat_id, seq, event_id = %event.id, "chat log append");
        self.chat_log.append(chat_id, LogEntry::new(seq, event));
    }

    pub fn find_message(&self, chat_id: &str, event_id: &str) -> Option<LogEntry> {
        self.chat_log.find(chat_id, event_id)
    }

    pub fn recent_messages(&self, chat_id: &str) -> Vec<LogEntry> {
        self.chat_log.recent(chat_id)
    }

    pub fn set_pending_request(&self, sender_id: &str) {
        self.pending.set(sender_id);
    }

    pub fn consume_pending_request(&self, sender_id: &str) -> bool {
        self.pending.consume(sender_id)
    }

    pub fn has_pending_request(&self, sender_id: &str) -> bool {
        self.pending.is_pending(sender_id)
    }

    pub fn increment_activity(
        &self,
        chat_id: &str,
        sender_id: &str,
        display_name: &str,
        event_id: &str,
    ) -> u64 {
        self.activity
            .increment(chat_id, sender_id, display_name, event_id)
    }

    pub fn activity(&self, chat_id: &str, sender_id: &str) -> Option<ActivityStat> {
        self.activity.get(chat_id, sender_id)
    }

    pub fn chat_log(&self) -> &Arc<dyn ChatLogStore> {
        &self.chat_log
    }

    pub fn activity_store(&self) -> &Arc<dyn ActivityStore> {
        &self.activity
    }
}

impl Default for SessionStateStore {
    fn default() -> Self {
        Self::in_memory(crate::chat_log::DEFAULT_CHAT_LOG_CAPACITY)
    }
}

impl std::fmt::Debug for SessionStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStateStore").finish_non_exhaustive()
    }
}
