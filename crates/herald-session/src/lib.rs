// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Short-lived session state for the Herald dispatch core.
//!
//! - [`chat_log`]: bounded per-chat recent message log
//! - [`pending`]: one-shot pending-reply markers per sender
//! - [`activity`]: per-sender activity counters in group chats
//! - [`SessionStateStore`]: the container the dispatcher holds

pub mod activity;
pub mod chat_log;
pub mod pending;
pub mod state;

pub use activity::{ActivityStat, ActivityStore, InMemoryActivity};
pub use chat_log::{ChatLogStore, DEFAULT_CHAT_LOG_CAPACITY, InMemoryChatLog, LogEntry};
pub use pending::{InMemoryPendingRequests, PendingRequestStore};
pub use state::SessionStateStore;
