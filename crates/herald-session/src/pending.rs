// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot "next direct message is a reply" markers, keyed by sender.

use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// Storage for pending requests.
pub trait PendingRequestStore: Send + Sync {
    /// Marks `sender` as owing a reply. A later call overwrites an earlier one.
    fn set(&self, sender: &str);

    /// Atomic check-and-clear. Returns `true` at most once per `set`.
    fn consume(&self, sender: &str) -> bool;

    fn is_pending(&self, sender: &str) -> bool;
}

#[derive(Debug, Default)]
pub struct InMemoryPendingRequests {
    requests: DashMap<String, DateTime<Utc>>,
}

impl InMemoryPendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// When the outstanding request for `sender` was set.
    pub fn requested_at(&self, sender: &str) -> Option<DateTime<Utc>> {
        self.requests.get(sender).map(|at| *at)
    }
}

impl PendingRequestStore for InMemoryPendingRequests {
    fn set(&self, sender: &str) {
        self.requests.insert(sender.to_string(), Utc::now());
    }

    fn consume(&self, sender: &str) -> bool {
        self.requests.remove(sender).is_some()
    }

    fn is_pending(&self, sender: &str) -> bool {
        self.requests.contains_key(sender)
    }
}
