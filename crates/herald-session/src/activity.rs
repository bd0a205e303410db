// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-chat, per-sender message counters for group statistics.

use dashmap::DashMap;

/// Counter state of one sender in one chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityStat {
    pub count: u64,
    /// Most recent display name seen for the sender.
    pub display_name: String,
    pub last_event_id: String,
}

/// Storage for activity counters.
///
/// Counters only grow. Seeing the same event id twice counts twice.
pub trait ActivityStore: Send + Sync {
    /// Increments and returns the new count.
    fn increment(&self, chat_id: &str, sender_id: &str, display_name: &str, event_id: &str) -> u64;

    fn get(&self, chat_id: &str, sender_id: &str) -> Option<ActivityStat>;

    /// The `limit` most active senders of a chat, highest count first.
    fn top(&self, chat_id: &str, limit: usize) -> Vec<(String, ActivityStat)>;
}

#[derive(Debug, Default)]
pub struct InMemoryActivity {
    stats: DashMap<(String, String), ActivityStat>,
}

impl InMemoryActivity {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ActivityStore for InMemoryActivity {
    fn increment(&self, chat_id: &str, sender_id: &str, display_name: &str, event_id: &str) -> u64 {
        let mut stat = self
            .stats
            .entry((chat_id.to_string(), sender_id.to_string()))
            .or_insert_with(|| ActivityStat {
                count: 0,
                display_name: String::new(),
                last_event_id: String::new(),
            });
        stat.count += 1;
        stat.display_name = display_name.to_string();
        stat.last_event_id = event_id.to_string();
        stat.count
    }

    fn get(&self, chat_id: &str, sender_id: &str) -> Option<ActivityStat> {
        self.stats
            .get(&(chat_id.to_string(), sender_id.to_string()))
            .map(|s| s.clone())
    }

    fn top(&self, chat_id: &str, limit: usize) -> Vec<(String, ActivityStat)> {
        let mut senders: Vec<_> = self
            .stats
            .iter()
            .filter(|e| e.key().0 == chat_id)
            .map(|e| (e.key().1.clone(), e.value().clone()))
            .collect();
        senders.sort_by(|a, b| b.1.count.cmp(&a.1.count).then_with(|| a.0.cmp(&b.0)));
        senders.truncate(limit);
        senders
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_grow_per_sender_per_chat() {
        let activity = InMemoryActivity::new();
        assert_eq!(activity.increment("g1", "a", "Ana", "m1"), 1);
        assert_eq!(activity.increment("g1", "a", "Ana B.", "m2"), 2);
        assert_eq!(activity.increment("g2", "a", "Ana", "m3"), 1);

        let stat = activity.get("g1", "a").unwrap();
        assert_eq!(stat.count, 2);
        assert_eq!(stat.display_name, "Ana B.");
        assert_eq!(stat.last_event_id, "m2");
        assert!(activity.get("g1", "b").is_none());
    }

    #[test]
    fn duplicate_event_counts_twice() {
        let activity = InMemoryActivity::new();
        activity.increment("g1", "a", "Ana", "m1");
        activity.increment("g1", "a", "Ana", "m1");
        assert_eq!(activity.get("g1", "a").unwrap().count, 2);
    }

    #[test]
    fn top_orders_by_count() {
        let activity = InMemoryActivity::new();
        for _ in 0..3 {
            activity.increment("g1", "b", "Bia", "x");
        }
        activity.increment("g1", "a", "Ana", "y");
        activity.increment("g2", "c", "Caio", "z");
        let top = activity.top("g1", 5);
        let order: Vec<_> = top.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(order, vec!["b", "a"]);
        assert_eq!(activity.top("g1", 1).len(), 1);
    }
}
