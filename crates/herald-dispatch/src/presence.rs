// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-chat cooldown for the standing presence side effect.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::time::Instant;
use tracing::trace;

/// Acquire attempts between sweeps of expired chats.
const SWEEP_EVERY: u64 = 256;

/// Grants at most one presence update per chat per cooldown window.
#[derive(Debug)]
pub struct PresenceThrottle {
    cooldown: Duration,
    last_sent: DashMap<String, Instant>,
    attempts: AtomicU64,
}

impl PresenceThrottle {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_sent: DashMap::new(),
            attempts: AtomicU64::new(0),
        }
    }

    /// Chats currently in cooldown (or not yet swept).
    pub fn len(&self) -> usize {
        self.last_sent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_sent.is_empty()
    }

    /// Forgets chats whose cooldown has elapsed.
    pub fn prune(&self) {
        let now = Instant::now();
        let before = self.last_sent.len();
        self.last_sent
            .retain(|_, last| now.duration_since(*last) < self.cooldown);
        trace!(before, after = self.last_sent.len(), "presence throttle swept");
    }

    /// Returns `true` and records the attempt if the chat is out of cooldown.
    pub fn try_acquire(&self, chat_id: &str) -> bool {
        if self.attempts.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == SWEEP_EVERY - 1 {
            self.prune();
        }
        let now = Instant::now();
        match self.last_sent.entry(chat_id.to_string()) {
            Entry::Occupied(mut last) => {
                if now.duration_since(*last.get()) < self.cooldown {
                    return false;
                }
                last.insert(now);
                true
            }
            Entry::Vacant(slot) => {
                slot.insert(now);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn second_update_within_cooldown_is_skipped() {
        let throttle = PresenceThrottle::new(Duration::from_secs(5));
        assert!(throttle.try_acquire("123@g.us"));
        assert!(!throttle.try_acquire("123@g.us"));
        assert!(throttle.try_acquire("456@s.whatsapp.net"));

        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(throttle.try_acquire("123@g.us"));
    }

    #[tokio::test(start_paused = true)]
    async fn expired_chats_are_forgotten() {
        let throttle = PresenceThrottle::new(Duration::from_secs(5));
        assert!(throttle.is_empty());
        for i in 0..10 {
            throttle.try_acquire(&format!("{i}@g.us"));
        }
        tokio::time::advance(Duration::from_secs(3)).await;
        throttle.try_acquire("fresh@g.us");
        assert_eq!(throttle.len(), 11);

        tokio::time::advance(Duration::from_secs(2)).await;
        throttle.prune();
        assert_eq!(throttle.len(), 1);
        assert!(!throttle.try_acquire("fresh@g.us"));
    }

    #[tokio::test(start_paused = true)]
    async fn many_one_off_chats_do_not_accumulate() {
        let throttle = PresenceThrottle::new(Duration::from_secs(1));
        for round in 0..4 {
            for i in 0..SWEEP_EVERY {
                assert!(throttle.try_acquire(&format!("{round}-{i}@s.whatsapp.net")));
            }
            tokio::time::advance(Duration::from_secs(2)).await;
        }
        assert!(throttle.len() <= SWEEP_EVERY as usize);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_cooldown_never_throttles() {
        let throttle = PresenceThrottle::new(Duration::ZERO);
        assert!(throttle.try_acquire("a"));
        assert!(throttle.try_acquire("a"));
    }
}
