//! User-visible notifications.
//!
//! Every user-facing failure or confirmation goes through here: a bounded
//! queue of dismissible entries that expire after a fixed duration. Time is
//! passed in by the caller so expiry is testable without sleeping.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Max notifications kept active at once; the oldest is dropped beyond this.
const MAX_ACTIVE: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Warning,
    Error,
    Info,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: u64,
    pub level: NotificationLevel,
    pub message: String,
    expires_at: Instant,
}

pub struct NotificationCenter {
    active: VecDeque<Notification>,
    next_id: u64,
    ttl: Duration,
}

impl NotificationCenter {
    pub fn new(ttl: Duration) -> Self {
        Self {
            active: VecDeque::new(),
            next_id: 1,
            ttl,
        }
    }

    /// Post a notification; returns its id for early manual dismissal.
    pub fn push(&mut self, level: NotificationLevel, message: impl Into<String>, now: Instant) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        if self.active.len() >= MAX_ACTIVE {
            self.active.pop_front();
        }
        self.active.push_back(Notification {
            id,
            level,
            message: message.into(),
            expires_at: now + self.ttl,
        });
        id
    }

    /// Dismiss one notification before its TTL elapses.
    pub fn dismiss(&mut self, id: u64) {
        self.active.retain(|n| n.id != id);
    }

    /// Drop everything whose TTL has elapsed.
    pub fn sweep(&mut self, now: Instant) {
        self.active.retain(|n| n.expires_at > now);
    }

    pub fn active(&self) -> impl Iterator<Item = &Notification> {
        self.active.iter()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_dismiss_after_ttl() {
        let mut center = NotificationCenter::new(Duration::from_secs(5));
        let start = Instant::now();
        center.push(NotificationLevel::Success, "DCA ranking updated successfully!", start);

        center.sweep(start + Duration::from_secs(4));
        assert_eq!(center.len(), 1);
        center.sweep(start + Duration::from_secs(6));
        assert!(center.is_empty());
    }

    #[test]
    fn manual_dismiss_before_ttl() {
        let mut center = NotificationCenter::new(Duration::from_secs(5));
        let start = Instant::now();
        let id = center.push(NotificationLevel::Error, "Failed to fetch ranking data", start);
        center.push(NotificationLevel::Info, "second", start);

        center.dismiss(id);
        assert_eq!(center.len(), 1);
        assert_eq!(center.active().next().unwrap().message, "second");
    }

    #[test]
    fn queue_is_bounded() {
        let mut center = NotificationCenter::new(Duration::from_secs(5));
        let start = Instant::now();
        for i in 0..60 {
            center.push(NotificationLevel::Info, format!("n{}", i), start);
        }
        assert_eq!(center.len(), MAX_ACTIVE);
        // Oldest entries were dropped first.
        assert_eq!(center.active().next().unwrap().message, "n10");
    }
}
