// Transient user-facing messages
// A notification is visible from the moment it is pushed until its TTL runs out.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

pub const DEFAULT_NOTIFICATION_TTL_MS: u64 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub kind: NotificationKind,
    pub shown_at: DateTime<Utc>,
}

impl Notification {
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.shown_at >= ttl
    }
}

#[derive(Debug)]
pub struct NotificationCenter {
    ttl: Duration,
    next_id: u64,
    items: Vec<Notification>,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_TTL_MS)
    }
}

impl NotificationCenter {
    pub fn new(ttl_ms: u64) -> Self {
        Self {
            ttl: Duration::milliseconds(ttl_ms as i64),
            next_id: 1,
            items: Vec::new(),
        }
    }

    pub fn push(
        &mut self,
        message: impl Into<String>,
        kind: NotificationKind,
        now: DateTime<Utc>,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        let message = message.into();
        match kind {
            NotificationKind::Error => tracing::info!(id, %message, "Showing error notification"),
            _ => tracing::debug!(id, %message, ?kind, "Showing notification"),
        }

        self.items.push(Notification {
            id,
            message,
            kind,
            shown_at: now,
        });
        id
    }

    pub fn error(&mut self, message: impl Into<String>, now: DateTime<Utc>) -> u64 {
        self.push(message, NotificationKind::Error, now)
    }

    pub fn success(&mut self, message: impl Into<String>, now: DateTime<Utc>) -> u64 {
        self.push(message, NotificationKind::Success, now)
    }

    pub fn info(&mut self, message: impl Into<String>, now: DateTime<Utc>) -> u64 {
        self.push(message, NotificationKind::Info, now)
    }

    // Notifications still on screen at `now`
    pub fn active(&self, now: DateTime<Utc>) -> Vec<&Notification> {
        self.items
            .iter()
            .filter(|n| !n.is_expired(now, self.ttl))
            .collect()
    }

    // Drops expired notifications, returns how many were removed
    pub fn prune(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.items.len();
        let ttl = self.ttl;
        self.items.retain(|n| !n.is_expired(now, ttl));
        before - self.items.len()
    }

    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        before != self.items.len()
    }

    pub fn latest(&self) -> Option<&Notification> {
        self.items.last()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_notifications_auto_dismiss_after_ttl() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let mut center = NotificationCenter::new(3000);

        let first = center.error("Please select valid dates", start);
        center.success("Saved", start + Duration::milliseconds(2000));
        assert_eq!(center.active(start + Duration::milliseconds(2999)).len(), 2);

        let later = start + Duration::milliseconds(3000);
        let active = center.active(later);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].message, "Saved");

        assert_eq!(center.prune(later), 1);
        assert!(!center.dismiss(first));
        assert_eq!(center.len(), 1);
    }

    #[test]
    fn test_dismiss_by_id() {
        let now = Utc::now();
        let mut center = NotificationCenter::default();
        let id = center.info("Loading", now);
        assert_eq!(center.latest().map(|n| n.kind), Some(NotificationKind::Info));
        assert!(center.dismiss(id));
        assert!(center.is_empty());
    }
}
