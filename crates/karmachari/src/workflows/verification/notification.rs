use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::clock::Clock;
use crate::config::DEFAULT_NOTIFICATION_TTL_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Error,
}

/// Reference to an emitted notification, used to dismiss it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationHandle(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub handle: NotificationHandle,
    pub message: String,
    pub kind: NotificationKind,
    pub emitted_at: DateTime<Utc>,
    /// `None` for notifications that stay until dismissed or replaced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Notification {
    pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now < expires_at,
            None => true,
        }
    }
}

/// Outbound hook for user-facing messages.
pub trait NotificationEmitter: Send + Sync {
    fn emit(&self, message: String, kind: NotificationKind) -> NotificationHandle;

    /// The notification currently on screen, if any.
    fn active(&self) -> Option<Notification>;

    /// Clear the active notification if `handle` is still the one shown.
    fn dismiss(&self, handle: NotificationHandle) -> bool;
}

/// Single-slot, last-write-wins notification surface.
///
/// Success messages disappear after the configured lifetime; error messages stay until
/// dismissed or replaced by the next emit.
pub struct NotificationCenter {
    clock: Arc<dyn Clock>,
    ttl: Duration,
    sequence: AtomicU64,
    current: Mutex<Option<Notification>>,
}

impl NotificationCenter {
    pub fn new(clock: Arc<dyn Clock>, ttl_ms: u64) -> Self {
        let ttl_ms = i64::try_from(ttl_ms).unwrap_or(i64::MAX);
        Self {
            clock,
            ttl: Duration::milliseconds(ttl_ms),
            sequence: AtomicU64::new(1),
            current: Mutex::new(None),
        }
    }

    pub fn with_default_ttl(clock: Arc<dyn Clock>) -> Self {
        Self::new(clock, DEFAULT_NOTIFICATION_TTL_MS)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn slot(&self) -> MutexGuard<'_, Option<Notification>> {
        // A poisoned slot only ever holds a fully written Option.
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl NotificationEmitter for NotificationCenter {
    fn emit(&self, message: String, kind: NotificationKind) -> NotificationHandle {
        let handle = NotificationHandle(self.sequence.fetch_add(1, Ordering::Relaxed));
        let emitted_at = self.clock.now();
        let expires_at = match kind {
            NotificationKind::Success => emitted_at.checked_add_signed(self.ttl),
            NotificationKind::Error => None,
        };

        *self.slot() = Some(Notification {
            handle,
            message,
            kind,
            emitted_at,
            expires_at,
        });
        handle
    }

    fn active(&self) -> Option<Notification> {
        let now = self.clock.now();
        let mut slot = self.slot();
        match slot.as_ref() {
            Some(notification) if notification.is_visible_at(now) => Some(notification.clone()),
            Some(_) => {
                *slot = None;
                None
            }
            None => None,
        }
    }

    fn dismiss(&self, handle: NotificationHandle) -> bool {
        let mut slot = self.slot();
        match slot.as_ref() {
            Some(notification) if notification.handle == handle => {
                *slot = None;
                true
            }
            _ => false,
        }
    }
}
