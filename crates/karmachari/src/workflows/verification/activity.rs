use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{Entity, EntityId, EntityKind, EntityStatus};
use super::lifecycle::WorkflowAction;
use crate::config::DEFAULT_ACTIVITY_CAPACITY;

/// One line of the rolling audit feed shown on officer dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityEntry {
    pub sequence: u64,
    pub at: DateTime<Utc>,
    pub kind: EntityKind,
    pub entity_id: EntityId,
    pub display_name: String,
    pub action: WorkflowAction,
    pub status: EntityStatus,
    pub message: String,
}

/// Bounded, newest-first feed of successful workflow actions.
pub struct ActivityLog {
    capacity: usize,
    sequence: AtomicU64,
    entries: Mutex<VecDeque<ActivityEntry>>,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_ACTIVITY_CAPACITY)
    }
}

impl ActivityLog {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            sequence: AtomicU64::new(1),
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn entries(&self) -> MutexGuard<'_, VecDeque<ActivityEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append the outcome of `action`, which left `entity` in its current state.
    pub fn record(
        &self,
        at: DateTime<Utc>,
        entity: &Entity,
        action: WorkflowAction,
        message: String,
    ) -> ActivityEntry {
        let entry = ActivityEntry {
            sequence: self.sequence.fetch_add(1, Ordering::Relaxed),
            at,
            kind: entity.kind(),
            entity_id: entity.id().clone(),
            display_name: entity.display_name(),
            action,
            status: entity.status(),
            message,
        };

        let mut entries = self.entries();
        entries.push_front(entry.clone());
        entries.truncate(self.capacity);
        entry
    }

    /// Up to `limit` most recent entries, newest first.
    pub fn recent(&self, limit: usize) -> Vec<ActivityEntry> {
        self.entries().iter().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::verification::domain::{EmployerProfile, EntityPayload};

    fn record(log: &ActivityLog, id: &str) -> ActivityEntry {
        let at = DateTime::from_timestamp(1_760_000_000, 0).expect("valid timestamp");
        let employer = Entity::new(
            id.into(),
            EntityPayload::Employer(EmployerProfile {
                business_name: "IHRD".to_string(),
                owner: "Mr. Suresh Kumar".to_string(),
                district: "Ernakulam".to_string(),
                category: None,
                document_url: "https://example.com/ihrd-doc.pdf".to_string(),
            }),
            EntityStatus::Approved,
            at,
        )
        .expect("employer");
        log.record(
            at,
            &employer,
            WorkflowAction::Verify,
            format!("Employer IHRD ({id}) verified and accepted."),
        )
    }

    #[test]
    fn keeps_newest_entries_first_within_capacity() {
        let log = ActivityLog::with_capacity(2);
        record(&log, "E101");
        record(&log, "E102");
        record(&log, "E103");

        let recent = log.recent(10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].entity_id.as_str(), "E103");
        assert_eq!(recent[1].entity_id.as_str(), "E102");
        assert!(recent[0].sequence > recent[1].sequence);
    }

    #[test]
    fn recent_honours_limit() {
        let log = ActivityLog::default();
        record(&log, "E101");
        record(&log, "E102");
        assert_eq!(log.recent(1).len(), 1);
        assert_eq!(log.len(), 2);
    }
}
