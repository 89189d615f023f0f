use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::config::WorkflowConfig;
use crate::workflows::verification::activity::ActivityLog;
use crate::workflows::verification::clock::{Clock, ManualClock};
use crate::workflows::verification::dispatcher::ActionDispatcher;
use crate::workflows::verification::domain::{
    EmployerProfile, Entity, EntityId, EntityKind, EntityPatch, EntityPayload, EntityStatus,
    GrievanceReport, SchoolProfile,
};
use crate::workflows::verification::notification::{
    Notification, NotificationEmitter, NotificationHandle, NotificationKind,
};
use crate::workflows::verification::portal::InMemoryPortal;
use crate::workflows::verification::registry::{
    EntityRegistry, InMemoryEntityRegistry, RegistryError,
};
use crate::workflows::verification::seed::seed_portal;

pub(super) fn start() -> DateTime<Utc> {
    DateTime::from_timestamp(1_760_000_000, 0).expect("valid timestamp")
}

pub(super) fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(start()))
}

pub(super) fn employer_payload(name: &str, district: &str) -> EntityPayload {
    EntityPayload::Employer(EmployerProfile {
        business_name: name.to_string(),
        owner: "Mr. Suresh Kumar".to_string(),
        district: district.to_string(),
        category: None,
        document_url: format!("https://example.com/{}.pdf", name.to_lowercase()),
    })
}

pub(super) fn school_payload(name: &str) -> EntityPayload {
    EntityPayload::School(SchoolProfile {
        name: name.to_string(),
        principal: "Dr. Mini Joseph".to_string(),
        district: "Ernakulam".to_string(),
        document_url: "https://example.com/affiliation.pdf".to_string(),
    })
}

pub(super) fn grievance_payload(raised_by: &str, issue: &str, district: &str) -> EntityPayload {
    EntityPayload::Grievance(GrievanceReport {
        raised_by: raised_by.to_string(),
        issue: issue.to_string(),
        concerning: None,
        district: Some(district.to_string()),
    })
}

pub(super) fn entity(id: &str, payload: EntityPayload, status: EntityStatus) -> Entity {
    Entity::new(EntityId::from(id), payload, status, start()).expect("valid seed entity")
}

/// Records every emit so tests can count notifications.
#[derive(Default)]
pub(super) struct MemoryNotifier {
    emitted: Mutex<Vec<(String, NotificationKind)>>,
}

impl MemoryNotifier {
    pub(super) fn emitted(&self) -> Vec<(String, NotificationKind)> {
        self.emitted.lock().expect("notifier lock").clone()
    }
}

impl NotificationEmitter for MemoryNotifier {
    fn emit(&self, message: String, kind: NotificationKind) -> NotificationHandle {
        let mut emitted = self.emitted.lock().expect("notifier lock");
        emitted.push((message, kind));
        NotificationHandle(emitted.len() as u64)
    }

    fn active(&self) -> Option<Notification> {
        let emitted = self.emitted.lock().expect("notifier lock");
        emitted.last().map(|(message, kind)| Notification {
            handle: NotificationHandle(emitted.len() as u64),
            message: message.clone(),
            kind: *kind,
            emitted_at: start(),
            expires_at: None,
        })
    }

    fn dismiss(&self, _handle: NotificationHandle) -> bool {
        false
    }
}

pub(super) struct DispatcherFixture {
    pub(super) dispatcher: ActionDispatcher<InMemoryEntityRegistry, MemoryNotifier>,
    pub(super) registry: Arc<InMemoryEntityRegistry>,
    pub(super) notifier: Arc<MemoryNotifier>,
    pub(super) activity: Arc<ActivityLog>,
}

/// Dispatcher over a registry of `kind` preloaded with `seed`.
pub(super) fn dispatcher_with(kind: EntityKind, seed: Vec<Entity>) -> DispatcherFixture {
    let clock = manual_clock();
    let registry = Arc::new(InMemoryEntityRegistry::with_clock(
        kind,
        clock.clone() as Arc<dyn Clock>,
    ));
    for record in seed {
        registry.insert(record).expect("seed insert");
    }
    let notifier = Arc::new(MemoryNotifier::default());
    let activity = Arc::new(ActivityLog::default());
    let dispatcher = ActionDispatcher::new(
        registry.clone(),
        notifier.clone(),
        activity.clone(),
        clock as Arc<dyn Clock>,
    );
    DispatcherFixture {
        dispatcher,
        registry,
        notifier,
        activity,
    }
}

/// Registry whose storage is always down.
pub(super) struct UnavailableRegistry;

impl EntityRegistry for UnavailableRegistry {
    fn kind(&self) -> EntityKind {
        EntityKind::Employer
    }

    fn create(&self, _payload: EntityPayload) -> Result<Entity, RegistryError> {
        Err(RegistryError::Unavailable("offline".to_string()))
    }

    fn insert(&self, _entity: Entity) -> Result<Entity, RegistryError> {
        Err(RegistryError::Unavailable("offline".to_string()))
    }

    fn get(&self, _id: &EntityId) -> Result<Entity, RegistryError> {
        Err(RegistryError::Unavailable("offline".to_string()))
    }

    fn list(&self) -> Result<Vec<Entity>, RegistryError> {
        Err(RegistryError::Unavailable("offline".to_string()))
    }

    fn update(&self, _id: &EntityId, _patch: EntityPatch) -> Result<Entity, RegistryError> {
        Err(RegistryError::Unavailable("offline".to_string()))
    }
}

/// Demo-seeded portal driven by a manual clock.
pub(super) fn seeded_portal() -> (Arc<InMemoryPortal>, Arc<ManualClock>) {
    let clock = manual_clock();
    let portal = InMemoryPortal::in_memory(&WorkflowConfig::default(), clock.clone());
    seed_portal(&portal).expect("demo seed");
    (Arc::new(portal), clock)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body readable");
    serde_json::from_slice(&body).expect("json body")
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body readable");
    String::from_utf8(body.to_vec()).expect("utf8 body")
}
