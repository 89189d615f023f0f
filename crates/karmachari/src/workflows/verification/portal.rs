use std::collections::BTreeMap;
use std::sync::Arc;

use super::activity::ActivityLog;
use super::clock::Clock;
use super::dispatcher::{ActionDispatcher, DispatchError};
use super::domain::{Entity, EntityKind, EntityPayload};
use super::notification::{NotificationCenter, NotificationEmitter};
use super::registry::{EntityRegistry, InMemoryEntityRegistry, RegistryError};
use super::report::{summarize, EntityView, VerificationSummary};
use super::search::EntityQuery;
use crate::config::WorkflowConfig;

/// Every registry an official works with, sharing one notification surface and one
/// activity feed.
pub struct Portal<R, N> {
    dispatchers: BTreeMap<EntityKind, ActionDispatcher<R, N>>,
    notifications: Arc<N>,
    activity: Arc<ActivityLog>,
    clock: Arc<dyn Clock>,
}

pub type InMemoryPortal = Portal<InMemoryEntityRegistry, NotificationCenter>;

impl<R, N> Portal<R, N>
where
    R: EntityRegistry + 'static,
    N: NotificationEmitter + 'static,
{
    pub fn new(notifications: Arc<N>, activity: Arc<ActivityLog>, clock: Arc<dyn Clock>) -> Self {
        Self {
            dispatchers: BTreeMap::new(),
            notifications,
            activity,
            clock,
        }
    }

    /// Attach a registry; a later registry for the same kind replaces the earlier one.
    pub fn with_registry(mut self, registry: Arc<R>) -> Self {
        let dispatcher = ActionDispatcher::new(
            registry,
            Arc::clone(&self.notifications),
            Arc::clone(&self.activity),
            Arc::clone(&self.clock),
        );
        self.dispatchers.insert(dispatcher.kind(), dispatcher);
        self
    }

    pub fn kinds(&self) -> Vec<EntityKind> {
        self.dispatchers.keys().copied().collect()
    }

    pub fn dispatcher(&self, kind: EntityKind) -> Result<&ActionDispatcher<R, N>, DispatchError> {
        self.dispatchers.get(&kind).ok_or_else(|| {
            DispatchError::Registry(RegistryError::Unavailable(format!(
                "no registry configured for {}",
                kind.label().to_lowercase()
            )))
        })
    }

    pub fn notifications(&self) -> &Arc<N> {
        &self.notifications
    }

    pub fn activity(&self) -> &Arc<ActivityLog> {
        &self.activity
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn register(&self, payload: EntityPayload) -> Result<Entity, DispatchError> {
        self.dispatcher(payload.kind())?.register(payload)
    }

    /// Store a record exactly as given, keeping its id and status.
    pub fn insert(&self, entity: Entity) -> Result<Entity, DispatchError> {
        let kind = entity.kind();
        self.dispatcher(kind)?
            .registry()
            .insert(entity)
            .map_err(|err| DispatchError::from_registry(kind, err))
    }

    pub fn search(&self, kind: EntityKind, query: &EntityQuery) -> Result<Vec<Entity>, DispatchError> {
        let records = self.dispatcher(kind)?.list()?;
        Ok(query.apply(&records))
    }

    /// Every record across all registries, in kind order then insertion order.
    pub fn snapshot(&self) -> Result<Vec<Entity>, DispatchError> {
        let mut records = Vec::new();
        for dispatcher in self.dispatchers.values() {
            records.extend(dispatcher.list()?);
        }
        Ok(records)
    }

    pub fn views(&self, kind: Option<EntityKind>) -> Result<Vec<EntityView>, DispatchError> {
        let records = match kind {
            Some(kind) => self.dispatcher(kind)?.list()?,
            None => self.snapshot()?,
        };
        Ok(records.iter().map(EntityView::from).collect())
    }

    pub fn summary(&self) -> Result<VerificationSummary, DispatchError> {
        Ok(summarize(&self.snapshot()?))
    }
}

impl InMemoryPortal {
    /// A portal with an in-memory registry for every kind.
    pub fn in_memory(config: &WorkflowConfig, clock: Arc<dyn Clock>) -> Self {
        let notifications = Arc::new(NotificationCenter::new(
            Arc::clone(&clock),
            config.notification_ttl_ms,
        ));
        let activity = Arc::new(ActivityLog::with_capacity(config.activity_capacity));

        EntityKind::ordered().into_iter().fold(
            Portal::new(notifications, activity, Arc::clone(&clock)),
            |portal, kind| {
                portal.with_registry(Arc::new(InMemoryEntityRegistry::with_clock(
                    kind,
                    Arc::clone(&clock),
                )))
            },
        )
    }
}
