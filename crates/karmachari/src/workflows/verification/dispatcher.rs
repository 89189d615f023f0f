use std::sync::Arc;

use tracing::{info, warn};

use super::activity::ActivityLog;
use super::clock::Clock;
use super::domain::{Entity, EntityId, EntityKind, EntityPatch, EntityPayload};
use super::lifecycle::{transition, TransitionError, WorkflowAction};
use super::notification::{NotificationEmitter, NotificationHandle, NotificationKind};
use super::registry::{EntityRegistry, RegistryError};

/// Applies user actions to one registry: validates them against the lifecycle, mutates
/// the record, appends to the activity feed and emits exactly one notification per call.
pub struct ActionDispatcher<R, N> {
    registry: Arc<R>,
    notifier: Arc<N>,
    activity: Arc<ActivityLog>,
    clock: Arc<dyn Clock>,
}

impl<R, N> ActionDispatcher<R, N>
where
    R: EntityRegistry + 'static,
    N: NotificationEmitter + 'static,
{
    pub fn new(
        registry: Arc<R>,
        notifier: Arc<N>,
        activity: Arc<ActivityLog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            notifier,
            activity,
            clock,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.registry.kind()
    }

    pub fn registry(&self) -> &Arc<R> {
        &self.registry
    }

    /// Register a new record in the lifecycle's initial state.
    pub fn register(&self, payload: EntityPayload) -> Result<Entity, DispatchError> {
        let kind = self.kind();
        let entity = self
            .registry
            .create(payload)
            .map_err(|err| DispatchError::from_registry(kind, err))?;
        info!(kind = kind.slug(), id = %entity.id(), "entity registered");
        Ok(entity)
    }

    pub fn get(&self, id: &EntityId) -> Result<Entity, DispatchError> {
        self.registry
            .get(id)
            .map_err(|err| DispatchError::from_registry(self.kind(), err))
    }

    pub fn list(&self) -> Result<Vec<Entity>, DispatchError> {
        self.registry
            .list()
            .map_err(|err| DispatchError::from_registry(self.kind(), err))
    }

    pub fn verify(&self, id: &EntityId) -> Result<Entity, DispatchError> {
        self.dispatch(id, WorkflowAction::Verify, None)
    }

    pub fn reject(&self, id: &EntityId, reason: Option<String>) -> Result<Entity, DispatchError> {
        self.dispatch(id, WorkflowAction::Reject, reason)
    }

    pub fn resolve(&self, id: &EntityId) -> Result<Entity, DispatchError> {
        self.dispatch(id, WorkflowAction::Resolve, None)
    }

    pub fn approve_wage(&self, id: &EntityId) -> Result<Entity, DispatchError> {
        self.dispatch(id, WorkflowAction::ApproveWage, None)
    }

    /// Send a decided record back to its initial state, clearing any rejection reason.
    pub fn reopen(&self, id: &EntityId) -> Result<Entity, DispatchError> {
        self.dispatch(id, WorkflowAction::Reopen, None)
    }

    pub fn mark_filled(&self, id: &EntityId) -> Result<Entity, DispatchError> {
        self.dispatch(id, WorkflowAction::MarkFilled, None)
    }

    /// Replace a rejected record's details and send it back for verification.
    pub fn resubmit(&self, id: &EntityId, payload: EntityPayload) -> Result<Entity, DispatchError> {
        self.perform(id, WorkflowAction::Resubmit, ActionInput::payload(payload))
            .map(|outcome| outcome.entity)
    }

    /// Run `action` against `id`. `reason` is only stored for rejections.
    pub fn dispatch(
        &self,
        id: &EntityId,
        action: WorkflowAction,
        reason: Option<String>,
    ) -> Result<Entity, DispatchError> {
        self.perform(id, action, ActionInput::reason(reason))
            .map(|outcome| outcome.entity)
    }

    /// Like [`dispatch`](Self::dispatch), also reporting which notification the action raised.
    pub fn perform(
        &self,
        id: &EntityId,
        action: WorkflowAction,
        input: ActionInput,
    ) -> Result<ActionOutcome, DispatchError> {
        let kind = self.kind();
        match self.apply(id, action, input) {
            Ok((entity, message)) => {
                self.activity
                    .record(self.clock.now(), &entity, action, message.clone());
                let notification = self.notifier.emit(message, NotificationKind::Success);
                info!(
                    kind = kind.slug(),
                    id = %entity.id(),
                    action = action.label(),
                    status = entity.status().label(),
                    "workflow action applied"
                );
                Ok(ActionOutcome {
                    entity,
                    notification,
                })
            }
            Err(err) => {
                warn!(
                    kind = kind.slug(),
                    id = %id,
                    action = action.label(),
                    error = %err,
                    "workflow action failed"
                );
                self.notifier.emit(err.to_string(), NotificationKind::Error);
                Err(err)
            }
        }
    }

    fn apply(
        &self,
        id: &EntityId,
        action: WorkflowAction,
        input: ActionInput,
    ) -> Result<(Entity, String), DispatchError> {
        let kind = self.kind();
        if id.as_str().trim().is_empty() {
            return Err(DispatchError::Validation(
                "entity id must not be empty".to_string(),
            ));
        }

        let current = self
            .registry
            .get(id)
            .map_err(|err| DispatchError::from_registry(kind, err))?;
        let next_status = transition(&current, action)?;

        let ActionInput { reason, payload } = input;
        let reason = reason
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        let mut patch = EntityPatch::status(next_status).expecting_version(current.version());
        match action {
            WorkflowAction::Reject => patch = patch.with_rejection_reason(reason.clone()),
            WorkflowAction::Reopen => patch = patch.with_rejection_reason(None),
            WorkflowAction::Resubmit => {
                let Some(payload) = payload else {
                    return Err(DispatchError::Validation(
                        "resubmission requires corrected details".to_string(),
                    ));
                };
                patch.payload = Some(payload);
                patch = patch.with_rejection_reason(None);
            }
            _ => {}
        }

        let updated = self
            .registry
            .update(id, patch)
            .map_err(|err| DispatchError::from_registry(kind, err))?;

        let mut message = format!("{} {}.", subject(&updated), action.outcome_phrase(kind));
        if let (WorkflowAction::Reject, Some(reason)) = (action, reason) {
            message = format!("{} Reason: {}", message, reason);
        }
        Ok((updated, message))
    }
}

/// Extra input carried by an action.
#[derive(Debug, Clone, Default)]
pub struct ActionInput {
    pub reason: Option<String>,
    pub payload: Option<EntityPayload>,
}

impl ActionInput {
    pub fn reason(reason: Option<String>) -> Self {
        Self {
            reason,
            ..Self::default()
        }
    }

    pub fn payload(payload: EntityPayload) -> Self {
        Self {
            payload: Some(payload),
            ..Self::default()
        }
    }
}

/// A successfully applied action and the notification it raised.
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    pub entity: Entity,
    pub notification: NotificationHandle,
}

/// "Employer IHRD (E101)", "Grievance G101 from Ravi K", ...
fn subject(entity: &Entity) -> String {
    let kind = entity.kind();
    let id = entity.id();
    let name = entity.display_name();
    match kind {
        EntityKind::Grievance | EntityKind::Resignation => {
            format!("{} {} from {}", kind.label(), id, name)
        }
        EntityKind::WageSlip => format!("{} {} for {}", kind.label(), id, name),
        _ => format!("{} {} ({})", kind.label(), name, id),
    }
}

/// Error raised by the dispatcher. Every variant leaves the registry unchanged.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: EntityId },
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl DispatchError {
    pub(crate) fn from_registry(kind: EntityKind, err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound { id } => DispatchError::NotFound { kind, id },
            RegistryError::Validation(message) => DispatchError::Validation(message),
            other => DispatchError::Registry(other),
        }
    }
}
