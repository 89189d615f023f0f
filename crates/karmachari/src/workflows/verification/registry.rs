use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::clock::{Clock, SystemClock};
use super::domain::{Entity, EntityId, EntityKind, EntityPatch, EntityPayload};

/// Storage abstraction for one kind of entity. Persistence is pluggable; the crate ships
/// an in-memory implementation.
pub trait EntityRegistry: Send + Sync {
    fn kind(&self) -> EntityKind;

    /// Store a new record under a freshly assigned id in the lifecycle's initial state.
    fn create(&self, payload: EntityPayload) -> Result<Entity, RegistryError>;

    /// Store a record that already carries its id and status, e.g. seed data.
    fn insert(&self, entity: Entity) -> Result<Entity, RegistryError>;

    fn get(&self, id: &EntityId) -> Result<Entity, RegistryError>;

    /// Insertion-ordered snapshot.
    fn list(&self) -> Result<Vec<Entity>, RegistryError>;

    /// Apply `patch` atomically, preserving the record's position.
    fn update(&self, id: &EntityId, patch: EntityPatch) -> Result<Entity, RegistryError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("{id} not found")]
    NotFound { id: EntityId },
    #[error("{id} already exists")]
    Conflict { id: EntityId },
    #[error("{id} was modified concurrently (expected version {expected}, found {actual})")]
    VersionConflict {
        id: EntityId,
        expected: u64,
        actual: u64,
    },
    #[error("invalid entity: {0}")]
    Validation(String),
    #[error("registry unavailable: {0}")]
    Unavailable(String),
}

#[derive(Default)]
struct Slots {
    records: Vec<Entity>,
    index: HashMap<EntityId, usize>,
}

/// Vector-backed registry; records are never removed so indices stay valid.
pub struct InMemoryEntityRegistry {
    kind: EntityKind,
    clock: Arc<dyn Clock>,
    sequence: AtomicU64,
    slots: Mutex<Slots>,
}

/// First number handed out by a registry, matching ids such as `E101`.
const FIRST_SEQUENCE: u64 = 101;

impl InMemoryEntityRegistry {
    pub fn new(kind: EntityKind) -> Self {
        Self::with_clock(kind, Arc::new(SystemClock))
    }

    pub fn with_clock(kind: EntityKind, clock: Arc<dyn Clock>) -> Self {
        Self {
            kind,
            clock,
            sequence: AtomicU64::new(FIRST_SEQUENCE),
            slots: Mutex::new(Slots::default()),
        }
    }

    fn slots(&self) -> Result<MutexGuard<'_, Slots>, RegistryError> {
        self.slots
            .lock()
            .map_err(|_| RegistryError::Unavailable("registry mutex poisoned".to_string()))
    }

    fn ensure_kind(&self, kind: EntityKind) -> Result<(), RegistryError> {
        if kind == self.kind {
            Ok(())
        } else {
            Err(RegistryError::Validation(format!(
                "{} registry cannot hold {} records",
                self.kind.label().to_lowercase(),
                kind.label().to_lowercase()
            )))
        }
    }

    fn next_id(&self, slots: &Slots) -> EntityId {
        loop {
            let value = self.sequence.fetch_add(1, Ordering::Relaxed);
            let id = EntityId(format!("{}{}", self.kind.id_prefix(), value));
            if !slots.index.contains_key(&id) {
                return id;
            }
        }
    }
}

impl EntityRegistry for InMemoryEntityRegistry {
    fn kind(&self) -> EntityKind {
        self.kind
    }

    fn create(&self, payload: EntityPayload) -> Result<Entity, RegistryError> {
        self.ensure_kind(payload.kind())?;
        let mut slots = self.slots()?;
        let id = self.next_id(&slots);
        let entity = Entity::new(
            id.clone(),
            payload,
            self.kind.lifecycle().initial(),
            self.clock.now(),
        )?;

        let position = slots.records.len();
        slots.records.push(entity.clone());
        slots.index.insert(id, position);
        Ok(entity)
    }

    fn insert(&self, entity: Entity) -> Result<Entity, RegistryError> {
        self.ensure_kind(entity.kind())?;
        let mut slots = self.slots()?;
        if slots.index.contains_key(entity.id()) {
            return Err(RegistryError::Conflict {
                id: entity.id().clone(),
            });
        }

        let position = slots.records.len();
        slots.index.insert(entity.id().clone(), position);
        slots.records.push(entity.clone());
        Ok(entity)
    }

    fn get(&self, id: &EntityId) -> Result<Entity, RegistryError> {
        let slots = self.slots()?;
        slots
            .index
            .get(id)
            .and_then(|position| slots.records.get(*position))
            .cloned()
            .ok_or_else(|| RegistryError::NotFound { id: id.clone() })
    }

    fn list(&self) -> Result<Vec<Entity>, RegistryError> {
        Ok(self.slots()?.records.clone())
    }

    fn update(&self, id: &EntityId, patch: EntityPatch) -> Result<Entity, RegistryError> {
        let mut slots = self.slots()?;
        let position = *slots
            .index
            .get(id)
            .ok_or_else(|| RegistryError::NotFound { id: id.clone() })?;

        let current = slots
            .records
            .get(position)
            .ok_or_else(|| RegistryError::NotFound { id: id.clone() })?;
        let next = current.patched(&patch, self.clock.now())?;

        slots.records[position] = next.clone();
        Ok(next)
    }
}
