use chrono::{DateTime, Utc};
use serde::Serialize;

use super::super::domain::{
    DisplayField, Entity, EntityId, EntityKind, EntityPayload, EntityStatus,
};

/// Flattened record as served to dashboards and exports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityView {
    pub id: EntityId,
    pub kind: EntityKind,
    pub kind_label: &'static str,
    pub status: EntityStatus,
    pub status_label: &'static str,
    pub verified: bool,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    pub version: u64,
    pub updated_at: DateTime<Utc>,
    pub fields: Vec<DisplayField>,
    pub payload: EntityPayload,
}

impl From<&Entity> for EntityView {
    fn from(entity: &Entity) -> Self {
        Self {
            id: entity.id().clone(),
            kind: entity.kind(),
            kind_label: entity.kind().label(),
            status: entity.status(),
            status_label: entity.status_label(),
            verified: entity.is_verified(),
            display_name: entity.display_name(),
            rejection_reason: entity.rejection_reason().map(str::to_string),
            version: entity.version(),
            updated_at: entity.updated_at(),
            fields: entity.display_fields(),
            payload: entity.payload().clone(),
        }
    }
}

impl From<Entity> for EntityView {
    fn from(entity: Entity) -> Self {
        Self::from(&entity)
    }
}

impl EntityView {
    /// Rendered value of the named column, if present.
    pub fn rendered(&self, name: &str) -> Option<String> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.value.render())
    }
}
