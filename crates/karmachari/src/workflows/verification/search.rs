use std::collections::BTreeMap;

use serde::Deserialize;

use super::domain::{Entity, EntityStatus, FilterField};

/// Exact-match constraints keyed by attribute.
pub type StructuredFilters = BTreeMap<FilterField, String>;

/// Narrow `entities` to those matching the free-text `query` and every structured filter.
///
/// The query is matched case-insensitively against each record's precomputed search text;
/// an empty query matches everything. Input order is preserved.
pub fn filter(entities: &[Entity], query: &str, filters: &StructuredFilters) -> Vec<Entity> {
    let needle = query.trim().to_lowercase();
    entities
        .iter()
        .filter(|entity| matches(entity, &needle, filters))
        .cloned()
        .collect()
}

fn matches(entity: &Entity, needle: &str, filters: &StructuredFilters) -> bool {
    if !needle.is_empty() && !entity.search_text().contains(needle) {
        return false;
    }

    filters.iter().all(|(field, expected)| match field {
        FilterField::Status => EntityStatus::parse(expected) == Some(entity.status()),
        other => entity.attribute(*other) == Some(expected.as_str()),
    })
}

/// Query-string form of a search, as sent by dashboard tables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntityQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub employer: Option<String>,
    #[serde(default)]
    pub institution: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl EntityQuery {
    pub fn text(&self) -> &str {
        self.q.as_deref().unwrap_or("")
    }

    /// Structured filters with blank values dropped. Status accepts any casing of the
    /// canonical label or of the label a dashboard shows, and is stored canonically.
    pub fn filters(&self) -> StructuredFilters {
        let mut filters = StructuredFilters::new();
        let pairs = [
            (FilterField::District, &self.district),
            (FilterField::Employer, &self.employer),
            (FilterField::Institution, &self.institution),
        ];
        for (field, value) in pairs {
            if let Some(value) = value.as_deref().filter(|value| !value.trim().is_empty()) {
                filters.insert(field, value.to_string());
            }
        }

        if let Some(raw) = self.status.as_deref().filter(|value| !value.trim().is_empty()) {
            let label = EntityStatus::parse(raw)
                .map(|status| status.label().to_string())
                .unwrap_or_else(|| raw.to_string());
            filters.insert(FilterField::Status, label);
        }
        filters
    }

    pub fn apply(&self, entities: &[Entity]) -> Vec<Entity> {
        filter(entities, self.text(), &self.filters())
    }
}
