use super::common::*;
use crate::workflows::verification::domain::{EntityKind, EntityStatus, FilterField};
use crate::workflows::verification::search::{filter, EntityQuery, StructuredFilters};

#[test]
fn text_query_and_district_filter_combine_with_and() {
    let entities = vec![
        entity(
            "G1001",
            grievance_payload("Asha P", "Wrong pay scale for trade XY", "Ernakulam"),
            EntityStatus::Open,
        ),
        entity(
            "G1002",
            grievance_payload("Asha P", "Incorrect working hours", "Thrissur"),
            EntityStatus::Open,
        ),
        entity(
            "G1003",
            grievance_payload("Ravi K", "Late wage payment", "Ernakulam"),
            EntityStatus::Open,
        ),
    ];
    let mut filters = StructuredFilters::new();
    filters.insert(FilterField::District, "Ernakulam".to_string());

    let matched = filter(&entities, "asha", &filters);
    let ids: Vec<&str> = matched.iter().map(|record| record.id().as_str()).collect();
    assert_eq!(ids, vec!["G1001"]);
}

#[test]
fn unmatched_query_yields_empty_result() {
    let entities = vec![entity(
        "E101",
        employer_payload("IHRD", "Ernakulam"),
        EntityStatus::Pending,
    )];
    assert!(filter(&entities, "zzz-no-match", &StructuredFilters::new()).is_empty());
}

#[test]
fn blank_query_without_filters_returns_everything_in_order() {
    let entities = vec![
        entity("E101", employer_payload("IHRD", "Ernakulam"), EntityStatus::Pending),
        entity(
            "E102",
            employer_payload("RC Technologies", "Thrissur"),
            EntityStatus::Approved,
        ),
    ];
    assert_eq!(filter(&entities, "   ", &StructuredFilters::new()), entities);
}

#[test]
fn query_is_case_insensitive_and_matches_ids_and_labels() {
    let entities = vec![
        entity("E101", employer_payload("IHRD", "Ernakulam"), EntityStatus::Pending),
        entity(
            "E102",
            employer_payload("RC Technologies", "Thrissur"),
            EntityStatus::Approved,
        ),
    ];

    let by_id = filter(&entities, "e102", &StructuredFilters::new());
    assert_eq!(by_id.len(), 1);

    let by_label = filter(&entities, "ACCEPTED", &StructuredFilters::new());
    assert_eq!(by_label.len(), 1);
    assert_eq!(by_label[0].id().as_str(), "E102");
}

#[test]
fn document_links_are_not_searchable() {
    let entities = vec![entity(
        "E101",
        employer_payload("IHRD", "Ernakulam"),
        EntityStatus::Pending,
    )];
    assert!(filter(&entities, "example.com", &StructuredFilters::new()).is_empty());
}

#[test]
fn filter_on_missing_attribute_excludes_record() {
    let entities = vec![entity(
        "E101",
        employer_payload("IHRD", "Ernakulam"),
        EntityStatus::Pending,
    )];
    let mut filters = StructuredFilters::new();
    filters.insert(FilterField::Institution, "College A".to_string());
    assert!(filter(&entities, "", &filters).is_empty());
}

#[test]
fn query_string_status_accepts_any_casing() {
    let (portal, _) = seeded_portal();
    let query = EntityQuery {
        status: Some("pending".to_string()),
        ..EntityQuery::default()
    };

    let pending = portal
        .search(EntityKind::Employer, &query)
        .expect("search employers");
    let ids: Vec<&str> = pending.iter().map(|record| record.id().as_str()).collect();
    assert_eq!(ids, vec!["E101", "E103"]);
}

#[test]
fn blank_query_string_values_are_ignored() {
    let query = EntityQuery {
        q: Some("".to_string()),
        district: Some("  ".to_string()),
        employer: Some("IHRD".to_string()),
        ..EntityQuery::default()
    };
    let filters = query.filters();
    assert_eq!(filters.len(), 1);
    assert_eq!(
        filters.get(&FilterField::Employer).map(String::as_str),
        Some("IHRD")
    );
}

#[test]
fn status_filter_accepts_the_label_each_dashboard_shows() {
    let (portal, _) = seeded_portal();
    let ids = |kind: EntityKind, status: &str| -> Vec<String> {
        let query = EntityQuery {
            status: Some(status.to_string()),
            ..EntityQuery::default()
        };
        portal
            .search(kind, &query)
            .expect("search")
            .iter()
            .map(|record| record.id().as_str().to_string())
            .collect()
    };

    assert_eq!(ids(EntityKind::Employer, "Accepted"), vec!["E102", "E104"]);
    assert_eq!(ids(EntityKind::Employer, "approved"), vec!["E102", "E104"]);
    assert_eq!(ids(EntityKind::Company, "Verified"), vec!["C102", "C103"]);
    assert_eq!(ids(EntityKind::Resignation, "verified"), vec!["RES102"]);
    assert!(ids(EntityKind::Employer, "Shortlisted").is_empty());
}

#[test]
fn structured_status_filter_matches_display_labels() {
    let entities = vec![
        entity("S101", school_payload("Govt. HSS Kalamassery"), EntityStatus::Pending),
        entity("S102", school_payload("St. Teresa's College"), EntityStatus::Approved),
    ];
    let mut filters = StructuredFilters::new();
    filters.insert(FilterField::Status, "accepted".to_string());

    let matched = filter(&entities, "", &filters);
    let ids: Vec<&str> = matched.iter().map(|record| record.id().as_str()).collect();
    assert_eq!(ids, vec!["S102"]);
}
