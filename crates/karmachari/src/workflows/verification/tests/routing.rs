use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use std::sync::Arc;

use super::common::*;
use crate::workflows::verification::activity::ActivityLog;
use crate::workflows::verification::clock::Clock;
use crate::workflows::verification::domain::{EntityKind, EntityStatus};
use crate::workflows::verification::notification::{
    Notification, NotificationCenter, NotificationEmitter, NotificationHandle, NotificationKind,
};
use crate::workflows::verification::portal::Portal;
use crate::workflows::verification::portal_router;
use crate::workflows::verification::registry::InMemoryEntityRegistry;

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("json")))
        .expect("request")
}

fn put_json(uri: &str, body: Value) -> Request<Body> {
    Request::put(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("json")))
        .expect("request")
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request")
}

#[tokio::test]
async fn verify_route_accepts_pending_employer() {
    let (portal, _) = seeded_portal();
    let router = portal_router(portal.clone());

    let response = router
        .oneshot(
            Request::post("/api/v1/entities/employer/E101/verify")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["entity"]["status_label"], "Accepted");
    assert_eq!(payload["entity"]["verified"], true);
    assert_eq!(payload["notification"]["kind"], "success");
    assert!(payload["notification"]["message"]
        .as_str()
        .unwrap_or_default()
        .contains("IHRD"));
}

#[tokio::test]
async fn reject_route_reads_reason_from_body() {
    let (portal, _) = seeded_portal();
    let router = portal_router(portal.clone());

    let response = router
        .oneshot(post_json(
            "/api/v1/entities/schools/S101/reject",
            json!({ "reason": "Affiliation certificate missing" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["entity"]["status"], "rejected");
    assert_eq!(
        payload["entity"]["rejection_reason"],
        "Affiliation certificate missing"
    );
}

#[tokio::test]
async fn repeated_decision_is_a_conflict() {
    let (portal, _) = seeded_portal();
    let router = portal_router(portal);

    let response = router
        .oneshot(
            Request::post("/api/v1/entities/employer/E102/verify")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], "Approved");
}

#[tokio::test]
async fn unknown_entity_and_kind_return_not_found() {
    let (portal, _) = seeded_portal();

    let missing = portal_router(portal.clone())
        .oneshot(
            Request::post("/api/v1/entities/employer/E999/verify")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("route executes");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let unknown_kind = portal_router(portal)
        .oneshot(get("/api/v1/entities/students"))
        .await
        .expect("route executes");
    assert_eq!(unknown_kind.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_route_applies_query_and_filters() {
    let (portal, _) = seeded_portal();
    let router = portal_router(portal);

    let response = router
        .oneshot(get("/api/v1/entities/grievances?q=asha&district=Ernakulam"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let rows = payload.as_array().expect("array");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], "G1001");
}

#[tokio::test]
async fn register_route_creates_pending_records() {
    let (portal, _) = seeded_portal();
    let router = portal_router(portal.clone());

    let response = router
        .oneshot(post_json(
            "/api/v1/entities/employer",
            json!({
                "business_name": "Malabar Motors",
                "owner": "Mr. Faisal K",
                "district": "Kozhikode",
                "document_url": "https://example.com/malabar.pdf"
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["id"], "E105");
    assert_eq!(payload["status"], "pending");
    assert_eq!(payload["verified"], false);
}

#[tokio::test]
async fn register_route_rejects_mismatched_kind() {
    let (portal, _) = seeded_portal();
    let router = portal_router(portal);

    let response = router
        .oneshot(post_json(
            "/api/v1/entities/employer",
            json!({ "kind": "grievance", "raised_by": "Asha P", "issue": "Late wage" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn export_route_serves_csv_attachment() {
    let (portal, _) = seeded_portal();
    let router = portal_router(portal);

    let response = router
        .oneshot(get("/api/v1/exports/wage-slip?format=csv"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok()),
        Some("attachment; filename=\"wage-slip.csv\"")
    );
    let text = read_text_body(response).await;
    assert!(text.starts_with("Kind,ID,Student"));
    assert!(text.contains("W1001"));
    assert!(text.contains("\"₹2,500\""));
}

#[tokio::test]
async fn export_route_rejects_unknown_format() {
    let (portal, _) = seeded_portal();
    let router = portal_router(portal);

    let response = router
        .oneshot(get("/api/v1/exports/all?format=pdf"))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn summary_route_reports_dashboard_counts() {
    let (portal, _) = seeded_portal();
    let router = portal_router(portal);

    let response = router
        .oneshot(get("/api/v1/summary"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["open_grievances"], 2);
    assert_eq!(payload["pending_wage_slips"], 2);
    assert_eq!(payload["pending_wage_amount_label"], "₹6,000");
    assert_eq!(payload["pending_resignations"], 1);
}

#[tokio::test]
async fn notification_can_be_read_and_dismissed() {
    let (portal, _) = seeded_portal();
    let employers = portal
        .dispatcher(crate::workflows::verification::EntityKind::Employer)
        .expect("employers");
    let _ = employers.verify(&crate::workflows::verification::EntityId::from("E999"));

    let response = crate::workflows::verification::router::active_notification_handler::<
        InMemoryEntityRegistry,
        NotificationCenter,
    >(State(portal.clone()))
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["kind"], "error");
    let handle = payload["handle"].as_u64().expect("handle");

    let dismissed = crate::workflows::verification::router::dismiss_notification_handler::<
        InMemoryEntityRegistry,
        NotificationCenter,
    >(State(portal.clone()), Path(handle))
    .await;
    assert_eq!(dismissed.status(), StatusCode::NO_CONTENT);

    let empty = portal_router(portal)
        .oneshot(get("/api/v1/notifications/active"))
        .await
        .expect("route executes");
    assert_eq!(empty.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn activity_route_lists_newest_first() {
    let (portal, _) = seeded_portal();
    let router = portal_router(portal.clone());
    let employers = portal
        .dispatcher(crate::workflows::verification::EntityKind::Employer)
        .expect("employers");
    employers
        .verify(&crate::workflows::verification::EntityId::from("E101"))
        .expect("verify");
    employers
        .verify(&crate::workflows::verification::EntityId::from("E103"))
        .expect("verify");

    let response = router
        .oneshot(get("/api/v1/activity?limit=1"))
        .await
        .expect("route executes");
    let payload = read_json_body(response).await;
    let entries = payload.as_array().expect("array");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["entity_id"], "E103");
}

#[tokio::test]
async fn put_resubmits_corrected_details_for_a_rejected_school() {
    let (portal, _) = seeded_portal();
    portal_router(portal.clone())
        .oneshot(post_json(
            "/api/v1/entities/schools/S101/reject",
            json!({ "reason": "Affiliation certificate missing" }),
        ))
        .await
        .expect("route executes");

    let response = portal_router(portal.clone())
        .oneshot(put_json(
            "/api/v1/entities/schools/S101",
            json!({
                "name": "Govt. HSS Kalamassery",
                "principal": "Dr. Mini Joseph",
                "district": "Ernakulam",
                "document_url": "https://example.com/affiliation-renewed.pdf"
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["entity"]["status"], "pending");
    assert!(payload["entity"]["rejection_reason"].is_null());
    assert_eq!(
        payload["entity"]["payload"]["document_url"],
        "https://example.com/affiliation-renewed.pdf"
    );
    assert_eq!(payload["notification"]["kind"], "success");
}

#[tokio::test]
async fn put_on_a_pending_record_is_a_conflict() {
    let (portal, _) = seeded_portal();

    let response = portal_router(portal)
        .oneshot(put_json(
            "/api/v1/entities/employer/E101",
            json!({
                "business_name": "IHRD",
                "owner": "Mr. Suresh Kumar",
                "district": "Ernakulam",
                "document_url": "https://example.com/ihrd.pdf"
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], "Pending");
}

/// Emits a second message right after each one, as a concurrent request would.
struct InterleavingNotifier {
    inner: NotificationCenter,
}

impl NotificationEmitter for InterleavingNotifier {
    fn emit(&self, message: String, kind: NotificationKind) -> NotificationHandle {
        let handle = self.inner.emit(message, kind);
        self.inner
            .emit("Employer E999 not found".to_string(), NotificationKind::Error);
        handle
    }

    fn active(&self) -> Option<Notification> {
        self.inner.active()
    }

    fn dismiss(&self, handle: NotificationHandle) -> bool {
        self.inner.dismiss(handle)
    }
}

#[tokio::test]
async fn action_response_omits_a_notification_raised_by_another_request() {
    let clock = manual_clock() as Arc<dyn Clock>;
    let notifier = Arc::new(InterleavingNotifier {
        inner: NotificationCenter::with_default_ttl(Arc::clone(&clock)),
    });
    let portal: Portal<InMemoryEntityRegistry, InterleavingNotifier> =
        Portal::new(notifier, Arc::new(ActivityLog::default()), Arc::clone(&clock))
        .with_registry(Arc::new(InMemoryEntityRegistry::with_clock(
            EntityKind::Employer,
            Arc::clone(&clock),
        )));
    portal
        .insert(entity(
            "E101",
            employer_payload("IHRD", "Ernakulam"),
            EntityStatus::Pending,
        ))
        .expect("seed");

    let response = portal_router(Arc::new(portal))
        .oneshot(
            Request::post("/api/v1/entities/employer/E101/verify")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["entity"]["status"], "approved");
    assert!(payload["notification"].is_null());
}
