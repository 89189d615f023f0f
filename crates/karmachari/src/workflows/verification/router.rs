use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::dispatcher::{ActionInput, ActionOutcome, DispatchError};
use super::domain::{EntityId, EntityKind, EntityPayload};
use super::lifecycle::{TransitionError, WorkflowAction};
use super::notification::{NotificationEmitter, NotificationHandle};
use super::portal::Portal;
use super::registry::{EntityRegistry, RegistryError};
use super::report::{export, EntityView, ExportFormat};
use super::search::EntityQuery;

const DEFAULT_ACTIVITY_LIMIT: usize = 20;

impl DispatchError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DispatchError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DispatchError::NotFound { .. } => StatusCode::NOT_FOUND,
            DispatchError::Transition(_) => StatusCode::CONFLICT,
            DispatchError::Registry(err) => match err {
                RegistryError::NotFound { .. } => StatusCode::NOT_FOUND,
                RegistryError::Conflict { .. } | RegistryError::VersionConflict { .. } => {
                    StatusCode::CONFLICT
                }
                RegistryError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                RegistryError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

/// Router exposing registries, workflow actions and read-side projections.
pub fn portal_router<R, N>(portal: Arc<Portal<R, N>>) -> Router
where
    R: EntityRegistry + 'static,
    N: NotificationEmitter + 'static,
{
    Router::new()
        .route(
            "/api/v1/entities/:kind",
            get(list_handler::<R, N>).post(register_handler::<R, N>),
        )
        .route(
            "/api/v1/entities/:kind/:id",
            get(detail_handler::<R, N>).put(resubmit_handler::<R, N>),
        )
        .route(
            "/api/v1/entities/:kind/:id/:action",
            post(action_handler::<R, N>),
        )
        .route("/api/v1/exports/:kind", get(export_handler::<R, N>))
        .route(
            "/api/v1/notifications/active",
            get(active_notification_handler::<R, N>),
        )
        .route(
            "/api/v1/notifications/:handle",
            delete(dismiss_notification_handler::<R, N>),
        )
        .route("/api/v1/activity", get(activity_handler::<R, N>))
        .route("/api/v1/summary", get(summary_handler::<R, N>))
        .with_state(portal)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let payload = json!({ "error": message.into() });
    (status, axum::Json(payload)).into_response()
}

fn dispatch_error_response(err: &DispatchError) -> Response {
    let mut payload = json!({ "error": err.to_string() });
    if let DispatchError::Transition(TransitionError::InvalidTransition { from, .. }) = err {
        payload["status"] = json!(from.label());
    }
    (err.status_code(), axum::Json(payload)).into_response()
}

fn parse_kind(raw: &str) -> Result<EntityKind, Response> {
    EntityKind::from_slug(raw)
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, format!("unknown entity kind {raw}")))
}

fn parse_action(raw: &str) -> Option<WorkflowAction> {
    match raw.trim().to_ascii_lowercase().replace('_', "-").as_str() {
        "verify" | "approve" | "accept" => Some(WorkflowAction::Verify),
        "reject" => Some(WorkflowAction::Reject),
        "resolve" => Some(WorkflowAction::Resolve),
        "approve-wage" => Some(WorkflowAction::ApproveWage),
        "reopen" => Some(WorkflowAction::Reopen),
        "fill" | "mark-filled" => Some(WorkflowAction::MarkFilled),
        _ => None,
    }
}

pub(crate) async fn list_handler<R, N>(
    State(portal): State<Arc<Portal<R, N>>>,
    Path(kind): Path<String>,
    Query(query): Query<EntityQuery>,
) -> Response
where
    R: EntityRegistry + 'static,
    N: NotificationEmitter + 'static,
{
    let kind = match parse_kind(&kind) {
        Ok(kind) => kind,
        Err(response) => return response,
    };
    match portal.search(kind, &query) {
        Ok(records) => {
            let views: Vec<EntityView> = records.iter().map(EntityView::from).collect();
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(err) => dispatch_error_response(&err),
    }
}

/// Decode a payload sent with or without its `kind` tag; the path decides the kind.
fn payload_from_body(kind: EntityKind, mut body: Value) -> Result<EntityPayload, Response> {
    let Some(object) = body.as_object_mut() else {
        return Err(error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "registration payload must be a JSON object",
        ));
    };
    let tag = object
        .get("kind")
        .and_then(Value::as_str)
        .map(str::to_string);
    if let Some(tag) = tag {
        if EntityKind::from_slug(&tag) != Some(kind) {
            return Err(error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("payload kind {tag} does not match {}", kind.slug()),
            ));
        }
    }
    object.insert("kind".to_string(), json!(kind.slug()));

    serde_json::from_value(body)
        .map_err(|err| error_response(StatusCode::UNPROCESSABLE_ENTITY, err.to_string()))
}

/// Body of a successful action: the updated record and the notification it raised, if that
/// notification is still the one on screen.
fn action_response<N: NotificationEmitter>(notifications: &N, outcome: ActionOutcome) -> Response {
    let notification = notifications
        .active()
        .filter(|notification| notification.handle == outcome.notification);
    let payload = json!({
        "entity": EntityView::from(outcome.entity),
        "notification": notification,
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn register_handler<R, N>(
    State(portal): State<Arc<Portal<R, N>>>,
    Path(kind): Path<String>,
    axum::Json(body): axum::Json<Value>,
) -> Response
where
    R: EntityRegistry + 'static,
    N: NotificationEmitter + 'static,
{
    let kind = match parse_kind(&kind) {
        Ok(kind) => kind,
        Err(response) => return response,
    };
    let payload = match payload_from_body(kind, body) {
        Ok(payload) => payload,
        Err(response) => return response,
    };
    match portal.register(payload) {
        Ok(entity) => (StatusCode::CREATED, axum::Json(EntityView::from(entity))).into_response(),
        Err(err) => dispatch_error_response(&err),
    }
}

pub(crate) async fn detail_handler<R, N>(
    State(portal): State<Arc<Portal<R, N>>>,
    Path((kind, id)): Path<(String, String)>,
) -> Response
where
    R: EntityRegistry + 'static,
    N: NotificationEmitter + 'static,
{
    let kind = match parse_kind(&kind) {
        Ok(kind) => kind,
        Err(response) => return response,
    };
    let result = portal
        .dispatcher(kind)
        .and_then(|dispatcher| dispatcher.get(&EntityId(id)));
    match result {
        Ok(entity) => (StatusCode::OK, axum::Json(EntityView::from(entity))).into_response(),
        Err(err) => dispatch_error_response(&err),
    }
}

/// Corrected details for a rejected record; it returns to its initial status.
pub(crate) async fn resubmit_handler<R, N>(
    State(portal): State<Arc<Portal<R, N>>>,
    Path((kind, id)): Path<(String, String)>,
    axum::Json(body): axum::Json<Value>,
) -> Response
where
    R: EntityRegistry + 'static,
    N: NotificationEmitter + 'static,
{
    let kind = match parse_kind(&kind) {
        Ok(kind) => kind,
        Err(response) => return response,
    };
    let payload = match payload_from_body(kind, body) {
        Ok(payload) => payload,
        Err(response) => return response,
    };
    let result = portal.dispatcher(kind).and_then(|dispatcher| {
        dispatcher.perform(
            &EntityId(id),
            WorkflowAction::Resubmit,
            ActionInput::payload(payload),
        )
    });
    match result {
        Ok(outcome) => action_response(portal.notifications().as_ref(), outcome),
        Err(err) => dispatch_error_response(&err),
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ActionRequest {
    #[serde(default)]
    pub(crate) reason: Option<String>,
}

/// Runs a workflow action. The body is optional and only read for a rejection reason.
pub(crate) async fn action_handler<R, N>(
    State(portal): State<Arc<Portal<R, N>>>,
    Path((kind, id, action)): Path<(String, String, String)>,
    body: Bytes,
) -> Response
where
    R: EntityRegistry + 'static,
    N: NotificationEmitter + 'static,
{
    let kind = match parse_kind(&kind) {
        Ok(kind) => kind,
        Err(response) => return response,
    };
    let Some(action) = parse_action(&action) else {
        return error_response(StatusCode::NOT_FOUND, format!("unknown action {action}"));
    };
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        ActionRequest::default()
    } else {
        match serde_json::from_slice::<ActionRequest>(&body) {
            Ok(request) => request,
            Err(err) => return error_response(StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
        }
    };

    let dispatcher = match portal.dispatcher(kind) {
        Ok(dispatcher) => dispatcher,
        Err(err) => return dispatch_error_response(&err),
    };
    match dispatcher.perform(&EntityId(id), action, ActionInput::reason(request.reason)) {
        Ok(outcome) => action_response(portal.notifications().as_ref(), outcome),
        Err(err) => dispatch_error_response(&err),
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ExportQuery {
    #[serde(default)]
    pub(crate) format: Option<String>,
}

/// `kind` may be `all` to export every registry.
pub(crate) async fn export_handler<R, N>(
    State(portal): State<Arc<Portal<R, N>>>,
    Path(kind): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Response
where
    R: EntityRegistry + 'static,
    N: NotificationEmitter + 'static,
{
    let kind = if kind.eq_ignore_ascii_case("all") {
        None
    } else {
        match parse_kind(&kind) {
            Ok(kind) => Some(kind),
            Err(response) => return response,
        }
    };
    let raw_format = query.format.as_deref().unwrap_or("csv");
    let Some(format) = ExportFormat::parse(raw_format) else {
        return error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("unsupported export format {raw_format}"),
        );
    };

    let views = match portal.views(kind) {
        Ok(views) => views,
        Err(err) => return dispatch_error_response(&err),
    };
    match export(&views, format) {
        Ok(bytes) => {
            let stem = kind.map(EntityKind::slug).unwrap_or("all");
            let disposition = format!("attachment; filename=\"{stem}.{}\"", format.extension());
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, format.content_type().to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                bytes,
            )
                .into_response()
        }
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

pub(crate) async fn active_notification_handler<R, N>(
    State(portal): State<Arc<Portal<R, N>>>,
) -> Response
where
    R: EntityRegistry + 'static,
    N: NotificationEmitter + 'static,
{
    match portal.notifications().active() {
        Some(notification) => (StatusCode::OK, axum::Json(notification)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

pub(crate) async fn dismiss_notification_handler<R, N>(
    State(portal): State<Arc<Portal<R, N>>>,
    Path(handle): Path<u64>,
) -> Response
where
    R: EntityRegistry + 'static,
    N: NotificationEmitter + 'static,
{
    if portal.notifications().dismiss(NotificationHandle(handle)) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        error_response(
            StatusCode::NOT_FOUND,
            format!("notification {handle} is not active"),
        )
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ActivityQuery {
    #[serde(default)]
    pub(crate) limit: Option<usize>,
}

pub(crate) async fn activity_handler<R, N>(
    State(portal): State<Arc<Portal<R, N>>>,
    Query(query): Query<ActivityQuery>,
) -> Response
where
    R: EntityRegistry + 'static,
    N: NotificationEmitter + 'static,
{
    let limit = query.limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT);
    let entries = portal.activity().recent(limit);
    (StatusCode::OK, axum::Json(entries)).into_response()
}

pub(crate) async fn summary_handler<R, N>(State(portal): State<Arc<Portal<R, N>>>) -> Response
where
    R: EntityRegistry + 'static,
    N: NotificationEmitter + 'static,
{
    match portal.summary() {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(err) => dispatch_error_response(&err),
    }
}
