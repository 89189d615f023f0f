use karmachari::config::WorkflowConfig;
use karmachari::error::AppError;
use karmachari::workflows::verification::{
    seed_portal, Clock, EntityKind, ExportFormat, InMemoryPortal,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// In-memory portal, loaded with demo records when `config` asks for them.
pub(crate) fn build_portal(
    config: &WorkflowConfig,
    clock: Arc<dyn Clock>,
) -> Result<InMemoryPortal, AppError> {
    let portal = InMemoryPortal::in_memory(config, clock);
    if config.seed_demo_data {
        seed_portal(&portal)?;
    } else {
        info!("starting with empty registries");
    }
    Ok(portal)
}

pub(crate) fn parse_format(raw: &str) -> Result<ExportFormat, String> {
    ExportFormat::parse(raw).ok_or_else(|| format!("unsupported format '{raw}' (expected csv or json)"))
}

/// `all` selects every registry.
pub(crate) fn parse_kind(raw: &str) -> Result<Option<EntityKind>, String> {
    if raw.trim().eq_ignore_ascii_case("all") {
        return Ok(None);
    }
    EntityKind::from_slug(raw)
        .map(Some)
        .ok_or_else(|| format!("unknown entity kind '{raw}'"))
}
