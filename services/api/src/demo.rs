use crate::infra::{build_portal, parse_format, parse_kind};
use chrono::{Duration, Utc};
use clap::Args;
use karmachari::config::{AppConfig, WorkflowConfig};
use karmachari::error::AppError;
use karmachari::workflows::verification::{
    export, Clock, DispatchError, EntityId, EntityKind, EntityQuery, EntityView, ExportFormat,
    ManualClock, NotificationEmitter, SystemClock, VerificationSummary, WorkflowAction,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// Registry to export, e.g. employer or wage-slip (`all` for every registry)
    #[arg(long, default_value = "all")]
    pub(crate) kind: String,
    /// Output format: csv or json
    #[arg(long, default_value = "csv", value_parser = parse_format)]
    pub(crate) format: ExportFormat,
    /// Write to this file instead of stdout
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    /// Free-text search applied before export
    #[arg(long)]
    pub(crate) query: Option<String>,
    /// Exact district match
    #[arg(long)]
    pub(crate) district: Option<String>,
    /// Exact employer match
    #[arg(long)]
    pub(crate) employer: Option<String>,
    /// Exact institution match
    #[arg(long)]
    pub(crate) institution: Option<String>,
    /// Exact status match (case-insensitive)
    #[arg(long)]
    pub(crate) status: Option<String>,
}

impl ReportArgs {
    fn entity_query(&self) -> EntityQuery {
        EntityQuery {
            q: self.query.clone(),
            district: self.district.clone(),
            employer: self.employer.clone(),
            institution: self.institution.clone(),
            status: self.status.clone(),
        }
    }
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Reason recorded when the demo rejects a company registration
    #[arg(long, default_value = "Factory licence expired")]
    pub(crate) reason: String,
    /// Print the closing dashboard summary as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let portal = build_portal(&config.workflow, Arc::new(SystemClock))?;

    let kind = parse_kind(&args.kind).map_err(DispatchError::Validation)?;
    let records = match kind {
        Some(kind) => portal.dispatcher(kind)?.list()?,
        None => portal.snapshot()?,
    };
    let rows: Vec<EntityView> = args
        .entity_query()
        .apply(&records)
        .iter()
        .map(EntityView::from)
        .collect();
    let bytes = export(&rows, args.format)?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &bytes)?;
            println!(
                "Wrote {} rows as {} to {}",
                rows.len(),
                args.format,
                path.display()
            );
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { reason, json } = args;

    let clock = Arc::new(ManualClock::new(Utc::now()));
    let config = WorkflowConfig::default();
    let portal = build_portal(&config, clock.clone() as Arc<dyn Clock>)?;

    println!("Karmachari verification demo");
    render_summary(&portal.summary()?);

    let steps = [
        (EntityKind::Employer, "E101", WorkflowAction::Verify, None),
        (
            EntityKind::Company,
            "C101",
            WorkflowAction::Reject,
            Some(reason),
        ),
        (EntityKind::WageSlip, "W1001", WorkflowAction::ApproveWage, None),
        (EntityKind::Grievance, "G1001", WorkflowAction::Resolve, None),
        (EntityKind::Vacancy, "V103", WorkflowAction::MarkFilled, None),
        (EntityKind::Employer, "E102", WorkflowAction::Verify, None),
    ];

    println!("\nOfficer actions");
    for (kind, id, action, reason) in steps {
        clock.advance(Duration::seconds(1));
        let dispatcher = portal.dispatcher(kind)?;
        match dispatcher.dispatch(&EntityId::from(id), action, reason) {
            Ok(entity) => println!(
                "- {} {} {} -> {}",
                action,
                kind.label().to_lowercase(),
                entity.id(),
                entity.status_label()
            ),
            Err(err) => println!("- {} {} {} refused: {}", action, kind.label().to_lowercase(), id, err),
        }
        if let Some(notification) = portal.notifications().active() {
            println!("  notification ({:?}): {}", notification.kind, notification.message);
        }
    }

    clock.advance(Duration::milliseconds(
        i64::try_from(config.notification_ttl_ms).unwrap_or(i64::MAX),
    ));
    match portal.notifications().active() {
        Some(notification) => println!(
            "\nStill visible after {} ms: {}",
            config.notification_ttl_ms, notification.message
        ),
        None => println!("\nNo notification visible after {} ms", config.notification_ttl_ms),
    }

    println!("\nRecent activity");
    for entry in portal.activity().recent(10) {
        println!(
            "- #{} {} {} ({}): {}",
            entry.sequence,
            entry.action,
            entry.entity_id,
            entry.display_name,
            entry.status.display_label(entry.kind)
        );
    }

    let summary = portal.summary()?;
    if json {
        match serde_json::to_string_pretty(&summary) {
            Ok(payload) => println!("\nDashboard summary:\n{}", payload),
            Err(err) => println!("\nDashboard summary unavailable: {}", err),
        }
    } else {
        println!();
        render_summary(&summary);
    }

    Ok(())
}

fn render_summary(summary: &VerificationSummary) {
    println!("Dashboard summary");
    println!(
        "- {} registrations awaiting verification | {} verified",
        summary.awaiting_verification, summary.verified_registrations
    );
    println!(
        "- {} wage slips pending ({})",
        summary.pending_wage_slips, summary.pending_wage_amount_label
    );
    println!(
        "- {} open grievances | {} pending resignations | {} open vacancies",
        summary.open_grievances, summary.pending_resignations, summary.open_vacancies
    );
    for kind in &summary.kinds {
        println!(
            "  - {}: {} total, {} verified",
            kind.kind_label, kind.total, kind.verified
        );
    }
}
