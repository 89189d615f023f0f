//! Verification workflow for registered entities.
//!
//! Each entity kind has a registry behind the [`EntityRegistry`] trait. An
//! [`ActionDispatcher`] applies user actions to one registry, checking them against the
//! kind's [`Lifecycle`], and reports every outcome through a [`NotificationEmitter`].
//! A [`Portal`] groups the dispatchers with the shared notification surface and activity
//! feed, and [`portal_router`] exposes it over HTTP.

pub mod activity;
pub mod clock;
pub mod dispatcher;
pub mod domain;
pub mod lifecycle;
pub mod notification;
pub mod portal;
pub mod registry;
pub mod report;
pub mod router;
pub mod search;
pub mod seed;

#[cfg(test)]
mod tests;

pub use activity::{ActivityEntry, ActivityLog};
pub use clock::{Clock, ManualClock, SystemClock};
pub use dispatcher::{ActionDispatcher, ActionInput, ActionOutcome, DispatchError};
pub use domain::{
    format_rupees, CompanyProfile, DisplayField, EmployerProfile, Entity, EntityId, EntityKind,
    EntityPatch, EntityPayload, EntityStatus, FieldValue, FilterField, GrievanceReport,
    ResignationNotice, SchoolProfile, VacancyPosting, WageSlip,
};
pub use lifecycle::{transition, Lifecycle, TransitionError, WorkflowAction};
pub use notification::{
    Notification, NotificationCenter, NotificationEmitter, NotificationHandle, NotificationKind,
};
pub use portal::{InMemoryPortal, Portal};
pub use registry::{EntityRegistry, InMemoryEntityRegistry, RegistryError};
pub use report::{
    export, summarize, EntityView, ExportError, ExportFormat, KindSummary, VerificationSummary,
};
pub use router::portal_router;
pub use search::{filter, EntityQuery, StructuredFilters};
pub use seed::{demo_records, seed_portal};
