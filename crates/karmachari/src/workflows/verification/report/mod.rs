//! Read-only projections of registry state: dashboard summaries, table views and exports.

mod export;
mod summary;
mod views;

pub use export::{export, ExportError, ExportFormat};
pub use summary::{summarize, KindSummary, VerificationSummary};
pub use views::EntityView;
