//! Verification workflow core for the Karmachari portal.
//!
//! Registered employers, schools, companies, vacancies, wage slips, resignations and
//! grievances move through a small set of lifecycles. The [`workflows::verification`]
//! module owns the registries, the transition rules, the dispatcher that applies user
//! actions, and the read-side projections used by dashboards and exports.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
