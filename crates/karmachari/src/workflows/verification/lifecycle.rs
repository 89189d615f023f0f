use std::fmt;

use serde::{Deserialize, Serialize};

use super::domain::{Entity, EntityId, EntityKind, EntityStatus};

/// Status graph followed by a kind of entity.
///
/// Terminal states are final unless the explicit `Reopen` action is applied, which
/// returns the record to its initial state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    /// `Pending -> Approved | Rejected`.
    Verification,
    /// Verification plus `Approved -> Filled`.
    Vacancy,
    /// `Open -> Resolved`.
    Grievance,
}

impl Lifecycle {
    pub const fn initial(self) -> EntityStatus {
        match self {
            Lifecycle::Verification | Lifecycle::Vacancy => EntityStatus::Pending,
            Lifecycle::Grievance => EntityStatus::Open,
        }
    }

    pub const fn states(self) -> &'static [EntityStatus] {
        match self {
            Lifecycle::Verification => &[
                EntityStatus::Pending,
                EntityStatus::Approved,
                EntityStatus::Rejected,
            ],
            Lifecycle::Vacancy => &[
                EntityStatus::Pending,
                EntityStatus::Approved,
                EntityStatus::Rejected,
                EntityStatus::Filled,
            ],
            Lifecycle::Grievance => &[EntityStatus::Open, EntityStatus::Resolved],
        }
    }

    pub fn contains(self, status: EntityStatus) -> bool {
        self.states().contains(&status)
    }
}

/// User-initiated command against a single entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowAction {
    Verify,
    Reject,
    Resolve,
    ApproveWage,
    Reopen,
    MarkFilled,
    /// Corrected details for a rejected registration.
    Resubmit,
}

impl WorkflowAction {
    pub const fn label(self) -> &'static str {
        match self {
            WorkflowAction::Verify => "verify",
            WorkflowAction::Reject => "reject",
            WorkflowAction::Resolve => "resolve",
            WorkflowAction::ApproveWage => "approve_wage",
            WorkflowAction::Reopen => "reopen",
            WorkflowAction::MarkFilled => "mark_filled",
            WorkflowAction::Resubmit => "resubmit",
        }
    }

    /// Outcome phrase used in notifications, e.g. "verified and accepted".
    pub fn outcome_phrase(self, kind: EntityKind) -> String {
        match self {
            WorkflowAction::Verify => match kind {
                EntityKind::Employer | EntityKind::School => "verified and accepted".to_string(),
                EntityKind::WageSlip | EntityKind::Vacancy => "approved".to_string(),
                _ => "verified".to_string(),
            },
            WorkflowAction::ApproveWage => "approved".to_string(),
            WorkflowAction::Reject => "rejected".to_string(),
            WorkflowAction::Resolve => "marked as resolved".to_string(),
            WorkflowAction::Reopen => format!(
                "reopened as {}",
                kind.lifecycle().initial().label().to_lowercase()
            ),
            WorkflowAction::MarkFilled => "marked as filled".to_string(),
            WorkflowAction::Resubmit => "resubmitted for verification".to_string(),
        }
    }

    fn applies_to(self, kind: EntityKind) -> bool {
        let lifecycle = kind.lifecycle();
        match self {
            WorkflowAction::Verify | WorkflowAction::Reject | WorkflowAction::Resubmit => {
                matches!(lifecycle, Lifecycle::Verification | Lifecycle::Vacancy)
            }
            WorkflowAction::ApproveWage => kind == EntityKind::WageSlip,
            WorkflowAction::Resolve => lifecycle == Lifecycle::Grievance,
            WorkflowAction::MarkFilled => lifecycle == Lifecycle::Vacancy,
            WorkflowAction::Reopen => true,
        }
    }
}

impl fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("{action} does not apply to {kind} records")]
    UnsupportedAction {
        kind: EntityKind,
        action: WorkflowAction,
    },
    #[error("cannot {action} {id}: status is {from}")]
    InvalidTransition {
        id: EntityId,
        from: EntityStatus,
        action: WorkflowAction,
    },
}

/// Resolve the status `action` leads to from the entity's current status.
pub fn transition(entity: &Entity, action: WorkflowAction) -> Result<EntityStatus, TransitionError> {
    let kind = entity.kind();
    if !action.applies_to(kind) {
        return Err(TransitionError::UnsupportedAction { kind, action });
    }

    let from = entity.status();
    let next = match (action, from) {
        (WorkflowAction::Verify | WorkflowAction::ApproveWage, EntityStatus::Pending) => {
            Some(EntityStatus::Approved)
        }
        (WorkflowAction::Reject, EntityStatus::Pending) => Some(EntityStatus::Rejected),
        (WorkflowAction::Resolve, EntityStatus::Open) => Some(EntityStatus::Resolved),
        (WorkflowAction::MarkFilled, EntityStatus::Approved) => Some(EntityStatus::Filled),
        (
            WorkflowAction::Reopen,
            EntityStatus::Approved | EntityStatus::Rejected | EntityStatus::Resolved,
        ) => Some(kind.lifecycle().initial()),
        (WorkflowAction::Resubmit, EntityStatus::Rejected) => Some(kind.lifecycle().initial()),
        _ => None,
    };

    next.ok_or_else(|| TransitionError::InvalidTransition {
        id: entity.id().clone(),
        from,
        action,
    })
}
