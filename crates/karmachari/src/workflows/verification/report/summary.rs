use std::collections::BTreeMap;

use serde::Serialize;

use super::super::domain::{format_rupees, Entity, EntityKind, EntityPayload, EntityStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KindSummary {
    pub kind: EntityKind,
    pub kind_label: &'static str,
    pub total: usize,
    pub verified: usize,
    pub by_status: BTreeMap<EntityStatus, usize>,
}

/// Dashboard stat cards computed from a snapshot of every registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationSummary {
    pub kinds: Vec<KindSummary>,
    /// Employers, schools and companies still waiting for a decision.
    pub awaiting_verification: usize,
    /// Employers, schools and companies that have been accepted.
    pub verified_registrations: usize,
    pub pending_wage_slips: usize,
    pub pending_wage_amount: u64,
    pub pending_wage_amount_label: String,
    pub open_grievances: usize,
    pub pending_resignations: usize,
    pub open_vacancies: usize,
}

impl VerificationSummary {
    pub fn kind(&self, kind: EntityKind) -> Option<&KindSummary> {
        self.kinds.iter().find(|entry| entry.kind == kind)
    }
}

pub fn summarize(entities: &[Entity]) -> VerificationSummary {
    let mut kinds: Vec<KindSummary> = EntityKind::ordered()
        .into_iter()
        .map(|kind| KindSummary {
            kind,
            kind_label: kind.label(),
            total: 0,
            verified: 0,
            by_status: kind
                .lifecycle()
                .states()
                .iter()
                .map(|status| (*status, 0))
                .collect(),
        })
        .collect();

    let mut pending_wage_amount = 0u64;
    for entity in entities {
        if let Some(entry) = kinds.iter_mut().find(|entry| entry.kind == entity.kind()) {
            entry.total += 1;
            if entity.is_verified() {
                entry.verified += 1;
            }
            *entry.by_status.entry(entity.status()).or_insert(0) += 1;
        }

        if let (EntityPayload::WageSlip(slip), EntityStatus::Pending) =
            (entity.payload(), entity.status())
        {
            pending_wage_amount += slip.monthly_amount;
        }
    }

    let count = |kinds: &[KindSummary], kind: EntityKind, status: EntityStatus| {
        kinds
            .iter()
            .find(|entry| entry.kind == kind)
            .and_then(|entry| entry.by_status.get(&status).copied())
            .unwrap_or(0)
    };
    let registrations = [EntityKind::Employer, EntityKind::School, EntityKind::Company];

    let awaiting_verification = registrations
        .iter()
        .map(|kind| count(&kinds, *kind, EntityStatus::Pending))
        .sum();
    let verified_registrations = registrations
        .iter()
        .map(|kind| count(&kinds, *kind, EntityStatus::Approved))
        .sum();

    VerificationSummary {
        awaiting_verification,
        verified_registrations,
        pending_wage_slips: count(&kinds, EntityKind::WageSlip, EntityStatus::Pending),
        pending_wage_amount,
        pending_wage_amount_label: format_rupees(pending_wage_amount),
        open_grievances: count(&kinds, EntityKind::Grievance, EntityStatus::Open),
        pending_resignations: count(&kinds, EntityKind::Resignation, EntityStatus::Pending),
        open_vacancies: count(&kinds, EntityKind::Vacancy, EntityStatus::Approved),
        kinds,
    }
}
