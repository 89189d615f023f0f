use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::lifecycle::Lifecycle;
use super::registry::RegistryError;

/// Identifier wrapper for registered entities.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Every kind of record an official can review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    Employer,
    School,
    Company,
    Vacancy,
    WageSlip,
    Resignation,
    Grievance,
}

impl EntityKind {
    pub const fn ordered() -> [Self; 7] {
        [
            Self::Employer,
            Self::School,
            Self::Company,
            Self::Vacancy,
            Self::WageSlip,
            Self::Resignation,
            Self::Grievance,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Employer => "Employer",
            Self::School => "School",
            Self::Company => "Company",
            Self::Vacancy => "Vacancy",
            Self::WageSlip => "Wage slip",
            Self::Resignation => "Resignation",
            Self::Grievance => "Grievance",
        }
    }

    /// Path segment used by the HTTP router and the CLI.
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Employer => "employer",
            Self::School => "school",
            Self::Company => "company",
            Self::Vacancy => "vacancy",
            Self::WageSlip => "wage-slip",
            Self::Resignation => "resignation",
            Self::Grievance => "grievance",
        }
    }

    pub fn from_slug(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase().replace('_', "-");
        let singular = match normalized.strip_suffix("ies") {
            Some(stem) => format!("{stem}y"),
            None => normalized
                .strip_suffix('s')
                .unwrap_or(&normalized)
                .to_string(),
        };
        Self::ordered()
            .into_iter()
            .find(|kind| kind.slug() == normalized || kind.slug() == singular)
    }

    /// Prefix for identifiers assigned by a registry.
    pub const fn id_prefix(self) -> &'static str {
        match self {
            Self::Employer => "E",
            Self::School => "S",
            Self::Company => "C",
            Self::Vacancy => "V",
            Self::WageSlip => "W",
            Self::Resignation => "RES",
            Self::Grievance => "G",
        }
    }

    pub const fn lifecycle(self) -> Lifecycle {
        match self {
            Self::Grievance => Lifecycle::Grievance,
            Self::Vacancy => Lifecycle::Vacancy,
            Self::Employer
            | Self::School
            | Self::Company
            | Self::WageSlip
            | Self::Resignation => Lifecycle::Verification,
        }
    }

    /// Label shown for an approved record of this kind.
    pub const fn approved_label(self) -> &'static str {
        match self {
            Self::Employer | Self::School => "Accepted",
            Self::Company | Self::Resignation => "Verified",
            Self::Vacancy | Self::WageSlip | Self::Grievance => "Approved",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Canonical status vocabulary shared by every lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityStatus {
    Pending,
    Approved,
    Rejected,
    Open,
    Resolved,
    Filled,
}

impl EntityStatus {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::Pending,
            Self::Approved,
            Self::Rejected,
            Self::Open,
            Self::Resolved,
            Self::Filled,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::Open => "Open",
            Self::Resolved => "Resolved",
            Self::Filled => "Filled",
        }
    }

    /// Only an approval carries the verified flag; a filled vacancy is tracked by status.
    pub const fn is_verified(self) -> bool {
        matches!(self, Self::Approved)
    }

    pub fn display_label(self, kind: EntityKind) -> &'static str {
        match self {
            Self::Approved => kind.approved_label(),
            other => other.label(),
        }
    }

    /// Case-insensitive match on the canonical label or any kind's approved label
    /// ("Accepted", "Verified").
    pub fn parse(raw: &str) -> Option<Self> {
        let needle = raw.trim();
        let approved_alias = EntityKind::ordered()
            .into_iter()
            .any(|kind| kind.approved_label().eq_ignore_ascii_case(needle));
        if approved_alias {
            return Some(Self::Approved);
        }
        Self::ordered()
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(needle))
    }
}

impl fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Typed cell value; rendering is chosen by semantic type, never by column name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Status(String),
    DocumentLink(String),
    Currency(u64),
    Count(u32),
    Date(NaiveDate),
    List(Vec<String>),
}

impl FieldValue {
    pub fn render(&self) -> String {
        match self {
            FieldValue::Text(value) | FieldValue::Status(value) | FieldValue::DocumentLink(value) => {
                value.clone()
            }
            FieldValue::Currency(amount) => format_rupees(*amount),
            FieldValue::Count(count) => count.to_string(),
            FieldValue::Date(date) => date.format("%Y-%m-%d").to_string(),
            FieldValue::List(items) => items.join("; "),
        }
    }

    fn searchable(&self) -> bool {
        !matches!(self, FieldValue::DocumentLink(_))
    }
}

/// Format a rupee amount with thousands separators, e.g. `₹12,500`.
pub fn format_rupees(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("₹{grouped}")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayField {
    pub name: &'static str,
    pub value: FieldValue,
}

impl DisplayField {
    fn new(name: &'static str, value: FieldValue) -> Self {
        Self { name, value }
    }

    fn text(name: &'static str, value: &str) -> Self {
        Self::new(name, FieldValue::Text(value.to_string()))
    }
}

/// Attributes that structured filters can match exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterField {
    District,
    Employer,
    Institution,
    Status,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployerProfile {
    pub business_name: String,
    pub owner: String,
    pub district: String,
    #[serde(default)]
    pub category: Option<String>,
    pub document_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolProfile {
    pub name: String,
    pub principal: String,
    pub district: String,
    pub document_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: String,
    pub owner: String,
    pub district: String,
    pub workers: u32,
    pub document_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacancyPosting {
    pub position: String,
    pub employer: String,
    pub institution: String,
    pub district: String,
    pub openings: u32,
    #[serde(default)]
    pub valid_till: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WageSlip {
    pub student: String,
    pub employer_id: String,
    pub month: String,
    pub monthly_amount: u64,
    pub document_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResignationNotice {
    pub student_id: String,
    pub student_name: String,
    pub employer: String,
    pub submitted_on: NaiveDate,
    pub reason: String,
    #[serde(default)]
    pub attachments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrievanceReport {
    pub raised_by: String,
    pub issue: String,
    #[serde(default)]
    pub concerning: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
}

/// Kind-specific attributes. The workflow never looks inside beyond the accessors below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum EntityPayload {
    Employer(EmployerProfile),
    School(SchoolProfile),
    Company(CompanyProfile),
    Vacancy(VacancyPosting),
    WageSlip(WageSlip),
    Resignation(ResignationNotice),
    Grievance(GrievanceReport),
}

impl EntityPayload {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityPayload::Employer(_) => EntityKind::Employer,
            EntityPayload::School(_) => EntityKind::School,
            EntityPayload::Company(_) => EntityKind::Company,
            EntityPayload::Vacancy(_) => EntityKind::Vacancy,
            EntityPayload::WageSlip(_) => EntityKind::WageSlip,
            EntityPayload::Resignation(_) => EntityKind::Resignation,
            EntityPayload::Grievance(_) => EntityKind::Grievance,
        }
    }

    /// Human readable name used in notifications and the activity feed.
    pub fn display_name(&self) -> String {
        match self {
            EntityPayload::Employer(employer) => employer.business_name.clone(),
            EntityPayload::School(school) => school.name.clone(),
            EntityPayload::Company(company) => company.name.clone(),
            EntityPayload::Vacancy(vacancy) => {
                format!("{} at {}", vacancy.position, vacancy.employer)
            }
            EntityPayload::WageSlip(slip) => format!("{} ({})", slip.student, slip.month),
            EntityPayload::Resignation(notice) => notice.student_name.clone(),
            EntityPayload::Grievance(grievance) => grievance.raised_by.clone(),
        }
    }

    pub fn fields(&self) -> Vec<DisplayField> {
        match self {
            EntityPayload::Employer(employer) => {
                let mut fields = vec![
                    DisplayField::text("Name", &employer.business_name),
                    DisplayField::text("Owner", &employer.owner),
                    DisplayField::text("District", &employer.district),
                ];
                if let Some(category) = &employer.category {
                    fields.push(DisplayField::text("Category", category));
                }
                fields.push(DisplayField::new(
                    "Document",
                    FieldValue::DocumentLink(employer.document_url.clone()),
                ));
                fields
            }
            EntityPayload::School(school) => vec![
                DisplayField::text("Name", &school.name),
                DisplayField::text("Principal", &school.principal),
                DisplayField::text("District", &school.district),
                DisplayField::new(
                    "Document",
                    FieldValue::DocumentLink(school.document_url.clone()),
                ),
            ],
            EntityPayload::Company(company) => vec![
                DisplayField::text("Name", &company.name),
                DisplayField::text("Owner", &company.owner),
                DisplayField::text("District", &company.district),
                DisplayField::new("Workers", FieldValue::Count(company.workers)),
                DisplayField::new(
                    "Document",
                    FieldValue::DocumentLink(company.document_url.clone()),
                ),
            ],
            EntityPayload::Vacancy(vacancy) => {
                let mut fields = vec![
                    DisplayField::text("Position", &vacancy.position),
                    DisplayField::text("Employer", &vacancy.employer),
                    DisplayField::text("Institution", &vacancy.institution),
                    DisplayField::text("District", &vacancy.district),
                    DisplayField::new("Openings", FieldValue::Count(vacancy.openings)),
                ];
                if let Some(valid_till) = vacancy.valid_till {
                    fields.push(DisplayField::new("Valid Till", FieldValue::Date(valid_till)));
                }
                fields
            }
            EntityPayload::WageSlip(slip) => vec![
                DisplayField::text("Student", &slip.student),
                DisplayField::text("Employer ID", &slip.employer_id),
                DisplayField::text("Month", &slip.month),
                DisplayField::new("Monthly Amount", FieldValue::Currency(slip.monthly_amount)),
                DisplayField::new(
                    "Document",
                    FieldValue::DocumentLink(slip.document_url.clone()),
                ),
            ],
            EntityPayload::Resignation(notice) => vec![
                DisplayField::text("Student ID", &notice.student_id),
                DisplayField::text("Student", &notice.student_name),
                DisplayField::text("Employer", &notice.employer),
                DisplayField::new("Date", FieldValue::Date(notice.submitted_on)),
                DisplayField::text("Reason", &notice.reason),
                DisplayField::new("Attachments", FieldValue::List(notice.attachments.clone())),
            ],
            EntityPayload::Grievance(grievance) => {
                let mut fields = vec![
                    DisplayField::text("From", &grievance.raised_by),
                    DisplayField::text("Issue", &grievance.issue),
                ];
                if let Some(concerning) = &grievance.concerning {
                    fields.push(DisplayField::text("Concerning", concerning));
                }
                if let Some(district) = &grievance.district {
                    fields.push(DisplayField::text("District", district));
                }
                fields
            }
        }
    }

    /// Value matched by a structured filter, if this kind carries that attribute.
    pub fn attribute(&self, field: FilterField) -> Option<&str> {
        match (self, field) {
            (EntityPayload::Employer(employer), FilterField::District) => Some(&employer.district),
            (EntityPayload::Employer(employer), FilterField::Employer) => {
                Some(&employer.business_name)
            }
            (EntityPayload::School(school), FilterField::District) => Some(&school.district),
            (EntityPayload::School(school), FilterField::Institution) => Some(&school.name),
            (EntityPayload::Company(company), FilterField::District) => Some(&company.district),
            (EntityPayload::Company(company), FilterField::Employer) => Some(&company.name),
            (EntityPayload::Vacancy(vacancy), FilterField::District) => Some(&vacancy.district),
            (EntityPayload::Vacancy(vacancy), FilterField::Employer) => Some(&vacancy.employer),
            (EntityPayload::Vacancy(vacancy), FilterField::Institution) => {
                Some(&vacancy.institution)
            }
            (EntityPayload::WageSlip(slip), FilterField::Employer) => Some(&slip.employer_id),
            (EntityPayload::Resignation(notice), FilterField::Employer) => Some(&notice.employer),
            (EntityPayload::Grievance(grievance), FilterField::District) => {
                grievance.district.as_deref()
            }
            (EntityPayload::Grievance(grievance), FilterField::Employer) => {
                grievance.concerning.as_deref()
            }
            _ => None,
        }
    }
}

/// A registered record together with its workflow state.
///
/// `verified` is derived from `status` on every construction and mutation so the two
/// can never disagree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    id: EntityId,
    kind: EntityKind,
    status: EntityStatus,
    verified: bool,
    payload: EntityPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    rejection_reason: Option<String>,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    search_text: String,
}

impl Entity {
    /// Build a record in an explicit state, e.g. when seeding existing data.
    pub fn new(
        id: EntityId,
        payload: EntityPayload,
        status: EntityStatus,
        at: DateTime<Utc>,
    ) -> Result<Self, RegistryError> {
        let kind = payload.kind();
        if id.0.trim().is_empty() {
            return Err(RegistryError::Validation("entity id must not be empty".to_string()));
        }
        if !kind.lifecycle().contains(status) {
            return Err(RegistryError::Validation(format!(
                "status {} is not part of the {} lifecycle",
                status,
                kind.label().to_lowercase()
            )));
        }

        let search_text = build_search_text(&id, &payload, status.display_label(kind));
        Ok(Self {
            id,
            kind,
            status,
            verified: status.is_verified(),
            payload,
            rejection_reason: None,
            version: 1,
            created_at: at,
            updated_at: at,
            search_text,
        })
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn status(&self) -> EntityStatus {
        self.status
    }

    pub fn status_label(&self) -> &'static str {
        self.status.display_label(self.kind)
    }

    pub fn is_verified(&self) -> bool {
        self.verified
    }

    pub fn payload(&self) -> &EntityPayload {
        &self.payload
    }

    pub fn display_name(&self) -> String {
        self.payload.display_name()
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Lower-cased haystack for free-text search, computed when the record changes.
    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    /// Value for a structured filter; `Status` matches the canonical label.
    pub fn attribute(&self, field: FilterField) -> Option<&str> {
        match field {
            FilterField::Status => Some(self.status.label()),
            other => self.payload.attribute(other),
        }
    }

    /// Fields in display order, with id and status leading.
    pub fn display_fields(&self) -> Vec<DisplayField> {
        let mut fields = vec![DisplayField::text("ID", self.id.as_str())];
        fields.extend(self.payload.fields());
        fields.push(DisplayField::new(
            "Status",
            FieldValue::Status(self.status_label().to_string()),
        ));
        fields
    }

    /// Produce the patched record without touching `self`.
    pub(crate) fn patched(
        &self,
        patch: &EntityPatch,
        at: DateTime<Utc>,
    ) -> Result<Self, RegistryError> {
        if let Some(expected) = patch.expected_version {
            if expected != self.version {
                return Err(RegistryError::VersionConflict {
                    id: self.id.clone(),
                    expected,
                    actual: self.version,
                });
            }
        }

        let mut next = self.clone();
        if let Some(payload) = &patch.payload {
            if payload.kind() != self.kind {
                return Err(RegistryError::Validation(format!(
                    "cannot replace {} payload with {} payload",
                    self.kind.label().to_lowercase(),
                    payload.kind().label().to_lowercase()
                )));
            }
            next.payload = payload.clone();
        }
        if let Some(status) = patch.status {
            if !self.kind.lifecycle().contains(status) {
                return Err(RegistryError::Validation(format!(
                    "status {} is not part of the {} lifecycle",
                    status,
                    self.kind.label().to_lowercase()
                )));
            }
            next.status = status;
            next.verified = status.is_verified();
        }
        if let Some(reason) = &patch.rejection_reason {
            next.rejection_reason = reason.clone();
        }

        next.search_text =
            build_search_text(&next.id, &next.payload, next.status.display_label(next.kind));
        next.version = self.version + 1;
        next.updated_at = at;
        Ok(next)
    }
}

fn build_search_text(id: &EntityId, payload: &EntityPayload, status_label: &str) -> String {
    let mut parts = vec![id.0.clone(), status_label.to_string()];
    parts.extend(
        payload
            .fields()
            .into_iter()
            .filter(|field| field.value.searchable())
            .map(|field| field.value.render()),
    );
    parts.join(" ").to_lowercase()
}

/// Partial update applied atomically by a registry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityPatch {
    pub status: Option<EntityStatus>,
    pub payload: Option<EntityPayload>,
    /// `Some(None)` clears the stored reason.
    pub rejection_reason: Option<Option<String>>,
    pub expected_version: Option<u64>,
}

impl EntityPatch {
    pub fn status(status: EntityStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn payload(payload: EntityPayload) -> Self {
        Self {
            payload: Some(payload),
            ..Self::default()
        }
    }

    pub fn with_rejection_reason(mut self, reason: Option<String>) -> Self {
        self.rejection_reason = Some(reason);
        self
    }

    pub fn expecting_version(mut self, version: u64) -> Self {
        self.expected_version = Some(version);
        self
    }
}
