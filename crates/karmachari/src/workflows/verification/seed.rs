//! Demo records mirroring the officer dashboards, used for local runs and tests.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::info;

use super::dispatcher::DispatchError;
use super::domain::{
    CompanyProfile, EmployerProfile, Entity, EntityPayload, EntityStatus, GrievanceReport,
    ResignationNotice, SchoolProfile, VacancyPosting, WageSlip,
};
use super::notification::NotificationEmitter;
use super::portal::Portal;
use super::registry::{EntityRegistry, RegistryError};

fn date(year: i32, month: u32, day: u32) -> Result<NaiveDate, RegistryError> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| RegistryError::Validation(format!("invalid date {year}-{month}-{day}")))
}

fn employer(name: &str, owner: &str, district: &str, category: &str, doc: &str) -> EntityPayload {
    EntityPayload::Employer(EmployerProfile {
        business_name: name.to_string(),
        owner: owner.to_string(),
        district: district.to_string(),
        category: Some(category.to_string()),
        document_url: format!("https://example.com/{doc}"),
    })
}

fn school(name: &str, principal: &str, district: &str, doc: &str) -> EntityPayload {
    EntityPayload::School(SchoolProfile {
        name: name.to_string(),
        principal: principal.to_string(),
        district: district.to_string(),
        document_url: format!("https://example.com/{doc}"),
    })
}

fn company(name: &str, owner: &str, district: &str, workers: u32, doc: &str) -> EntityPayload {
    EntityPayload::Company(CompanyProfile {
        name: name.to_string(),
        owner: owner.to_string(),
        district: district.to_string(),
        workers,
        document_url: format!("https://example.com/{doc}"),
    })
}

fn wage_slip(student: &str, employer_id: &str, month: &str, amount: u64, doc: &str) -> EntityPayload {
    EntityPayload::WageSlip(WageSlip {
        student: student.to_string(),
        employer_id: employer_id.to_string(),
        month: month.to_string(),
        monthly_amount: amount,
        document_url: format!("https://example.com/{doc}"),
    })
}

fn grievance(raised_by: &str, issue: &str, concerning: Option<&str>, district: &str) -> EntityPayload {
    EntityPayload::Grievance(GrievanceReport {
        raised_by: raised_by.to_string(),
        issue: issue.to_string(),
        concerning: concerning.map(str::to_string),
        district: Some(district.to_string()),
    })
}

/// The demo data set, in display order.
pub fn demo_records(at: DateTime<Utc>) -> Result<Vec<Entity>, RegistryError> {
    use EntityStatus::{Approved, Open, Pending, Rejected, Resolved};

    let vacancy = |position: &str,
                   employer: &str,
                   institution: &str,
                   district: &str,
                   openings: u32,
                   valid_till: NaiveDate| {
        EntityPayload::Vacancy(VacancyPosting {
            position: position.to_string(),
            employer: employer.to_string(),
            institution: institution.to_string(),
            district: district.to_string(),
            openings,
            valid_till: Some(valid_till),
        })
    };
    let resignation = |student_id: &str,
                       student_name: &str,
                       submitted_on: NaiveDate,
                       reason: &str,
                       attachment: &str| {
        EntityPayload::Resignation(ResignationNotice {
            student_id: student_id.to_string(),
            student_name: student_name.to_string(),
            employer: "RC Technologies".to_string(),
            submitted_on,
            reason: reason.to_string(),
            attachments: vec![attachment.to_string()],
        })
    };

    let rows = vec![
        ("E101", employer("IHRD", "Mr. Suresh Kumar", "Ernakulam", "Education", "ihrd-doc.pdf"), Pending),
        ("E102", employer("RC Technologies", "Mrs. Meera R", "Thiruvananthapuram", "IT Services", "rc-doc.pdf"), Approved),
        ("E103", employer("Govt. Polytechnic", "Dr. Latha V", "Kozhikode", "Education", "polytechnic-doc.pdf"), Pending),
        ("E104", employer("Axis Bank Ltd.", "Mr. Thomas K", "Ernakulam", "Banking", "axis-doc.pdf"), Approved),
        ("S101", school("College A", "Dr. Nisha Menon", "Ernakulam", "collegeA-doc.pdf"), Pending),
        ("S102", school("College B", "Dr. Ajith Kumar", "Thrissur", "collegeB-doc.pdf"), Approved),
        ("S103", school("ITI Thiruvananthapuram", "Mr. R. Varma", "Thiruvananthapuram", "iti-doc.pdf"), Approved),
        ("C101", company("Alpha Constructions", "R. Krishnan", "Kollam", 42, "alpha-doc.pdf"), Pending),
        ("C102", company("BlueLine Textiles", "Latha Devi", "Kannur", 88, "blueline-doc.pdf"), Approved),
        ("C103", company("GreenTech Solutions", "A. S. Menon", "Ernakulam", 15, "greentech-doc.pdf"), Approved),
        ("V101", vacancy("Apprentice Software Developer", "RC Technologies", "College A", "Ernakulam", 5, date(2025, 11, 20)?), Pending),
        ("V102", vacancy("Electrician Apprentice", "IHRD", "ITI Thiruvananthapuram", "Thiruvananthapuram", 10, date(2025, 11, 18)?), Pending),
        ("V103", vacancy("Clerk Trainee", "Axis Bank Ltd.", "College B", "Thrissur", 3, date(2025, 11, 15)?), Approved),
        ("V104", vacancy("Hospitality Trainee", "Star Hotels", "College B", "Thrissur", 2, date(2025, 11, 10)?), Rejected),
        ("W1001", wage_slip("Ravi K", "E101", "Aug 2025", 2500, "wage-ravi.pdf"), Pending),
        ("W1002", wage_slip("Sita P", "E102", "Aug 2025", 3000, "wage-sita.pdf"), Approved),
        ("W1003", wage_slip("Arun J", "E103", "Sep 2025", 3500, "wage-arun.pdf"), Pending),
        ("RES101", resignation("STU1002", "Ravi K", date(2025, 9, 15)?, "Moved to private sector", "resignation_letter_ravi.pdf"), Pending),
        ("RES102", resignation("STU1005", "Manoj T", date(2025, 10, 20)?, "Family commitment", "resignation_letter_manoj.pdf"), Approved),
        ("G1001", grievance("Asha P", "Wrong pay scale for trade XY", Some("RC Technologies"), "Ernakulam"), Open),
        ("G1002", grievance("Employer E101", "Apprentice attendance issue", Some("IHRD"), "Ernakulam"), Open),
        ("G1003", grievance("Student L", "Lack of mentorship at E104", Some("Axis Bank Ltd."), "Thrissur"), Resolved),
    ];

    rows.into_iter()
        .map(|(id, payload, status)| Entity::new(id.into(), payload, status, at))
        .collect()
}

/// Load the demo data set into `portal`. Fails on the first id that already exists.
pub fn seed_portal<R, N>(portal: &Portal<R, N>) -> Result<usize, DispatchError>
where
    R: EntityRegistry + 'static,
    N: NotificationEmitter + 'static,
{
    let records = demo_records(portal.clock().now())?;
    let count = records.len();
    for record in records {
        portal.insert(record)?;
    }
    info!(records = count, "demo records seeded");
    Ok(count)
}
