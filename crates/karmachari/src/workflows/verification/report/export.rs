use std::fmt;

use super::views::EntityView;

/// Output formats for table exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Json => "application/json",
        }
    }

    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write csv export: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to encode json export: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to flush export buffer: {0}")]
    Buffer(String),
}

/// Serialize `rows` in display order.
///
/// CSV output has a `Kind` column followed by the union of every row's field names in
/// first-seen order; cells hold the rendered values, so currency reads `₹12,500`.
pub fn export(rows: &[EntityView], format: ExportFormat) -> Result<Vec<u8>, ExportError> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_vec_pretty(rows)?),
        ExportFormat::Csv => export_csv(rows),
    }
}

fn export_csv(rows: &[EntityView]) -> Result<Vec<u8>, ExportError> {
    let mut columns: Vec<&'static str> = Vec::new();
    for row in rows {
        for field in &row.fields {
            if !columns.contains(&field.name) {
                columns.push(field.name);
            }
        }
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    let mut header = vec!["Kind"];
    header.extend(columns.iter().copied());
    writer.write_record(&header)?;

    for row in rows {
        let mut record = vec![row.kind_label.to_string()];
        record.extend(
            columns
                .iter()
                .map(|column| row.rendered(column).unwrap_or_default()),
        );
        writer.write_record(&record)?;
    }

    writer
        .into_inner()
        .map_err(|err| ExportError::Buffer(err.error().to_string()))
}
