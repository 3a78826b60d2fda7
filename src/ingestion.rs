use crate::schema::Row;
use crate::utils::parse_date;
use log::warn;
use serde::{Deserialize, Serialize};

/// A record as handed over by the loader, before any typing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub date: String,
    pub company: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub value: Option<f64>,
}

impl RawRecord {
    pub fn new(date: &str, company: &str, category: &str, value: Option<f64>) -> Self {
        Self {
            date: date.to_string(),
            company: company.to_string(),
            category: category.to_string(),
            value,
        }
    }
}

/// A record that could not be turned into a [`Row`].
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    /// 0-based position in the input sequence.
    pub index: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub rows: Vec<Row>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

impl IngestReport {
    pub fn rows_used(&self) -> usize {
        self.rows.len()
    }
}

/// Types every record, skipping the ones that cannot be placed on the date axis.
pub fn ingest_records<I>(records: I) -> IngestReport
where
    I: IntoIterator<Item = RawRecord>,
{
    let mut report = IngestReport::default();

    for (index, record) in records.into_iter().enumerate() {
        report.rows_read += 1;

        let date = match parse_date(&record.date) {
            Ok(date) => date,
            Err(e) => {
                report.row_errors.push(RowError {
                    index,
                    message: e.to_string(),
                });
                continue;
            }
        };

        let company = record.company.trim();
        if company.is_empty() {
            report.row_errors.push(RowError {
                index,
                message: "Missing company identifier".to_string(),
            });
            continue;
        }

        report.rows.push(Row {
            date,
            company: company.to_string(),
            category: record.category.trim().to_string(),
            value: record.value.filter(|v| v.is_finite()),
        });
    }

    if !report.row_errors.is_empty() {
        warn!(
            "Skipped {} of {} records during ingestion (first: row {}: {})",
            report.row_errors.len(),
            report.rows_read,
            report.row_errors[0].index,
            report.row_errors[0].message
        );
    }

    report
}
