use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid configuration field '{field}': {details}")]
    InvalidConfig { field: String, details: String },

    #[error("Unknown data source: {0}")]
    UnknownSource(String),

    #[error("Failed to load data source '{source_id}': {details}")]
    LoadFailed { source_id: String, details: String },

    #[error("At least 2 distinct periods are required, found {found}")]
    InsufficientPeriods { found: usize },

    #[error("Stacked shares on {date} sum to {total} instead of 100")]
    ShareTotalViolation { date: NaiveDate, total: f64 },

    #[error("Checksum mismatch on {date} for {company}: {checksum_category} ({checksum}) != {declared_category} ({declared})")]
    ChecksumMismatch {
        date: NaiveDate,
        company: String,
        checksum_category: String,
        checksum: f64,
        declared_category: String,
        declared: f64,
    },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
