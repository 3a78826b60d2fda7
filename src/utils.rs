use crate::config::Granularity;
use crate::error::{DashboardError, Result};
use chrono::{Datelike, Months, NaiveDate};

/// Parses "YYYY-MM-DD", an ISO datetime starting with "YYYY-MM-DD", or "YYYY-MM"
/// (taken as the first day of that month).
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();

    if let Some(day_part) = trimmed.get(..10) {
        if let Ok(date) = NaiveDate::parse_from_str(day_part, "%Y-%m-%d") {
            if trimmed.len() == 10 || trimmed[10..].starts_with(['T', ' ']) {
                return Ok(date);
            }
        }
    }

    let month_str = format!("{}-01", trimmed);
    NaiveDate::parse_from_str(&month_str, "%Y-%m-%d").map_err(|_| {
        DashboardError::InvalidDate(format!(
            "'{}'. Expected YYYY-MM-DD or YYYY-MM",
            raw
        ))
    })
}

/// Collapses a date to the resolution at which periods are compared.
pub fn period_key(date: NaiveDate, granularity: Granularity) -> NaiveDate {
    match granularity {
        Granularity::Day => date,
        Granularity::Month => first_day_of_month(date),
    }
}

pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Same month and day one year earlier, clamped to the month's last day (Feb 29 -> Feb 28).
pub fn year_ago(date: NaiveDate) -> Option<NaiveDate> {
    date.checked_sub_months(Months::new(12))
}
