use crate::config::{ChecksumRule, DashboardConfig};
use crate::error::{DashboardError, Result};
use crate::store::RecordStore;
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecksumDiscrepancy {
    pub date: NaiveDate,
    pub company: String,
    pub checksum_category: String,
    pub checksum: f64,
    pub declared_category: String,
    pub declared: f64,
}

impl ChecksumDiscrepancy {
    pub fn difference(&self) -> f64 {
        self.checksum - self.declared
    }
}

impl From<ChecksumDiscrepancy> for DashboardError {
    fn from(d: ChecksumDiscrepancy) -> Self {
        DashboardError::ChecksumMismatch {
            date: d.date,
            company: d.company,
            checksum_category: d.checksum_category,
            checksum: d.checksum,
            declared_category: d.declared_category,
            declared: d.declared,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    /// Number of (date, company, rule) pairs where both sides had values.
    pub checked: usize,
    pub discrepancies: Vec<ChecksumDiscrepancy>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.discrepancies.is_empty()
    }
}

/// Cross-checks the ETL's checksum rows against the totals they were computed for.
pub struct ChecksumAuditor<'a> {
    rules: &'a [ChecksumRule],
    tolerance: f64,
}

impl<'a> ChecksumAuditor<'a> {
    pub fn new(config: &'a DashboardConfig) -> Self {
        Self {
            rules: &config.checksum_rules,
            tolerance: config.checksum_tolerance,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn audit(&self, store: &RecordStore) -> AuditReport {
        let mut report = AuditReport::default();
        let companies: Vec<&str> = store.companies().collect();

        for &date in store.labels() {
            for &company in &companies {
                for rule in self.rules {
                    let checksum = store.value(date, company, &rule.checksum_category);
                    let declared = store.value(date, company, &rule.declared_category);

                    let (Some(checksum), Some(declared)) = (checksum, declared) else {
                        continue;
                    };

                    report.checked += 1;
                    if (checksum - declared).abs() > self.tolerance {
                        report.discrepancies.push(ChecksumDiscrepancy {
                            date,
                            company: company.to_string(),
                            checksum_category: rule.checksum_category.clone(),
                            checksum,
                            declared_category: rule.declared_category.clone(),
                            declared,
                        });
                    }
                }
            }
        }

        debug!(
            "Checksum audit: {} comparisons, {} discrepancies",
            report.checked,
            report.discrepancies.len()
        );

        report
    }

    /// Fails on the first discrepancy, in date order.
    pub fn verify(&self, store: &RecordStore) -> Result<()> {
        match self.audit(store).discrepancies.into_iter().next() {
            Some(discrepancy) => Err(discrepancy.into()),
            None => Ok(()),
        }
    }
}

pub fn audit_checksums(store: &RecordStore, config: &DashboardConfig) -> AuditReport {
    ChecksumAuditor::new(config).audit(store)
}

pub fn verify_checksums(store: &RecordStore, config: &DashboardConfig) -> Result<()> {
    ChecksumAuditor::new(config).verify(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Row;

    fn d(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    #[test]
    fn test_consistent_checksums_pass() {
        let store = RecordStore::new(vec![
            Row::new(d(2025, 1), "CNT EP", "TOTAL_EMPRESA", Some(100.0)),
            Row::new(d(2025, 1), "CNT EP", "CHECK_SUM_SERVICIOS", Some(100.2)),
            Row::new(d(2025, 1), "TOTAL_MERCADO", "TOTAL_MERCADO", Some(100.0)),
            Row::new(d(2025, 1), "TOTAL_MERCADO", "CHECK_SUM_TOTALES_EMPRESA", Some(100.0)),
        ]);
        let config = DashboardConfig::default();

        let report = audit_checksums(&store, &config);
        assert_eq!(report.checked, 2);
        assert!(report.is_clean());
        assert!(verify_checksums(&store, &config).is_ok());
    }

    #[test]
    fn test_mismatch_is_reported() {
        let store = RecordStore::new(vec![
            Row::new(d(2025, 1), "OTECEL S.A.", "TOTAL_EMPRESA", Some(100.0)),
            Row::new(d(2025, 1), "OTECEL S.A.", "CHECK_SUM_SERVICIOS", Some(90.0)),
            // no declared total: skipped
            Row::new(d(2025, 2), "OTECEL S.A.", "CHECK_SUM_SERVICIOS", Some(90.0)),
        ]);
        let config = DashboardConfig::default();

        let report = audit_checksums(&store, &config);
        assert_eq!(report.checked, 1);
        assert_eq!(report.discrepancies.len(), 1);
        assert_eq!(report.discrepancies[0].difference(), -10.0);

        match verify_checksums(&store, &config) {
            Err(DashboardError::ChecksumMismatch { company, date, .. }) => {
                assert_eq!(company, "OTECEL S.A.");
                assert_eq!(date, d(2025, 1));
            }
            other => panic!("expected ChecksumMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_custom_tolerance() {
        let store = RecordStore::new(vec![
            Row::new(d(2025, 1), "A", "TOTAL_EMPRESA", Some(100.0)),
            Row::new(d(2025, 1), "A", "CHECK_SUM_SERVICIOS", Some(99.0)),
        ]);
        let config = DashboardConfig::default();

        assert!(!ChecksumAuditor::new(&config).audit(&store).is_clean());
        assert!(ChecksumAuditor::new(&config)
            .with_tolerance(1.5)
            .verify(&store)
            .is_ok());
    }
}
