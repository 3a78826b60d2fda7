use crate::error::{DashboardError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

pub const DEFAULT_MARKET_TOTAL: &str = "TOTAL_MERCADO";
pub const DEFAULT_COMPANY_TOTAL: &str = "TOTAL_EMPRESA";
pub const DEFAULT_MARKET_SERIES_LABEL: &str = "Total Market";

/// Resolution at which two dates are considered the same period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum Granularity {
    /// Compare on year and month only. Matches monthly series regardless of day.
    #[default]
    Month,
    /// Compare exact calendar days.
    Day,
}

/// A declared aggregate paired with the checksum the ETL computed for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ChecksumRule {
    pub checksum_category: String,
    pub declared_category: String,
}

impl ChecksumRule {
    pub fn new(checksum_category: &str, declared_category: &str) -> Self {
        Self {
            checksum_category: checksum_category.to_string(),
            declared_category: declared_category.to_string(),
        }
    }
}

/// A selectable data source. `location` is opaque to this crate; the loader resolves it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DataSourceConfig {
    pub id: String,
    pub label: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DashboardConfig {
    /// Category holding the whole-market aggregate. Drives date bounding.
    pub market_total_category: String,

    /// Company identifier under which market aggregates are filed.
    pub market_total_company: String,

    /// Category holding one company's aggregate across its categories.
    pub company_total_category: String,

    /// Checksum and validation categories, never offered as filters.
    pub excluded_categories: Vec<String>,

    /// Aggregate categories, used for the ALL scenarios but never offered as filters.
    pub total_categories: Vec<String>,

    pub market_series_label: String,

    pub granularity: Granularity,

    pub checksum_tolerance: f64,

    pub checksum_rules: Vec<ChecksumRule>,

    pub sources: Vec<DataSourceConfig>,

    pub default_source: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            market_total_category: DEFAULT_MARKET_TOTAL.to_string(),
            market_total_company: DEFAULT_MARKET_TOTAL.to_string(),
            company_total_category: DEFAULT_COMPANY_TOTAL.to_string(),
            excluded_categories: vec![
                DEFAULT_COMPANY_TOTAL.to_string(),
                DEFAULT_MARKET_TOTAL.to_string(),
                "CHECK_SUM_SERVICIOS".to_string(),
                "CHECK_SUM_TOTALES_EMPRESA".to_string(),
                "CHECK_SUM_MODALIDADES".to_string(),
            ],
            total_categories: vec![
                DEFAULT_COMPANY_TOTAL.to_string(),
                DEFAULT_MARKET_TOTAL.to_string(),
            ],
            market_series_label: DEFAULT_MARKET_SERIES_LABEL.to_string(),
            granularity: Granularity::Month,
            checksum_tolerance: 0.5,
            checksum_rules: vec![
                ChecksumRule::new("CHECK_SUM_SERVICIOS", DEFAULT_COMPANY_TOTAL),
                ChecksumRule::new("CHECK_SUM_TOTALES_EMPRESA", DEFAULT_MARKET_TOTAL),
            ],
            sources: vec![
                DataSourceConfig {
                    id: "servicios".to_string(),
                    label: "Lines by service".to_string(),
                    location: "output/lineas_por_servicio_long.csv".to_string(),
                },
                DataSourceConfig {
                    id: "modalidad".to_string(),
                    label: "Lines by modality".to_string(),
                    location: "output/lineas_por_modalidad_fact.csv".to_string(),
                },
            ],
            default_source: "servicios".to_string(),
        }
    }
}

impl DashboardConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        let identifiers = [
            ("market_total_category", &self.market_total_category),
            ("market_total_company", &self.market_total_company),
            ("company_total_category", &self.company_total_category),
            ("market_series_label", &self.market_series_label),
        ];
        for (field, value) in identifiers {
            if value.trim().is_empty() {
                return Err(invalid(field, "must not be empty"));
            }
        }

        if !self.checksum_tolerance.is_finite() || self.checksum_tolerance < 0.0 {
            return Err(invalid(
                "checksum_tolerance",
                format!("must be a non-negative number, got {}", self.checksum_tolerance),
            ));
        }

        let mut seen = HashSet::new();
        for source in &self.sources {
            if source.id.trim().is_empty() {
                return Err(invalid("sources", "source id must not be empty"));
            }
            if !seen.insert(source.id.as_str()) {
                return Err(invalid(
                    "sources",
                    format!("duplicate source id '{}'", source.id),
                ));
            }
        }

        if self.source(&self.default_source).is_none() {
            return Err(invalid(
                "default_source",
                format!("'{}' is not one of the configured sources", self.default_source),
            ));
        }

        Ok(())
    }

    pub fn source(&self, id: &str) -> Option<&DataSourceConfig> {
        self.sources.iter().find(|s| s.id == id)
    }

    /// True for categories that may never appear in the category filter.
    pub fn is_hidden_category(&self, category: &str) -> bool {
        self.excluded_categories.iter().any(|c| c == category)
            || self.total_categories.iter().any(|c| c == category)
    }
}

fn invalid(field: &str, details: impl Into<String>) -> DashboardError {
    DashboardError::InvalidConfig {
        field: field.to_string(),
        details: details.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = DashboardConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.is_hidden_category("TOTAL_EMPRESA"));
        assert!(config.is_hidden_category("CHECK_SUM_SERVICIOS"));
        assert!(!config.is_hidden_category("PREPAGO"));
    }

    #[test]
    fn test_default_checksum_rules_match_per_company_exports() {
        // Modality checksums are written under their own company with no
        // category, so only the service and market checksums pair with a total.
        let config = DashboardConfig::default();
        assert_eq!(
            config.checksum_rules,
            vec![
                ChecksumRule::new("CHECK_SUM_SERVICIOS", "TOTAL_EMPRESA"),
                ChecksumRule::new("CHECK_SUM_TOTALES_EMPRESA", "TOTAL_MERCADO"),
            ]
        );
        assert!(config.is_hidden_category("CHECK_SUM_MODALIDADES"));
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config = DashboardConfig::from_json_str(
            r#"{ "market_series_label": "Mercado", "granularity": "Day" }"#,
        )
        .unwrap();

        assert_eq!(config.market_series_label, "Mercado");
        assert_eq!(config.granularity, Granularity::Day);
        assert_eq!(config.market_total_category, "TOTAL_MERCADO");
        assert_eq!(config.sources.len(), 2);
    }

    #[test]
    fn test_rejects_unknown_default_source() {
        let result = DashboardConfig::from_json_str(r#"{ "default_source": "nope" }"#);
        match result {
            Err(DashboardError::InvalidConfig { field, .. }) => assert_eq!(field, "default_source"),
            other => panic!("expected InvalidConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_duplicate_sources_and_negative_tolerance() {
        let mut config = DashboardConfig::default();
        config.sources.push(config.sources[0].clone());
        assert!(config.validate().is_err());

        let config = DashboardConfig {
            checksum_tolerance: -1.0,
            ..DashboardConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
