use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel accepted by selection inputs for "no filter".
pub const ALL: &str = "ALL";

/// One long-format observation. `value` is `None` when the source left it blank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Row {
    pub date: NaiveDate,
    pub company: String,
    pub category: String,
    pub value: Option<f64>,
}

impl Row {
    pub fn new(date: NaiveDate, company: &str, category: &str, value: Option<f64>) -> Self {
        Self {
            date,
            company: company.to_string(),
            category: category.to_string(),
            value,
        }
    }

    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }
}

/// One side of a filter selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Scope {
    #[default]
    All,
    Only(String),
}

impl Scope {
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed == ALL {
            Scope::All
        } else {
            Scope::Only(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Scope::All => ALL,
            Scope::Only(id) => id,
        }
    }
}

impl From<String> for Scope {
    fn from(value: String) -> Self {
        Scope::parse(&value)
    }
}

impl From<&str> for Scope {
    fn from(value: &str) -> Self {
        Scope::parse(value)
    }
}

impl From<Scope> for String {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::All => ALL.to_string(),
            Scope::Only(id) => id,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterSelection {
    pub company: Scope,
    pub category: Scope,
}

impl FilterSelection {
    pub fn new(company: impl Into<Scope>, category: impl Into<Scope>) -> Self {
        Self {
            company: company.into(),
            category: category.into(),
        }
    }

    pub fn all() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    #[default]
    Line,
    /// 100%-stacked bars: every date's values rescaled to shares of that date's total.
    StackedPercent,
}

impl ChartType {
    pub fn is_percentage(self) -> bool {
        matches!(self, ChartType::StackedPercent)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Series {
    pub name: String,
    /// Stable position used by the renderer to pick colours and legend order.
    pub order: usize,
    pub points: Vec<f64>,
}

impl Series {
    pub fn at(&self, index: usize) -> f64 {
        self.points.get(index).copied().unwrap_or(0.0)
    }
}

/// Series aligned on a shared, ascending date axis.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct ChartData {
    pub labels: Vec<NaiveDate>,
    pub series: Vec<Series>,
}

impl ChartData {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Sum of every series' point at `index`, treating gaps as zero.
    pub fn column_total(&self, index: usize) -> f64 {
        self.series.iter().map(|s| s.at(index)).sum()
    }
}
