use crate::config::Granularity;
use crate::error::{DashboardError, Result};
use crate::schema::ChartData;
use crate::utils::{period_key, year_ago};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

/// Change between two totals. `percent` is 0 when the base is not positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Variation {
    pub delta: f64,
    pub percent: f64,
}

impl Variation {
    pub fn between(current: f64, base: f64) -> Self {
        let delta = current - base;
        let percent = if base > 0.0 { delta / base * 100.0 } else { 0.0 };
        Self { delta, percent }
    }

    pub fn direction(&self) -> Direction {
        if self.delta >= 0.0 {
            Direction::Up
        } else {
            Direction::Down
        }
    }
}

impl fmt::Display for Variation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arrow = match self.direction() {
            Direction::Up => '↑',
            Direction::Down => '↓',
        };
        write!(f, "{} {:.2}%", arrow, self.percent.abs())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct KpiSet {
    pub latest_date: NaiveDate,
    pub previous_date: NaiveDate,
    pub current_total: f64,
    pub previous_month_total: f64,
    pub month_over_month: Variation,
    /// Date matched as "same month last year", if the axis has one.
    pub year_ago_date: Option<NaiveDate>,
    pub previous_year_total: Option<f64>,
    /// `None` means unavailable, which is not the same as no change.
    pub year_over_year: Option<Variation>,
}

impl KpiSet {
    pub fn year_over_year_label(&self) -> String {
        match &self.year_over_year {
            Some(variation) => variation.to_string(),
            None => "N/A".to_string(),
        }
    }
}

pub struct KpiCalculator {
    granularity: Granularity,
}

impl KpiCalculator {
    pub fn new(granularity: Granularity) -> Self {
        Self { granularity }
    }

    /// Computes KPIs from absolute (not share-normalized) chart data.
    pub fn compute(&self, chart: &ChartData) -> Result<KpiSet> {
        let n = chart.labels.len();
        if n < 2 {
            return Err(DashboardError::InsufficientPeriods { found: n });
        }

        let latest_date = chart.labels[n - 1];
        let previous_date = chart.labels[n - 2];

        let current_total = chart.column_total(n - 1);
        let previous_month_total = chart.column_total(n - 2);

        let year_ago_index = self.find_year_ago(&chart.labels, latest_date);
        let previous_year_total = year_ago_index.map(|i| chart.column_total(i));

        Ok(KpiSet {
            latest_date,
            previous_date,
            current_total,
            previous_month_total,
            month_over_month: Variation::between(current_total, previous_month_total),
            year_ago_date: year_ago_index.map(|i| chart.labels[i]),
            previous_year_total,
            year_over_year: previous_year_total
                .map(|total| Variation::between(current_total, total)),
        })
    }

    fn find_year_ago(&self, labels: &[NaiveDate], latest: NaiveDate) -> Option<usize> {
        let target = period_key(year_ago(latest)?, self.granularity);
        labels
            .iter()
            .position(|&label| period_key(label, self.granularity) == target)
    }
}

pub fn compute_kpis(chart: &ChartData, granularity: Granularity) -> Result<KpiSet> {
    KpiCalculator::new(granularity).compute(chart)
}
