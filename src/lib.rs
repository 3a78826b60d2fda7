//! # Subscription Dashboard
//!
//! A library for shaping a long-format time series of subscription counts
//! (one row per date, company and category) into chart-ready series and
//! period-over-period KPIs.
//!
//! ## Core Concepts
//!
//! - **Bounding**: trailing periods without a positive market total are dropped at load
//! - **Filter Catalog**: the company and category options offered to the user
//! - **Scenarios**: a selection of `ALL` or one identifier on each axis picks one of
//!   four series shapes (whole market, one category per company, one company's total,
//!   a single cell)
//! - **Stacked shares**: every date rescaled so the series sum to 100
//! - **KPIs**: latest period against the previous one and against the same month last year
//!
//! ## Example
//!
//! ```rust,ignore
//! use subscription_dashboard::*;
//!
//! let mut session = DashboardSession::new(DashboardConfig::default())?;
//! let ticket = session.begin_load()?;
//! // ... fetch and parse `ticket.location` into `records` ...
//! session.complete_load(&ticket, records);
//! session.set_category("PREPAGO");
//!
//! if let RenderOutcome::Ready(view) = session.render() {
//!     println!("{} on {}", view.kpis.current_total, view.kpis.latest_date);
//!     println!("MoM {}, YoY {}", view.kpis.month_over_month, view.kpis.year_over_year_label());
//! }
//! ```

pub mod bounder;
pub mod catalog;
pub mod config;
pub mod error;
pub mod ingestion;
pub mod kpi;
pub mod normalizer;
pub mod schema;
pub mod series;
pub mod session;
pub mod store;
pub mod utils;
pub mod validation;

pub use bounder::{bound_rows, BoundedRows, DateBounder};
pub use catalog::FilterCatalog;
pub use config::{ChecksumRule, DashboardConfig, DataSourceConfig, Granularity};
pub use error::{DashboardError, Result};
pub use ingestion::*;
pub use kpi::{compute_kpis, Direction, KpiCalculator, KpiSet, Variation};
pub use normalizer::{normalize_to_shares, verify_shares};
pub use schema::*;
pub use series::{build_chart_data, Scenario, SeriesBuilder};
pub use session::{
    DashboardSession, DashboardView, LoadOutcome, LoadTicket, RenderOutcome, SkipReason,
};
pub use store::RecordStore;
pub use validation::{
    audit_checksums, verify_checksums, AuditReport, ChecksumAuditor, ChecksumDiscrepancy,
};

use log::{debug, info};

/// One-shot pipeline for callers that do not keep a session around.
pub struct DashboardProcessor;

impl DashboardProcessor {
    pub fn process<I>(
        config: &DashboardConfig,
        records: I,
        selection: &FilterSelection,
        chart_type: ChartType,
    ) -> Result<RenderOutcome>
    where
        I: IntoIterator<Item = RawRecord>,
    {
        config.validate()?;

        let report = ingest_records(records);
        let bounded = bound_rows(report.rows, &config.market_total_category);
        let store = RecordStore::new(bounded.rows);

        info!(
            "Processing {} rows ({} read) for selection {}/{}",
            store.len(),
            report.rows_read,
            selection.company,
            selection.category
        );

        if store.is_empty() {
            return Ok(RenderOutcome::Skipped(SkipReason::EmptyDataset));
        }
        if store.labels().len() < 2 {
            return Ok(RenderOutcome::Skipped(SkipReason::InsufficientPeriods));
        }

        let absolute = build_chart_data(&store, config, selection);
        let kpis = compute_kpis(&absolute, config.granularity)?;
        debug!(
            "Latest period {}: total {} ({} series)",
            kpis.latest_date,
            kpis.current_total,
            absolute.series.len()
        );

        let percentage_mode = chart_type.is_percentage();
        let chart = if percentage_mode {
            normalize_to_shares(&absolute)
        } else {
            absolute
        };

        Ok(RenderOutcome::Ready(DashboardView {
            chart,
            percentage_mode,
            kpis,
        }))
    }
}

pub fn process_dashboard<I>(
    config: &DashboardConfig,
    records: I,
    selection: &FilterSelection,
    chart_type: ChartType,
) -> Result<RenderOutcome>
where
    I: IntoIterator<Item = RawRecord>,
{
    DashboardProcessor::process(config, records, selection, chart_type)
}
