use crate::bounder::DateBounder;
use crate::catalog::FilterCatalog;
use crate::config::DashboardConfig;
use crate::error::{DashboardError, Result};
use crate::ingestion::{ingest_records, RawRecord, RowError};
use crate::kpi::{KpiCalculator, KpiSet};
use crate::normalizer::normalize_to_shares;
use crate::schema::{ChartData, ChartType, FilterSelection, Scope};
use crate::series::SeriesBuilder;
use crate::store::RecordStore;
use chrono::NaiveDate;
use log::{debug, info, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Handed out when a load starts; only the newest ticket may apply its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub generation: u64,
    pub source_id: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Applied {
        rows_read: usize,
        rows_kept: usize,
        cutoff: Option<NaiveDate>,
        row_errors: Vec<RowError>,
    },
    /// A newer load was started after this ticket; nothing changed.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotLoaded,
    EmptyDataset,
    InsufficientPeriods,
}

/// Everything the render consumer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DashboardView {
    pub chart: ChartData,
    pub percentage_mode: bool,
    pub kpis: KpiSet,
}

impl DashboardView {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn json_schema() -> Result<String> {
        let schema = schemars::schema_for!(DashboardView);
        Ok(serde_json::to_string_pretty(&schema)?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    Ready(DashboardView),
    Skipped(SkipReason),
}

#[derive(Debug, Clone)]
struct LoadedData {
    store: RecordStore,
    catalog: FilterCatalog,
    cutoff: Option<NaiveDate>,
}

/// State of one dashboard: which source is shown, its data, and the user's inputs.
pub struct DashboardSession {
    config: DashboardConfig,
    source_id: String,
    generation: u64,
    loaded: Option<LoadedData>,
    selection: FilterSelection,
    chart_type: ChartType,
}

impl DashboardSession {
    pub fn new(config: DashboardConfig) -> Result<Self> {
        config.validate()?;
        let source_id = config.default_source.clone();
        Ok(Self {
            config,
            source_id,
            generation: 0,
            loaded: None,
            selection: FilterSelection::all(),
            chart_type: ChartType::Line,
        })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn chart_type(&self) -> ChartType {
        self.chart_type
    }

    pub fn store(&self) -> Option<&RecordStore> {
        self.loaded.as_ref().map(|l| &l.store)
    }

    pub fn catalog(&self) -> Option<&FilterCatalog> {
        self.loaded.as_ref().map(|l| &l.catalog)
    }

    pub fn cutoff(&self) -> Option<NaiveDate> {
        self.loaded.as_ref().and_then(|l| l.cutoff)
    }

    /// Starts a (re)load of the current source, invalidating any load in flight.
    pub fn begin_load(&mut self) -> Result<LoadTicket> {
        let source = self
            .config
            .source(&self.source_id)
            .ok_or_else(|| DashboardError::UnknownSource(self.source_id.clone()))?;

        self.generation += 1;
        debug!(
            "Starting load #{} of '{}' from {}",
            self.generation, source.id, source.location
        );

        Ok(LoadTicket {
            generation: self.generation,
            source_id: source.id.clone(),
            location: source.location.clone(),
        })
    }

    /// Switches to another source. Returns `None` when it is already current.
    pub fn select_source(&mut self, source_id: &str) -> Result<Option<LoadTicket>> {
        if self.config.source(source_id).is_none() {
            return Err(DashboardError::UnknownSource(source_id.to_string()));
        }
        if source_id == self.source_id {
            return Ok(None);
        }

        info!("Switching data source from '{}' to '{}'", self.source_id, source_id);
        self.source_id = source_id.to_string();
        self.selection = FilterSelection::all();
        self.begin_load().map(Some)
    }

    pub fn complete_load<I>(&mut self, ticket: &LoadTicket, records: I) -> LoadOutcome
    where
        I: IntoIterator<Item = RawRecord>,
    {
        if self.is_stale(ticket) {
            warn!(
                "Discarding load #{} of '{}': superseded by load #{}",
                ticket.generation, ticket.source_id, self.generation
            );
            return LoadOutcome::Stale;
        }

        let report = ingest_records(records);
        let bounded = DateBounder::new(&self.config.market_total_category).bound(report.rows);
        let store = RecordStore::new(bounded.rows);
        let catalog = FilterCatalog::from_store(&store, &self.config);

        info!(
            "Loaded '{}': {} rows kept of {} read, {} companies, {} categories",
            ticket.source_id,
            store.len(),
            report.rows_read,
            catalog.companies.len(),
            catalog.categories.len()
        );

        let outcome = LoadOutcome::Applied {
            rows_read: report.rows_read,
            rows_kept: store.len(),
            cutoff: bounded.cutoff,
            row_errors: report.row_errors,
        };

        self.loaded = Some(LoadedData {
            store,
            catalog,
            cutoff: bounded.cutoff,
        });

        outcome
    }

    /// Records a failed load. Data from earlier loads stays in place.
    pub fn fail_load(&mut self, ticket: &LoadTicket, details: impl Into<String>) -> Result<()> {
        if self.is_stale(ticket) {
            debug!("Ignoring failure of superseded load #{}", ticket.generation);
            return Ok(());
        }
        Err(DashboardError::LoadFailed {
            source_id: ticket.source_id.clone(),
            details: details.into(),
        })
    }

    pub fn set_company(&mut self, company: impl Into<Scope>) {
        self.selection.company = company.into();
    }

    pub fn set_category(&mut self, category: impl Into<Scope>) {
        self.selection.category = category.into();
    }

    pub fn set_selection(&mut self, selection: FilterSelection) {
        self.selection = selection;
    }

    pub fn set_chart_type(&mut self, chart_type: ChartType) {
        self.chart_type = chart_type;
    }

    pub fn render(&self) -> RenderOutcome {
        let Some(loaded) = &self.loaded else {
            return self.skip(SkipReason::NotLoaded);
        };
        if loaded.store.is_empty() {
            return self.skip(SkipReason::EmptyDataset);
        }
        if loaded.store.labels().len() < 2 {
            return self.skip(SkipReason::InsufficientPeriods);
        }

        let absolute = SeriesBuilder::new(&loaded.store, &self.config).build(&self.selection);

        let kpis = match KpiCalculator::new(self.config.granularity).compute(&absolute) {
            Ok(kpis) => kpis,
            Err(_) => return self.skip(SkipReason::InsufficientPeriods),
        };

        let percentage_mode = self.chart_type.is_percentage();
        let chart = if percentage_mode {
            normalize_to_shares(&absolute)
        } else {
            absolute
        };

        RenderOutcome::Ready(DashboardView {
            chart,
            percentage_mode,
            kpis,
        })
    }

    fn skip(&self, reason: SkipReason) -> RenderOutcome {
        debug!("Skipping render of '{}': {:?}", self.source_id, reason);
        RenderOutcome::Skipped(reason)
    }

    fn is_stale(&self, ticket: &LoadTicket) -> bool {
        ticket.generation != self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ALL;

    fn records(months: &[(&str, f64)]) -> Vec<RawRecord> {
        months
            .iter()
            .flat_map(|(date, value)| {
                vec![
                    RawRecord::new(date, "A", "TOTAL_EMPRESA", Some(*value)),
                    RawRecord::new(date, "A", "PREPAGO", Some(*value / 2.0)),
                    RawRecord::new(date, "TOTAL_MERCADO", "TOTAL_MERCADO", Some(*value)),
                ]
            })
            .collect()
    }

    fn session() -> DashboardSession {
        DashboardSession::new(DashboardConfig::default()).unwrap()
    }

    #[test]
    fn test_render_before_load_is_skipped() {
        assert_eq!(session().render(), RenderOutcome::Skipped(SkipReason::NotLoaded));
    }

    #[test]
    fn test_load_and_render() {
        let mut session = session();
        let ticket = session.begin_load().unwrap();
        assert_eq!(ticket.source_id, "servicios");

        let outcome =
            session.complete_load(&ticket, records(&[("2023-01-01", 100.0), ("2023-02-01", 150.0)]));
        assert!(matches!(outcome, LoadOutcome::Applied { rows_kept: 6, .. }));
        assert_eq!(session.catalog().unwrap().companies, vec!["A"]);

        match session.render() {
            RenderOutcome::Ready(view) => {
                assert!(!view.percentage_mode);
                assert_eq!(view.chart.series[0].name, "Total Market");
                assert_eq!(view.kpis.current_total, 150.0);
            }
            other => panic!("expected a view, got {:?}", other),
        }
    }

    #[test]
    fn test_percentage_mode_keeps_absolute_kpis() {
        let mut session = session();
        let ticket = session.begin_load().unwrap();
        session.complete_load(&ticket, records(&[("2023-01-01", 100.0), ("2023-02-01", 150.0)]));
        session.set_company(ALL);
        session.set_category("PREPAGO");
        session.set_chart_type(ChartType::StackedPercent);

        let RenderOutcome::Ready(view) = session.render() else {
            panic!("expected a view");
        };
        assert!(view.percentage_mode);
        assert_eq!(view.chart.series[0].points, vec![100.0, 100.0]);
        assert_eq!(view.kpis.current_total, 75.0);
        assert_eq!(view.kpis.month_over_month.delta, 25.0);
    }

    #[test]
    fn test_single_period_is_skipped() {
        let mut session = session();
        let ticket = session.begin_load().unwrap();
        session.complete_load(&ticket, records(&[("2023-01-01", 100.0)]));

        assert_eq!(
            session.render(),
            RenderOutcome::Skipped(SkipReason::InsufficientPeriods)
        );
    }

    #[test]
    fn test_empty_load_is_skipped() {
        let mut session = session();
        let ticket = session.begin_load().unwrap();
        session.complete_load(&ticket, Vec::new());

        assert_eq!(session.render(), RenderOutcome::Skipped(SkipReason::EmptyDataset));
    }

    #[test]
    fn test_stale_load_is_discarded() {
        let mut session = session();
        let first = session.begin_load().unwrap();
        let second = session.select_source("modalidad").unwrap().unwrap();

        let outcome = session.complete_load(&second, records(&[("2024-01-01", 1.0), ("2024-02-01", 2.0)]));
        assert!(matches!(outcome, LoadOutcome::Applied { .. }));

        let outcome = session.complete_load(&first, records(&[("2020-01-01", 9.0)]));
        assert_eq!(outcome, LoadOutcome::Stale);
        assert_eq!(session.store().unwrap().labels().len(), 2);
        assert!(session.fail_load(&first, "timeout").is_ok());
    }

    #[test]
    fn test_select_source_resets_selection() {
        let mut session = session();
        session.set_company("A");
        session.set_category("PREPAGO");

        assert!(session.select_source("servicios").unwrap().is_none());
        assert_eq!(session.selection().company, Scope::Only("A".to_string()));

        let ticket = session.select_source("modalidad").unwrap().unwrap();
        assert_eq!(ticket.location, "output/lineas_por_modalidad_fact.csv");
        assert_eq!(session.selection(), &FilterSelection::all());

        assert!(matches!(
            session.select_source("bogus"),
            Err(DashboardError::UnknownSource(_))
        ));
    }

    #[test]
    fn test_failed_load_keeps_previous_data() {
        let mut session = session();
        let ticket = session.begin_load().unwrap();
        session.complete_load(&ticket, records(&[("2023-01-01", 100.0), ("2023-02-01", 150.0)]));

        let retry = session.begin_load().unwrap();
        let err = session.fail_load(&retry, "404 Not Found").unwrap_err();
        assert!(matches!(err, DashboardError::LoadFailed { .. }));
        assert!(matches!(session.render(), RenderOutcome::Ready(_)));
    }

    #[test]
    fn test_view_schema_and_json() {
        let schema = DashboardView::json_schema().unwrap();
        assert!(schema.contains("percentage_mode"));
        assert!(schema.contains("year_over_year"));

        let mut session = session();
        let ticket = session.begin_load().unwrap();
        session.complete_load(&ticket, records(&[("2023-01-01", 100.0), ("2023-02-01", 150.0)]));
        let RenderOutcome::Ready(view) = session.render() else {
            panic!("expected a view");
        };
        let json = view.to_json().unwrap();
        assert!(json.contains("\"2023-02-01\""));
        assert!(json.contains("Total Market"));
    }
}
