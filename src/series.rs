use crate::config::DashboardConfig;
use crate::schema::{ChartData, FilterSelection, Scope, Series};
use crate::store::RecordStore;
use chrono::NaiveDate;
use log::debug;

/// What a filter selection asks to see. Each variant has its own series contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario<'a> {
    /// ALL/ALL: a single whole-market series.
    MarketTotal,
    /// ALL/<category>: one series per company for that category.
    CategoryByCompany { category: &'a str },
    /// <company>/ALL: the company's declared total.
    CompanyTotal { company: &'a str },
    /// <company>/<category>: a single cell series.
    CompanyCategory { company: &'a str, category: &'a str },
}

impl<'a> Scenario<'a> {
    pub fn from_selection(selection: &'a FilterSelection) -> Self {
        match (&selection.company, &selection.category) {
            (Scope::All, Scope::All) => Scenario::MarketTotal,
            (Scope::All, Scope::Only(category)) => Scenario::CategoryByCompany { category },
            (Scope::Only(company), Scope::All) => Scenario::CompanyTotal { company },
            (Scope::Only(company), Scope::Only(category)) => {
                Scenario::CompanyCategory { company, category }
            }
        }
    }
}

pub struct SeriesBuilder<'a> {
    store: &'a RecordStore,
    config: &'a DashboardConfig,
}

impl<'a> SeriesBuilder<'a> {
    pub fn new(store: &'a RecordStore, config: &'a DashboardConfig) -> Self {
        Self { store, config }
    }

    pub fn build(&self, selection: &FilterSelection) -> ChartData {
        let scenario = Scenario::from_selection(selection);
        debug!("Building chart series for {:?}", scenario);
        self.build_scenario(scenario)
    }

    pub fn build_scenario(&self, scenario: Scenario<'_>) -> ChartData {
        let labels = self.store.labels().to_vec();

        let series = match scenario {
            Scenario::MarketTotal => vec![self.market_total(&labels)],
            Scenario::CategoryByCompany { category } => self.category_by_company(&labels, category),
            Scenario::CompanyTotal { company } => vec![self.single(
                &labels,
                format!("{} (Total)", company),
                company,
                &self.config.company_total_category,
            )],
            Scenario::CompanyCategory { company, category } => vec![self.single(
                &labels,
                format!("{} - {}", company, category),
                company,
                category,
            )],
        };

        ChartData { labels, series }
    }

    fn market_total(&self, labels: &[NaiveDate]) -> Series {
        let companies = self.companies();

        let points = labels
            .iter()
            .map(|&date| {
                self.store
                    .category_value(date, &self.config.market_total_category)
                    .unwrap_or_else(|| {
                        companies
                            .iter()
                            .map(|c| {
                                self.store.value_or_zero(
                                    date,
                                    c,
                                    &self.config.company_total_category,
                                )
                            })
                            .sum()
                    })
            })
            .collect();

        Series {
            name: self.config.market_series_label.clone(),
            order: 0,
            points,
        }
    }

    fn category_by_company(&self, labels: &[NaiveDate], category: &str) -> Vec<Series> {
        self.companies()
            .into_iter()
            .enumerate()
            .map(|(order, company)| Series {
                name: company.to_string(),
                order,
                points: self.points(labels, company, category),
            })
            .collect()
    }

    fn single(&self, labels: &[NaiveDate], name: String, company: &str, category: &str) -> Series {
        Series {
            name,
            order: 0,
            points: self.points(labels, company, category),
        }
    }

    fn points(&self, labels: &[NaiveDate], company: &str, category: &str) -> Vec<f64> {
        labels
            .iter()
            .map(|&date| self.store.value_or_zero(date, company, category))
            .collect()
    }

    fn companies(&self) -> Vec<&'a str> {
        self.store
            .companies()
            .filter(|c| *c != self.config.market_total_company)
            .collect()
    }
}

pub fn build_chart_data(
    store: &RecordStore,
    config: &DashboardConfig,
    selection: &FilterSelection,
) -> ChartData {
    SeriesBuilder::new(store, config).build(selection)
}
