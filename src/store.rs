use crate::schema::Row;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap};

type CategoryValues = HashMap<String, f64>;
type CompanyValues = HashMap<String, CategoryValues>;

/// The bounded dataset of a session, indexed by (date, company, category).
///
/// The index keeps the first loaded row with a present value for each key, so
/// duplicates resolve the same way a front-to-back scan would.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    rows: Vec<Row>,
    labels: Vec<NaiveDate>,
    index: BTreeMap<NaiveDate, CompanyValues>,
    by_category: BTreeMap<NaiveDate, CategoryValues>,
    companies: BTreeSet<String>,
    categories: BTreeSet<String>,
}

impl RecordStore {
    pub fn new(rows: Vec<Row>) -> Self {
        let mut index: BTreeMap<NaiveDate, CompanyValues> = BTreeMap::new();
        let mut by_category: BTreeMap<NaiveDate, CategoryValues> = BTreeMap::new();
        let mut dates = BTreeSet::new();
        let mut companies = BTreeSet::new();
        let mut categories = BTreeSet::new();

        for row in &rows {
            dates.insert(row.date);
            companies.insert(row.company.clone());
            categories.insert(row.category.clone());

            if let Some(value) = row.value {
                index
                    .entry(row.date)
                    .or_default()
                    .entry(row.company.clone())
                    .or_default()
                    .entry(row.category.clone())
                    .or_insert(value);
                by_category
                    .entry(row.date)
                    .or_default()
                    .entry(row.category.clone())
                    .or_insert(value);
            }
        }

        Self {
            rows,
            labels: dates.into_iter().collect(),
            index,
            by_category,
            companies,
            categories,
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct dates of the whole dataset, ascending.
    pub fn labels(&self) -> &[NaiveDate] {
        &self.labels
    }

    /// Distinct company identifiers, ascending.
    pub fn companies(&self) -> impl Iterator<Item = &str> {
        self.companies.iter().map(String::as_str)
    }

    /// Distinct category identifiers, ascending.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(String::as_str)
    }

    pub fn value(&self, date: NaiveDate, company: &str, category: &str) -> Option<f64> {
        self.index
            .get(&date)?
            .get(company)?
            .get(category)
            .copied()
    }

    pub fn value_or_zero(&self, date: NaiveDate, company: &str, category: &str) -> f64 {
        self.value(date, company, category).unwrap_or(0.0)
    }

    /// Value of `category` at `date` filed under any company, first loaded row first.
    pub fn category_value(&self, date: NaiveDate, category: &str) -> Option<f64> {
        self.by_category.get(&date)?.get(category).copied()
    }
}
