use crate::config::DashboardConfig;
use crate::schema::ALL;
use crate::store::RecordStore;
use serde::{Deserialize, Serialize};

/// Selectable company and category identifiers for the current dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCatalog {
    pub companies: Vec<String>,
    pub categories: Vec<String>,
}

impl FilterCatalog {
    pub fn from_store(store: &RecordStore, config: &DashboardConfig) -> Self {
        // The store yields identifiers already sorted and distinct.
        let companies = store
            .companies()
            .filter(|c| !c.is_empty() && *c != config.market_total_company)
            .map(str::to_string)
            .collect();

        let categories = store
            .categories()
            .filter(|c| !c.is_empty() && !config.is_hidden_category(c))
            .map(str::to_string)
            .collect();

        Self {
            companies,
            categories,
        }
    }

    /// Company options with the `ALL` sentinel first.
    pub fn company_options(&self) -> Vec<String> {
        with_all(&self.companies)
    }

    /// Category options with the `ALL` sentinel first.
    pub fn category_options(&self) -> Vec<String> {
        with_all(&self.categories)
    }

    pub fn has_company(&self, company: &str) -> bool {
        self.companies.iter().any(|c| c == company)
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }
}

fn with_all(ids: &[String]) -> Vec<String> {
    std::iter::once(ALL.to_string())
        .chain(ids.iter().cloned())
        .collect()
}
