use crate::schema::Row;
use chrono::NaiveDate;
use log::debug;

/// Rows that survived bounding, plus the cutoff that was applied (if any).
#[derive(Debug, Clone, Default)]
pub struct BoundedRows {
    pub rows: Vec<Row>,
    pub cutoff: Option<NaiveDate>,
}

/// Trims trailing periods that carry no real market total yet.
pub struct DateBounder<'a> {
    market_total_category: &'a str,
}

impl<'a> DateBounder<'a> {
    pub fn new(market_total_category: &'a str) -> Self {
        Self {
            market_total_category,
        }
    }

    /// Last date at which the market total is strictly positive.
    pub fn find_cutoff(&self, rows: &[Row]) -> Option<NaiveDate> {
        rows.iter()
            .filter(|r| r.category == self.market_total_category)
            .filter(|r| r.value.is_some_and(|v| v > 0.0))
            .map(|r| r.date)
            .max()
    }

    pub fn bound(&self, rows: Vec<Row>) -> BoundedRows {
        let cutoff = self.find_cutoff(&rows);
        let input_len = rows.len();

        let rows: Vec<Row> = match cutoff {
            Some(cutoff) => rows.into_iter().filter(|r| r.date <= cutoff).collect(),
            None => rows.into_iter().filter(Row::has_value).collect(),
        };

        match cutoff {
            Some(cutoff) => debug!(
                "Bounded dataset at {}: kept {} of {} rows",
                cutoff,
                rows.len(),
                input_len
            ),
            None => debug!(
                "No positive '{}' rows; kept {} of {} rows with values",
                self.market_total_category,
                rows.len(),
                input_len
            ),
        }

        BoundedRows { rows, cutoff }
    }
}

pub fn bound_rows(rows: Vec<Row>, market_total_category: &str) -> BoundedRows {
    DateBounder::new(market_total_category).bound(rows)
}
