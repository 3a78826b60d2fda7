use crate::error::{DashboardError, Result};
use crate::schema::ChartData;

/// Rescales every date column to percentage shares of that column's total.
///
/// Columns whose total is not positive become all zeros. Running this on data
/// that was already normalized is not meaningful; normalize a fresh copy of the
/// absolute series once per render.
pub fn normalize_to_shares(chart: &ChartData) -> ChartData {
    let totals: Vec<f64> = (0..chart.labels.len())
        .map(|i| chart.column_total(i))
        .collect();

    let mut normalized = chart.clone();
    for series in &mut normalized.series {
        for (i, point) in series.points.iter_mut().enumerate() {
            let total = totals.get(i).copied().unwrap_or(0.0);
            *point = if total > 0.0 {
                *point / total * 100.0
            } else {
                0.0
            };
        }
    }

    normalized
}

/// Checks that every column of a normalized chart sums to 100 (relative `tolerance`)
/// or is entirely zero.
pub fn verify_shares(chart: &ChartData, tolerance: f64) -> Result<()> {
    for (i, date) in chart.labels.iter().enumerate() {
        let total = chart.column_total(i);
        let all_zero = chart.series.iter().all(|s| s.at(i) == 0.0);

        if all_zero {
            continue;
        }

        if ((total - 100.0) / 100.0).abs() > tolerance {
            return Err(DashboardError::ShareTotalViolation { date: *date, total });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Series;
    use chrono::NaiveDate;

    fn chart(points: Vec<Vec<f64>>) -> ChartData {
        let len = points.first().map(Vec::len).unwrap_or(0);
        ChartData {
            labels: (0..len)
                .map(|i| NaiveDate::from_ymd_opt(2023, i as u32 + 1, 1).unwrap())
                .collect(),
            series: points
                .into_iter()
                .enumerate()
                .map(|(order, points)| Series {
                    name: format!("S{}", order),
                    order,
                    points,
                })
                .collect(),
        }
    }

    #[test]
    fn test_shares_per_date() {
        let absolute = chart(vec![vec![30.0, 0.0], vec![10.0, 0.0]]);
        let shares = normalize_to_shares(&absolute);

        assert_eq!(shares.series[0].points, vec![75.0, 0.0]);
        assert_eq!(shares.series[1].points, vec![25.0, 0.0]);
        assert!(verify_shares(&shares, 1e-9).is_ok());
        // input is left untouched
        assert_eq!(absolute.series[0].points, vec![30.0, 0.0]);
    }

    #[test]
    fn test_shares_sum_to_hundred() {
        let absolute = chart(vec![
            vec![1.0, 3.0, 7.0],
            vec![2.0, 3.0, 11.0],
            vec![4.0, 3.0, 13.0],
        ]);
        let shares = normalize_to_shares(&absolute);

        for i in 0..3 {
            assert!((shares.column_total(i) - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_verify_detects_unnormalized_columns() {
        let absolute = chart(vec![vec![30.0], vec![10.0]]);
        let result = verify_shares(&absolute, 1e-9);
        assert!(matches!(
            result,
            Err(DashboardError::ShareTotalViolation { total, .. }) if total == 40.0
        ));
    }

    #[test]
    fn test_empty_chart() {
        let shares = normalize_to_shares(&ChartData::default());
        assert!(shares.is_empty());
        assert!(verify_shares(&shares, 1e-9).is_ok());
    }
}
