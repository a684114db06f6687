//! Per-column overviews used to inspect a record set before training.

use sel_core::errors::SelError;
use sel_core::Histogram;
use serde::{Deserialize, Serialize};

use crate::record::RecordSet;

/// Transform applied to a column before summarising it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    /// Values as stored.
    #[default]
    Identity,
    /// Natural logarithm; non-positive values are dropped.
    Log,
}

impl Transform {
    fn apply(self, value: f64) -> f64 {
        match self {
            Transform::Identity => value,
            Transform::Log if value > 0.0 => value.ln(),
            Transform::Log => f64::NAN,
        }
    }
}

/// Quantile summary for a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantiles {
    /// 5th percentile estimate.
    pub q05: f64,
    /// Median (50th percentile) estimate.
    pub q50: f64,
    /// 95th percentile estimate.
    pub q95: f64,
}

/// Descriptive statistics of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    /// Column name.
    pub name: String,
    /// Transform applied before summarising.
    pub transform: Transform,
    /// Number of finite values after the transform.
    pub count: usize,
    /// Smallest finite value.
    pub min: f64,
    /// Largest finite value.
    pub max: f64,
    /// Arithmetic mean.
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
    /// Quantile summary.
    pub quantiles: Quantiles,
    /// Equal-width histogram over the finite domain.
    pub histogram: Histogram,
}

/// Column listing of a record set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetOverview {
    /// Source name.
    pub source: String,
    /// Number of rows.
    pub rows: usize,
    /// Column names in file order.
    pub columns: Vec<String>,
}

/// Lists the columns of `set`.
pub fn overview(set: &RecordSet) -> DatasetOverview {
    DatasetOverview {
        source: set.name().to_string(),
        rows: set.n_rows(),
        columns: set.column_names().to_vec(),
    }
}

/// Summarises one column of `set`.
pub fn summarize_column(
    set: &RecordSet,
    column: &str,
    bins: usize,
    transform: Transform,
) -> Result<ColumnSummary, SelError> {
    let mut values: Vec<f64> = set
        .column(column)?
        .iter()
        .map(|value| transform.apply(*value))
        .filter(|value| value.is_finite())
        .collect();
    let histogram = Histogram::from_values(&values, bins)?;
    values.sort_by(|a, b| a.total_cmp(b));

    let count = values.len();
    let (mean, std) = if count == 0 {
        (f64::NAN, f64::NAN)
    } else {
        let mean = values.iter().sum::<f64>() / count as f64;
        let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / count as f64;
        (mean, var.sqrt())
    };

    Ok(ColumnSummary {
        name: column.to_string(),
        transform,
        count,
        min: values.first().copied().unwrap_or(f64::NAN),
        max: values.last().copied().unwrap_or(f64::NAN),
        mean,
        std,
        quantiles: Quantiles {
            q05: percentile(&values, 0.05),
            q50: percentile(&values, 0.5),
            q95: percentile(&values, 0.95),
        },
        histogram,
    })
}

fn percentile(sorted: &[f64], quantile: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let position = quantile * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let weight = position - lower as f64;
        sorted[lower] * (1.0 - weight) + sorted[upper] * weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RecordSet {
        RecordSet::new(
            "data",
            vec![
                ("B0_PT".into(), vec![1.0, 2.0, 3.0, 4.0, 5.0]),
                ("B0_FDCHI2_OWNPV".into(), vec![1.0, std::f64::consts::E, 0.0, -1.0, 1.0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn identity_summary_matches_hand_values() {
        let summary = summarize_column(&sample(), "B0_PT", 4, Transform::Identity).unwrap();
        assert_eq!(summary.count, 5);
        assert_eq!(summary.mean, 3.0);
        assert_eq!(summary.quantiles.q50, 3.0);
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.max, 5.0);
        assert_eq!(summary.histogram.total(), 5);
    }

    #[test]
    fn log_transform_drops_non_positive_values() {
        let summary =
            summarize_column(&sample(), "B0_FDCHI2_OWNPV", 10, Transform::Log).unwrap();
        assert_eq!(summary.count, 3);
        assert!((summary.max - 1.0).abs() < 1e-12);
        assert_eq!(summary.min, 0.0);
    }

    #[test]
    fn overview_lists_columns_in_file_order() {
        let listing = overview(&sample());
        assert_eq!(listing.columns, vec!["B0_PT", "B0_FDCHI2_OWNPV"]);
        assert_eq!(listing.rows, 5);
    }
}
