//! Equal-width histograms shared by the evaluator and the signal extractor.

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, SelError};

/// Equal-width histogram descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// Bin edges (inclusive of the left edge, exclusive of the right edge except the last bin).
    pub edges: Vec<f64>,
    /// Counts recorded per bin.
    pub counts: Vec<u64>,
}

impl Histogram {
    /// Histograms `values` into `bins` equal-width bins over `[start, end]`.
    ///
    /// Values outside the range and non-finite values are dropped; a value
    /// equal to `end` lands in the last bin.
    pub fn with_range<I>(values: I, start: f64, end: f64, bins: usize) -> Result<Self, SelError>
    where
        I: IntoIterator<Item = f64>,
    {
        if bins == 0 {
            return Err(SelError::Config(ErrorInfo::new(
                "histogram-bins",
                "a histogram needs at least one bin",
            )));
        }
        if !(start.is_finite() && end.is_finite()) || end <= start {
            return Err(SelError::Config(
                ErrorInfo::new("histogram-range", "histogram range must be finite and increasing")
                    .with_context("start", start.to_string())
                    .with_context("end", end.to_string()),
            ));
        }
        let step = (end - start) / bins as f64;
        let mut edges: Vec<f64> = (0..bins).map(|idx| start + idx as f64 * step).collect();
        edges.push(end);

        let mut counts = vec![0u64; bins];
        for value in values {
            if !value.is_finite() || value < start || value > end {
                continue;
            }
            let mut bin = ((value - start) / step).floor() as usize;
            if bin >= bins {
                bin = bins - 1;
            }
            counts[bin] += 1;
        }
        Ok(Self { edges, counts })
    }

    /// Histograms `values` over their own finite min..max domain.
    ///
    /// A degenerate domain (single distinct value, or no finite values) is
    /// widened to `value ± 0.5`.
    pub fn from_values(values: &[f64], bins: usize) -> Result<Self, SelError> {
        let (lo, hi) = finite_domain(values).unwrap_or((0.0, 0.0));
        let (lo, hi) = if hi > lo { (lo, hi) } else { (lo - 0.5, hi + 0.5) };
        Self::with_range(values.iter().copied(), lo, hi, bins)
    }

    /// Number of bins.
    pub fn bins(&self) -> usize {
        self.counts.len()
    }

    /// Bin centres, one per bin.
    pub fn centers(&self) -> Vec<f64> {
        self.edges
            .windows(2)
            .map(|pair| 0.5 * (pair[0] + pair[1]))
            .collect()
    }

    /// Total number of entries across all bins.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Lower and upper edge of the histogram.
    pub fn range(&self) -> (f64, f64) {
        (self.edges[0], self.edges[self.edges.len() - 1])
    }
}

/// Returns the finite minimum and maximum of `values`, if any are finite.
pub fn finite_domain(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|value| value.is_finite())
        .fold(None, |acc, value| match acc {
            None => Some((value, value)),
            Some((lo, hi)) => Some((lo.min(value), hi.max(value))),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn right_edge_is_inclusive() {
        let hist = Histogram::with_range([0.0, 0.5, 1.0], 0.0, 1.0, 2).unwrap();
        assert_eq!(hist.counts, vec![1, 2]);
        assert_eq!(hist.edges, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn out_of_range_values_are_dropped() {
        let hist = Histogram::with_range([-1.0, 0.2, 2.0, f64::NAN], 0.0, 1.0, 4).unwrap();
        assert_eq!(hist.total(), 1);
    }

    #[test]
    fn own_domain_covers_every_value() {
        let values = [5200.0, 5250.5, 5281.0, 5399.9];
        let hist = Histogram::from_values(&values, 200).unwrap();
        assert_eq!(hist.total(), 4);
        assert_eq!(hist.range(), (5200.0, 5399.9));
        assert_eq!(hist.centers().len(), 200);
    }

    #[test]
    fn degenerate_domain_is_widened() {
        let hist = Histogram::from_values(&[3.0, 3.0], 10).unwrap();
        assert_eq!(hist.range(), (2.5, 3.5));
        assert_eq!(hist.total(), 2);
    }

    #[test]
    fn zero_bins_is_a_config_error() {
        assert!(matches!(
            Histogram::with_range([1.0], 0.0, 1.0, 0),
            Err(SelError::Config(_))
        ));
    }
}
