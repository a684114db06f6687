//! Contiguous bin window the fit is restricted to.

use sel_core::errors::{ErrorInfo, SelError};
use sel_core::Histogram;
use serde::{Deserialize, Serialize};

use crate::model::BinnedData;

/// Half-open bin range `[first_bin, end_bin)` of the full histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitWindow {
    /// First bin inside the window.
    pub first_bin: usize,
    /// First bin past the window.
    pub end_bin: usize,
}

impl Default for FitWindow {
    fn default() -> Self {
        Self {
            first_bin: 65,
            end_bin: 195,
        }
    }
}

impl FitWindow {
    /// Number of bins in the window.
    pub fn len(&self) -> usize {
        self.end_bin.saturating_sub(self.first_bin)
    }

    /// True for an empty window.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks the window is non-empty and fits inside `bins`.
    pub fn validate(&self, bins: usize) -> Result<(), SelError> {
        if self.first_bin >= self.end_bin || self.end_bin > bins {
            return Err(SelError::Config(
                ErrorInfo::new(
                    "fit-window",
                    "fit window must be a non-empty range inside the histogram",
                )
                    .with_context("first_bin", self.first_bin.to_string())
                    .with_context("end_bin", self.end_bin.to_string())
                    .with_context("bins", bins.to_string()),
            ));
        }
        Ok(())
    }

    /// Bin centres of every bin in the window.
    pub fn centres(&self, histogram: &Histogram) -> Vec<f64> {
        histogram.centers()[self.first_bin..self.end_bin].to_vec()
    }

    /// Fit points with Poisson uncertainties, plus the indices of zero-count bins left out.
    pub fn points(&self, histogram: &Histogram) -> (BinnedData, Vec<usize>) {
        let centres = histogram.centers();
        let mut data = BinnedData::default();
        let mut excluded = Vec::new();
        for bin in self.first_bin..self.end_bin {
            let count = histogram.counts[bin];
            if count == 0 {
                excluded.push(bin);
                continue;
            }
            let count = count as f64;
            data.x.push(centres[bin]);
            data.y.push(count);
            data.sigma.push(count.sqrt());
        }
        (data, excluded)
    }
}
