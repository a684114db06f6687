//! Repeats the extraction over several thresholds to measure efficiencies on data.

use sel_core::errors::{ErrorInfo, SelError};
use sel_core::histogram::finite_domain;
use serde::{Deserialize, Serialize};

use crate::extract::{extract, ExtractionOpts};
use crate::lm::Fitter;

/// Extraction outcome at one threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanPoint {
    /// Score threshold.
    pub threshold: f64,
    /// Rows kept at this threshold.
    pub kept: usize,
    /// Fitted signal yield.
    pub signal_yield: Option<f64>,
    /// Fitted background yield.
    pub background_yield: Option<f64>,
    /// Signal yield relative to the loosest threshold.
    pub signal_efficiency: Option<f64>,
    /// Background yield relative to the loosest threshold.
    pub background_efficiency: Option<f64>,
    /// Whether the fit at this threshold is trustworthy.
    pub trusted: bool,
    /// Fit failure message when no fit could be made.
    pub failure: Option<String>,
}

/// Efficiency curve measured on the signal region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdScan {
    /// Loosest threshold; efficiencies are relative to it.
    pub reference_threshold: f64,
    /// Mass range shared by every histogram of the scan.
    pub mass_range: [f64; 2],
    /// One point per threshold, ascending.
    pub points: Vec<ScanPoint>,
}

fn ratio(value: Option<f64>, reference: Option<f64>) -> Option<f64> {
    match (value, reference) {
        (Some(value), Some(reference)) if reference > 0.0 => Some(value / reference),
        _ => None,
    }
}

/// Runs [`extract`] at every threshold on a common mass binning.
///
/// Fit failures at individual thresholds are recorded on their point; any
/// other error aborts the scan.
pub fn scan_thresholds(
    scores: &[f64],
    mass: &[f64],
    thresholds: &[f64],
    opts: &ExtractionOpts,
    fitter: &dyn Fitter,
) -> Result<ThresholdScan, SelError> {
    let mut ordered: Vec<f64> = thresholds.to_vec();
    ordered.sort_by(f64::total_cmp);
    ordered.dedup();
    let Some(reference_threshold) = ordered.first().copied() else {
        return Err(SelError::Config(ErrorInfo::new(
            "empty-scan",
            "threshold scan needs at least one threshold",
        )));
    };
    let mass_range = match opts.mass_range {
        Some(range) => range,
        None => {
            let (low, high) = finite_domain(mass).ok_or_else(|| {
                SelError::Fit(ErrorInfo::new("empty-mass", "no finite mass values to scan"))
            })?;
            if high > low {
                [low, high]
            } else {
                [low - 0.5, high + 0.5]
            }
        }
    };

    let mut points = Vec::with_capacity(ordered.len());
    for threshold in ordered {
        let point_opts = ExtractionOpts {
            threshold,
            mass_range: Some(mass_range),
            ..opts.clone()
        };
        let point = match extract(scores, mass, &point_opts, fitter) {
            Ok(extraction) => ScanPoint {
                threshold,
                kept: extraction.kept,
                signal_yield: Some(extraction.signal_yield),
                background_yield: Some(extraction.background_yield),
                signal_efficiency: None,
                background_efficiency: None,
                trusted: extraction.trusted,
                failure: None,
            },
            Err(SelError::Fit(info)) => ScanPoint {
                threshold,
                kept: scores.iter().filter(|score| **score >= threshold).count(),
                signal_yield: None,
                background_yield: None,
                signal_efficiency: None,
                background_efficiency: None,
                trusted: false,
                failure: Some(info.message),
            },
            Err(other) => return Err(other),
        };
        tracing::info!(
            threshold,
            kept = point.kept,
            signal_yield = ?point.signal_yield,
            "scan point"
        );
        points.push(point);
    }

    let (signal_ref, background_ref) = (points[0].signal_yield, points[0].background_yield);
    for point in &mut points {
        point.signal_efficiency = ratio(point.signal_yield, signal_ref);
        point.background_efficiency = ratio(point.background_yield, background_ref);
    }

    Ok(ThresholdScan {
        reference_threshold,
        mass_range,
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lm::LevenbergMarquardt;

    #[test]
    fn empty_threshold_list_is_a_config_error() {
        let err = scan_thresholds(
            &[0.5],
            &[5280.0],
            &[],
            &ExtractionOpts::default(),
            &LevenbergMarquardt::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SelError::Config(_)));
    }

    #[test]
    fn failed_fits_are_recorded_not_raised() {
        let mass: Vec<f64> = (0..400).map(|i| 5000.0 + i as f64 * 1.5).collect();
        let scores = vec![0.3; mass.len()];
        let scan = scan_thresholds(
            &scores,
            &mass,
            &[0.9, 0.5],
            &ExtractionOpts::default(),
            &LevenbergMarquardt::default(),
        )
        .unwrap();
        assert_eq!(scan.reference_threshold, 0.5);
        assert_eq!(scan.points.len(), 2);
        assert!(scan.points.iter().all(|point| point.failure.is_some()));
        assert!(scan.points.iter().all(|point| point.signal_efficiency.is_none()));
    }

    #[test]
    fn single_valued_mass_is_widened() {
        let mass = vec![5280.0; 50];
        let scores = vec![0.95; mass.len()];
        let scan = scan_thresholds(
            &scores,
            &mass,
            &[0.8],
            &ExtractionOpts::default(),
            &LevenbergMarquardt::default(),
        )
        .unwrap();
        assert_eq!(scan.mass_range, [5279.5, 5280.5]);
        assert_eq!(scan.points.len(), 1);
        assert_eq!(scan.points[0].kept, 50);
        assert!(scan.points[0].failure.is_some());
    }
}
