//! Threshold selection, mass histogramming and the signal-yield fit.

use sel_core::errors::{ErrorInfo, SelError};
use sel_core::Histogram;
use serde::{Deserialize, Serialize};

use crate::lm::{FitResult, Fitter, SolverOpts};
use crate::model::{ExpGaussModel, FitModel, FitSeeds};
use crate::window::FitWindow;

/// Signal extractor settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionOpts {
    /// Rows with `score >= threshold` are kept.
    pub threshold: f64,
    /// Number of equal-width mass bins.
    pub bins: usize,
    /// Histogram range; the kept masses' own domain when absent.
    pub mass_range: Option<[f64; 2]>,
    /// Bins the fit is restricted to.
    pub fit_window: FitWindow,
    /// Starting values of the model parameters.
    pub seeds: FitSeeds,
    /// Solver stopping rules.
    pub solver: SolverOpts,
}

impl Default for ExtractionOpts {
    fn default() -> Self {
        Self {
            threshold: 0.8,
            bins: 200,
            mass_range: None,
            fit_window: FitWindow::default(),
            seeds: FitSeeds::default(),
            solver: SolverOpts::default(),
        }
    }
}

impl ExtractionOpts {
    /// Checks threshold, binning, window, seeds and solver settings.
    pub fn validate(&self) -> Result<(), SelError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(SelError::Config(
                ErrorInfo::new("threshold", "score threshold must lie in [0, 1]")
                    .with_context("threshold", self.threshold.to_string()),
            ));
        }
        if self.bins == 0 {
            return Err(SelError::Config(ErrorInfo::new(
                "histogram-bins",
                "a histogram needs at least one bin",
            )));
        }
        if let Some([low, high]) = self.mass_range {
            if !(low.is_finite() && high.is_finite() && low < high) {
                return Err(SelError::Config(
                    ErrorInfo::new("mass-range", "mass range must be finite and increasing")
                        .with_context("low", low.to_string())
                        .with_context("high", high.to_string()),
                ));
            }
        }
        if !(self.seeds.width.is_finite() && self.seeds.width != 0.0)
            || !self.seeds.mean.is_finite()
            || !self.seeds.k.is_finite()
            || !self.seeds.norm_scale.is_finite()
        {
            return Err(SelError::Config(
                ErrorInfo::new("fit-seeds", "fit seeds must be finite and the width non-zero")
                    .with_context("width", self.seeds.width.to_string()),
            ));
        }
        self.fit_window.validate(self.bins)?;
        self.solver.validate()
    }
}

/// Keep flag per row: `score >= threshold`.
pub fn kept_mask(scores: &[f64], threshold: f64) -> Vec<bool> {
    scores.iter().map(|score| *score >= threshold).collect()
}

/// Sum of the Gaussian component over `centres`.
pub fn signal_yield(values: &[f64], centres: &[f64]) -> f64 {
    centres
        .iter()
        .map(|x| ExpGaussModel::signal(values, *x))
        .sum()
}

/// Sum of the exponential component over `centres`.
pub fn background_yield(values: &[f64], centres: &[f64]) -> f64 {
    centres
        .iter()
        .map(|x| ExpGaussModel::background(values, *x))
        .sum()
}

/// Standard error of [`signal_yield`] from the fit covariance, `sqrt(gᵀ C g)`.
pub fn signal_yield_uncertainty(fit: &FitResult, centres: &[f64]) -> Option<f64> {
    let values = fit.params.values();
    let (mean, width, norm) = (
        values[ExpGaussModel::MEAN],
        values[ExpGaussModel::WIDTH],
        values[ExpGaussModel::NORM],
    );
    let mut gradient = vec![0.0; values.len()];
    for x in centres {
        let delta = x - mean;
        let shape = (-delta * delta / (2.0 * width * width)).exp();
        gradient[ExpGaussModel::NORM] += shape;
        gradient[ExpGaussModel::WIDTH] += norm * shape * delta * delta / width.powi(3);
        gradient[ExpGaussModel::MEAN] += norm * shape * delta / (width * width);
    }
    let free = fit.params.free_indices();
    let mut variance = 0.0;
    for i in &free {
        for j in &free {
            variance += gradient[*i] * fit.covariance(*i, *j)? * gradient[*j];
        }
    }
    (variance.is_finite() && variance >= 0.0).then(|| variance.sqrt())
}

/// Outcome of one signal extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalExtraction {
    /// Threshold that was applied.
    pub threshold: f64,
    /// Rows passing the threshold.
    pub kept: usize,
    /// Rows failing the threshold.
    pub rejected: usize,
    /// Mass histogram of every signal-region row over the full mass domain.
    pub all_events: Histogram,
    /// Mass histogram of the kept rows.
    pub kept_events: Histogram,
    /// Bins the fit used.
    pub window: FitWindow,
    /// Zero-count window bins left out of the fit.
    pub excluded_bins: Vec<usize>,
    /// Best-fit parameters and diagnostics.
    pub fit: FitResult,
    /// Fitted model at every window bin centre.
    pub best_fit: Vec<f64>,
    /// Integrated Gaussian component over the window.
    pub signal_yield: f64,
    /// Propagated uncertainty on [`SignalExtraction::signal_yield`].
    pub signal_yield_uncertainty: Option<f64>,
    /// Integrated exponential component over the window.
    pub background_yield: f64,
    /// Whether the fit converged to finite values with a usable covariance.
    pub trusted: bool,
}

impl SignalExtraction {
    /// Window bin centres.
    pub fn window_centres(&self) -> Vec<f64> {
        self.window.centres(&self.kept_events)
    }
}

fn is_trusted(fit: &FitResult, signal_yield: f64) -> bool {
    let values = fit.params.values();
    fit.diagnostics.converged
        && fit.diagnostics.covariance.is_some()
        && values.iter().all(|value| value.is_finite())
        && values[ExpGaussModel::NORM] > 0.0
        && values[ExpGaussModel::WIDTH] != 0.0
        && fit.params.iter().all(|param| param.stderr.map_or(true, f64::is_finite))
        && signal_yield.is_finite()
}

/// Selects rows by score, histograms their mass and fits the exponential+Gaussian model.
pub fn extract(
    scores: &[f64],
    mass: &[f64],
    opts: &ExtractionOpts,
    fitter: &dyn Fitter,
) -> Result<SignalExtraction, SelError> {
    opts.validate()?;
    if scores.len() != mass.len() {
        return Err(SelError::Shape(
            ErrorInfo::new("mass-count", "scores and mass values differ in length")
                .with_context("scores", scores.len().to_string())
                .with_context("mass", mass.len().to_string()),
        ));
    }
    let mask = kept_mask(scores, opts.threshold);
    let kept_mass: Vec<f64> = mass
        .iter()
        .zip(&mask)
        .filter(|(_, keep)| **keep)
        .map(|(value, _)| *value)
        .collect();
    if kept_mass.is_empty() {
        return Err(SelError::Fit(
            ErrorInfo::new("no-kept-events", "no signal-region row passes the threshold")
                .with_context("threshold", opts.threshold.to_string())
                .with_hint("lower the threshold"),
        ));
    }

    let (kept_events, all_events) = match opts.mass_range {
        Some([low, high]) => (
            Histogram::with_range(kept_mass.iter().copied(), low, high, opts.bins)?,
            Histogram::with_range(mass.iter().copied(), low, high, opts.bins)?,
        ),
        None => (
            Histogram::from_values(&kept_mass, opts.bins)?,
            Histogram::from_values(mass, opts.bins)?,
        ),
    };

    let window = opts.fit_window;
    let (data, excluded_bins) = window.points(&kept_events);
    if !excluded_bins.is_empty() {
        tracing::warn!(excluded = excluded_bins.len(), "zero-count bins left out of the fit");
    }
    if data.is_empty() {
        return Err(SelError::Fit(
            ErrorInfo::new("empty-fit-window", "every bin in the fit window is empty")
                .with_context("first_bin", window.first_bin.to_string())
                .with_context("end_bin", window.end_bin.to_string()),
        ));
    }

    let model = ExpGaussModel;
    let first_count = kept_events.counts[window.first_bin] as f64;
    let seeds = ExpGaussModel::seed_parameters(&opts.seeds, first_count);
    let fit = fitter.fit(&model, &seeds, &data)?;

    let centres = window.centres(&kept_events);
    let values = fit.params.values();
    let best_fit = centres.iter().map(|x| model.eval(&values, *x)).collect();
    let signal = signal_yield(&values, &centres);
    let background = background_yield(&values, &centres);
    let uncertainty = signal_yield_uncertainty(&fit, &centres);
    let trusted = is_trusted(&fit, signal);

    if trusted {
        tracing::info!(
            threshold = opts.threshold,
            kept = kept_mass.len(),
            signal_yield = signal,
            chisqr = fit.diagnostics.chisqr,
            "signal extracted"
        );
    } else {
        tracing::warn!(
            threshold = opts.threshold,
            message = %fit.diagnostics.message,
            "fit is not trustworthy"
        );
    }

    Ok(SignalExtraction {
        threshold: opts.threshold,
        kept: kept_mass.len(),
        rejected: mass.len() - kept_mass.len(),
        all_events,
        kept_events,
        window,
        excluded_bins,
        fit,
        best_fit,
        signal_yield: signal,
        signal_yield_uncertainty: uncertainty,
        background_yield: background,
        trusted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lm::LevenbergMarquardt;

    const TRUTH: [f64; 5] = [40.0, 0.002, 5280.0, 20.0, 120.0];

    /// One mass value per expected event, placed at each bin centre of 200 bins over [5000, 5600].
    fn peaked_sample() -> (Vec<f64>, Vec<f64>) {
        let model = ExpGaussModel;
        let mut mass = Vec::new();
        for bin in 0..200 {
            let centre = 5000.0 + 3.0 * (bin as f64 + 0.5);
            let count = model.eval(&TRUTH, centre).round() as usize;
            mass.extend(std::iter::repeat(centre).take(count));
        }
        let mut scores = vec![0.95; mass.len()];
        for idx in 0..50 {
            mass.push(5000.0 + 10.0 * idx as f64);
            scores.push(0.1);
        }
        (scores, mass)
    }

    fn opts() -> ExtractionOpts {
        ExtractionOpts {
            mass_range: Some([5000.0, 5600.0]),
            ..ExtractionOpts::default()
        }
    }

    #[test]
    fn threshold_mask() {
        assert_eq!(
            kept_mask(&[0.2, 0.9, 0.95, 0.5], 0.8),
            vec![false, true, true, false]
        );
    }

    #[test]
    fn recovers_the_injected_peak() {
        let (scores, mass) = peaked_sample();
        let result = extract(&scores, &mass, &opts(), &LevenbergMarquardt::default()).unwrap();
        assert_eq!(result.rejected, 50);
        assert!(result.trusted, "{}", result.fit.diagnostics.message);
        assert!(result.excluded_bins.is_empty());

        let centres = result.window_centres();
        let expected = signal_yield(&TRUTH, &centres);
        assert!((result.signal_yield - expected).abs() / expected < 0.03);
        assert!((result.fit.params.value("width").unwrap().abs() - 20.0).abs() < 1.0);
        assert_eq!(result.fit.params.value("mean").unwrap(), 5280.0);
        let sigma = result.signal_yield_uncertainty.unwrap();
        assert!(sigma > 0.0 && sigma < result.signal_yield);
        assert_eq!(result.best_fit.len(), 130);
        assert_eq!(result.all_events.total(), mass.len() as u64);
        assert_eq!(result.kept_events.total(), result.kept as u64);
    }

    #[test]
    fn no_selection_histogram_covers_rejected_tails() {
        let (mut scores, mut mass) = peaked_sample();
        for value in [4000.0, 4500.0, 6500.0, 7000.0] {
            mass.push(value);
            scores.push(0.1);
        }
        let opts = ExtractionOpts::default();
        let result = extract(&scores, &mass, &opts, &LevenbergMarquardt::default()).unwrap();
        assert_eq!(result.all_events.total(), mass.len() as u64);
        assert_eq!(result.all_events.range(), (4000.0, 7000.0));
        assert_eq!(result.kept_events.total(), result.kept as u64);
        assert!(result.kept_events.range().1 <= 5600.0);
    }

    #[test]
    fn nothing_kept_is_a_fit_error() {
        let err = extract(&[0.1, 0.2], &[5200.0, 5300.0], &opts(), &LevenbergMarquardt::default())
            .unwrap_err();
        assert_eq!(err.info().code, "no-kept-events");
    }

    #[test]
    fn empty_window_is_a_fit_error() {
        let mass = vec![5001.0; 20];
        let scores = vec![0.9; 20];
        let err = extract(&scores, &mass, &opts(), &LevenbergMarquardt::default()).unwrap_err();
        assert_eq!(err.info().code, "empty-fit-window");
    }

    #[test]
    fn mismatched_lengths_are_shape_errors() {
        let err = extract(&[0.9], &[], &opts(), &LevenbergMarquardt::default()).unwrap_err();
        assert!(matches!(err, SelError::Shape(_)));
    }

    #[test]
    fn invalid_threshold_is_rejected() {
        let opts = ExtractionOpts {
            threshold: 1.5,
            ..ExtractionOpts::default()
        };
        assert!(matches!(opts.validate(), Err(SelError::Config(_))));
    }
}
