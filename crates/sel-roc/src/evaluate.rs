//! Scores held-out and signal-region rows and compares the classifier with a baseline.

use sel_core::errors::{ErrorInfo, SelError};
use sel_core::{Classifier, FeatureMatrix, Histogram, Label, LabeledSet};
use serde::{Deserialize, Serialize};

use crate::curve::RocCurve;

/// Evaluator settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationOpts {
    /// Bin count of the per-class score histograms over `[0, 1]`.
    pub score_bins: usize,
}

impl Default for EvaluationOpts {
    fn default() -> Self {
        Self { score_bins: 50 }
    }
}

/// Headline numbers of one ROC curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RocSummary {
    /// Trapezoidal area under the curve.
    pub auc: f64,
    /// Signal efficiency at 1 % background efficiency.
    pub tpr_at_fpr_1pct: f64,
    /// Signal efficiency at 10 % background efficiency.
    pub tpr_at_fpr_10pct: f64,
}

impl RocSummary {
    /// Summarises a curve.
    pub fn of(curve: &RocCurve) -> Self {
        Self {
            auc: curve.auc(),
            tpr_at_fpr_1pct: curve.tpr_at_fpr(0.01),
            tpr_at_fpr_10pct: curve.tpr_at_fpr(0.10),
        }
    }
}

/// Classifier and baseline curves built over the same label set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocComparison {
    /// Curve of the trained classifier.
    pub classifier: RocCurve,
    /// Curve of the baseline discriminator, when one is available.
    pub baseline: Option<RocCurve>,
    /// Summary of [`RocComparison::classifier`].
    pub classifier_summary: RocSummary,
    /// Summary of [`RocComparison::baseline`].
    pub baseline_summary: Option<RocSummary>,
}

impl RocComparison {
    /// Builds both curves; the baseline must cover exactly the labelled rows.
    pub fn build(
        scores: &[f64],
        baseline: Option<&[f64]>,
        labels: &[Label],
    ) -> Result<Self, SelError> {
        let classifier = RocCurve::from_scores(scores, labels)?;
        let baseline = match baseline {
            Some(values) => Some(RocCurve::from_scores(values, labels)?),
            None => None,
        };
        Ok(Self {
            classifier_summary: RocSummary::of(&classifier),
            baseline_summary: baseline.as_ref().map(RocSummary::of),
            classifier,
            baseline,
        })
    }

    /// Classifier AUC minus baseline AUC.
    pub fn auc_gain(&self) -> Option<f64> {
        self.baseline_summary
            .map(|baseline| self.classifier_summary.auc - baseline.auc)
    }
}

/// Score histograms of the held-out background and simulation rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreDistributions {
    /// Held-out background (label 0).
    pub background: Histogram,
    /// Held-out simulation (label 1).
    pub simulation: Histogram,
}

impl ScoreDistributions {
    /// Histograms `scores` per class over `[0, 1]`.
    pub fn build(scores: &[f64], labels: &[Label], bins: usize) -> Result<Self, SelError> {
        let of = |wanted: Label| {
            Histogram::with_range(
                scores
                    .iter()
                    .zip(labels)
                    .filter(move |(_, label)| **label == wanted)
                    .map(|(score, _)| *score),
                0.0,
                1.0,
                bins,
            )
        };
        Ok(Self {
            background: of(Label::Background)?,
            simulation: of(Label::Signal)?,
        })
    }
}

/// Everything the evaluator produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Classifier scores of the evaluation split, in split order.
    pub evaluation_scores: Vec<f64>,
    /// Classifier scores of the signal-region rows, in file order.
    pub signal_region_scores: Vec<f64>,
    /// Classifier versus baseline curves.
    pub comparison: RocComparison,
    /// Per-class score histograms.
    pub distributions: ScoreDistributions,
}

/// Scores both sets with `classifier` and builds the ROC comparison.
pub fn evaluate(
    classifier: &dyn Classifier,
    evaluation: &LabeledSet,
    signal_region: &FeatureMatrix,
    baseline: Option<&[f64]>,
    opts: &EvaluationOpts,
) -> Result<Evaluation, SelError> {
    if let Some(values) = baseline {
        if values.len() != evaluation.len() {
            return Err(SelError::Shape(
                ErrorInfo::new(
                    "baseline-count",
                    "baseline column does not cover the evaluation split",
                )
                    .with_context("baseline", values.len().to_string())
                    .with_context("evaluation", evaluation.len().to_string()),
            ));
        }
    }
    let evaluation_scores = classifier.score(&evaluation.features)?;
    let signal_region_scores = classifier.score(signal_region)?;
    let comparison = RocComparison::build(&evaluation_scores, baseline, &evaluation.labels)?;
    let distributions =
        ScoreDistributions::build(&evaluation_scores, &evaluation.labels, opts.score_bins)?;

    match comparison.baseline_summary {
        Some(baseline) => tracing::info!(
            classifier_auc = comparison.classifier_summary.auc,
            baseline_auc = baseline.auc,
            "roc comparison"
        ),
        None => tracing::info!(classifier_auc = comparison.classifier_summary.auc, "roc curve"),
    }

    Ok(Evaluation {
        evaluation_scores,
        signal_region_scores,
        comparison,
        distributions,
    })
}
