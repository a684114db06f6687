//! Receiver operating characteristic curves built from (score, label) pairs.

use std::cmp::Ordering;

use sel_core::errors::{ErrorInfo, SelError};
use sel_core::Label;
use serde::{Deserialize, Serialize};

/// One point of a ROC curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RocPoint {
    /// Fraction of negatives with `score >= threshold`.
    pub fpr: f64,
    /// Fraction of positives with `score >= threshold`.
    pub tpr: f64,
    /// Score threshold; `None` for the origin, which accepts nothing.
    pub threshold: Option<f64>,
}

/// ROC curve ordered by decreasing threshold, from (0, 0) to (1, 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocCurve {
    /// Curve points, one per distinct score plus the origin.
    pub points: Vec<RocPoint>,
    /// Number of positive (signal) rows.
    pub positives: usize,
    /// Number of negative (background) rows.
    pub negatives: usize,
}

impl RocCurve {
    /// Sweeps every distinct score from highest to lowest.
    ///
    /// Tied scores are accepted together, so each distinct score contributes
    /// exactly one point.
    pub fn from_scores(scores: &[f64], labels: &[Label]) -> Result<Self, SelError> {
        if scores.len() != labels.len() {
            return Err(SelError::Shape(
                ErrorInfo::new("score-count", "scores and labels differ in length")
                    .with_context("scores", scores.len().to_string())
                    .with_context("labels", labels.len().to_string()),
            ));
        }
        if let Some(idx) = scores.iter().position(|score| !score.is_finite()) {
            return Err(SelError::Evaluation(
                ErrorInfo::new("non-finite-score", "scores must be finite")
                    .with_context("row", idx.to_string()),
            ));
        }
        let positives = labels.iter().filter(|label| label.is_signal()).count();
        let negatives = labels.len() - positives;
        if positives == 0 || negatives == 0 {
            return Err(SelError::Evaluation(
                ErrorInfo::new("single-class", "a ROC curve needs both positives and negatives")
                    .with_context("positives", positives.to_string())
                    .with_context("negatives", negatives.to_string()),
            ));
        }

        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|a, b| scores[*b].partial_cmp(&scores[*a]).unwrap_or(Ordering::Equal));

        let mut points = Vec::with_capacity(scores.len() + 1);
        points.push(RocPoint {
            fpr: 0.0,
            tpr: 0.0,
            threshold: None,
        });
        let (mut tp, mut fp) = (0usize, 0usize);
        let mut idx = 0;
        while idx < order.len() {
            let threshold = scores[order[idx]];
            while idx < order.len() && scores[order[idx]] == threshold {
                if labels[order[idx]].is_signal() {
                    tp += 1;
                } else {
                    fp += 1;
                }
                idx += 1;
            }
            points.push(RocPoint {
                fpr: fp as f64 / negatives as f64,
                tpr: tp as f64 / positives as f64,
                threshold: Some(threshold),
            });
        }

        Ok(Self {
            points,
            positives,
            negatives,
        })
    }

    /// Area under the curve by trapezoidal integration over (fpr, tpr).
    pub fn auc(&self) -> f64 {
        self.points
            .windows(2)
            .map(|pair| (pair[1].fpr - pair[0].fpr) * (pair[0].tpr + pair[1].tpr) * 0.5)
            .sum()
    }

    /// True-positive rate at the given false-positive rate, interpolated linearly.
    pub fn tpr_at_fpr(&self, fpr: f64) -> f64 {
        let fpr = fpr.clamp(0.0, 1.0);
        let mut best = 0.0f64;
        for pair in self.points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if b.fpr < fpr {
                best = best.max(b.tpr);
                continue;
            }
            if a.fpr <= fpr {
                let value = if b.fpr > a.fpr {
                    a.tpr + (b.tpr - a.tpr) * (fpr - a.fpr) / (b.fpr - a.fpr)
                } else {
                    b.tpr
                };
                best = best.max(value);
            }
            if b.fpr > fpr {
                break;
            }
        }
        best
    }
}
