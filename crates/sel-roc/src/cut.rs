//! ROC curves for a single raw variable used as a cut.

use sel_core::errors::SelError;
use sel_core::Label;
use serde::{Deserialize, Serialize};

use crate::curve::RocCurve;

/// Which side of a cut is signal-like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Rows with `value >= cut` are accepted.
    #[default]
    HigherIsSignal,
    /// Rows with `value <= cut` are accepted.
    LowerIsSignal,
}

/// ROC curve of a raw variable; thresholds are reported in the variable's own units.
pub fn cut_roc(
    values: &[f64],
    labels: &[Label],
    orientation: Orientation,
) -> Result<RocCurve, SelError> {
    match orientation {
        Orientation::HigherIsSignal => RocCurve::from_scores(values, labels),
        Orientation::LowerIsSignal => {
            let flipped: Vec<f64> = values.iter().map(|value| -value).collect();
            let mut curve = RocCurve::from_scores(&flipped, labels)?;
            for point in &mut curve.points {
                point.threshold = point.threshold.map(|threshold| -threshold);
            }
            Ok(curve)
        }
    }
}

/// Picks the orientation with the larger area and returns it with its curve.
pub fn best_orientation(
    values: &[f64],
    labels: &[Label],
) -> Result<(Orientation, RocCurve), SelError> {
    let higher = cut_roc(values, labels, Orientation::HigherIsSignal)?;
    let lower = cut_roc(values, labels, Orientation::LowerIsSignal)?;
    if lower.auc() > higher.auc() {
        Ok((Orientation::LowerIsSignal, lower))
    } else {
        Ok((Orientation::HigherIsSignal, higher))
    }
}
