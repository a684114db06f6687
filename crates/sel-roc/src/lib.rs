#![deny(missing_docs)]
#![doc = "Evaluator: ROC curves, AUC and classifier-versus-baseline comparison."]

pub mod curve;
pub mod cut;
pub mod evaluate;

pub use curve::{RocCurve, RocPoint};
pub use cut::{best_orientation, cut_roc, Orientation};
pub use evaluate::{
    evaluate, Evaluation, EvaluationOpts, RocComparison, RocSummary, ScoreDistributions,
};
