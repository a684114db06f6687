#![deny(missing_docs)]
#![doc = "Core traits and data types for the signal/background event selection pipeline."]

pub mod errors;
/// Content hashes recorded in run provenance.
pub mod hash;
pub mod histogram;
pub mod provenance;
pub mod rng;
/// JSON and YAML encoding with located decode errors.
pub mod serde;
mod types;

pub use errors::{ErrorInfo, SelError};
pub use histogram::Histogram;
pub use provenance::RunProvenance;
pub use rng::{RngHandle, Stream};
pub use types::{FeatureMatrix, Label, LabeledSet};

/// A trained, immutable mapping from feature rows to a score in `[0, 1]`
/// estimating the probability that the row is signal.
pub trait Classifier: Send + Sync {
    /// Ordered feature columns the classifier was trained on.
    fn feature_columns(&self) -> &[String];

    /// Scores every row of `features`.
    ///
    /// Implementations must reject matrices whose column layout differs from
    /// [`Classifier::feature_columns`].
    fn score(&self, features: &FeatureMatrix) -> Result<Vec<f64>, SelError>;
}

/// Capability that turns a labelled training split into a [`Classifier`].
pub trait Trainer {
    /// Classifier type produced by this trainer.
    type Output: Classifier;

    /// Fits a classifier on the provided training rows.
    fn train(&self, training: &LabeledSet) -> Result<Self::Output, SelError>;
}
