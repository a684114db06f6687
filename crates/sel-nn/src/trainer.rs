use nalgebra::DMatrix;
use rand::seq::SliceRandom;
use sel_core::errors::{ErrorInfo, SelError};
use sel_core::rng::Stream;
use sel_core::{Classifier, FeatureMatrix, LabeledSet, Trainer};
use serde::{Deserialize, Serialize};

use crate::config::{NetworkSpec, TrainingOpts};
use crate::network::{bce_with_logits, Network};
use crate::scaler::Standardizer;

fn training_error(code: &str, message: &str, training: &LabeledSet) -> SelError {
    SelError::Training(
        ErrorInfo::new(code, message)
            .with_context("signal_rows", training.positives().to_string())
            .with_context("background_rows", training.negatives().to_string()),
    )
}

fn to_matrix(features: &FeatureMatrix) -> DMatrix<f64> {
    DMatrix::from_row_slice(features.n_rows(), features.n_cols(), features.as_slice())
}

/// Loss and accuracy after one pass over the training split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochRecord {
    /// Zero-based epoch index.
    pub epoch: usize,
    /// Mean binary cross-entropy over the epoch's batches.
    pub loss: f64,
    /// Fraction of rows classified correctly at a 0.5 cut during the epoch.
    pub accuracy: f64,
}

/// Per-epoch training record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TrainingHistory {
    /// One entry per epoch.
    pub epochs: Vec<EpochRecord>,
    /// Number of trainable parameters.
    pub parameters: usize,
    /// Number of training rows.
    pub rows: usize,
}

/// Trains a [`NeuralClassifier`] with mini-batch gradient descent.
#[derive(Debug, Clone, Default)]
pub struct NeuralTrainer {
    /// Architecture.
    pub network: NetworkSpec,
    /// Schedule.
    pub training: TrainingOpts,
}

impl NeuralTrainer {
    /// Creates a trainer from architecture and schedule.
    pub fn new(network: NetworkSpec, training: TrainingOpts) -> Self {
        Self { network, training }
    }
}

/// Trained network plus the input standardisation fitted with it.
#[derive(Debug, Clone)]
pub struct NeuralClassifier {
    columns: Vec<String>,
    scaler: Option<Standardizer>,
    network: Network,
    history: TrainingHistory,
}

impl NeuralClassifier {
    /// Training record.
    pub fn history(&self) -> &TrainingHistory {
        &self.history
    }

    /// Input standardisation, when enabled.
    pub fn scaler(&self) -> Option<&Standardizer> {
        self.scaler.as_ref()
    }
}

impl Classifier for NeuralClassifier {
    fn feature_columns(&self) -> &[String] {
        &self.columns
    }

    fn score(&self, features: &FeatureMatrix) -> Result<Vec<f64>, SelError> {
        features.ensure_same_columns(&self.columns)?;
        if features.n_rows() == 0 {
            return Ok(Vec::new());
        }
        if let Some(row) = features.rows().position(|row| row.iter().any(|v| !v.is_finite())) {
            let column = features
                .row(row)
                .iter()
                .position(|v| !v.is_finite())
                .map_or("", |idx| features.columns()[idx].as_str());
            return Err(SelError::Schema(
                ErrorInfo::new("non-finite-feature", "feature row contains NaN or infinite values")
                    .with_context("row", row.to_string())
                    .with_context("column", column),
            ));
        }
        let x = to_matrix(features);
        let x = match &self.scaler {
            Some(scaler) => scaler.transform(&x),
            None => x,
        };
        Ok(self.network.predict(&x))
    }
}

impl Trainer for NeuralTrainer {
    type Output = NeuralClassifier;

    fn train(&self, training: &LabeledSet) -> Result<NeuralClassifier, SelError> {
        self.network.validate()?;
        self.training.validate()?;
        if training.positives() == 0 || training.negatives() == 0 {
            return Err(training_error(
                "single-class",
                "training split must contain both background and signal rows",
                training,
            ));
        }
        if training.features.as_slice().iter().any(|v| !v.is_finite()) {
            return Err(training_error(
                "non-finite-feature",
                "training features contain NaN or infinite values",
                training,
            ));
        }

        let raw = to_matrix(&training.features);
        let scaler = self
            .network
            .standardize_inputs
            .then(|| Standardizer::fit(&raw));
        let x = match &scaler {
            Some(scaler) => scaler.transform(&raw),
            None => raw,
        };
        let targets: Vec<f64> = training.labels.iter().map(|label| label.target()).collect();

        let seed = self.training.seed;
        let mut init_rng = Stream::WeightInit.rng(seed);
        let mut network = Network::build(x.ncols(), &self.network, &mut init_rng);
        let mut order: Vec<usize> = (0..x.nrows()).collect();
        let mut history = TrainingHistory {
            epochs: Vec::with_capacity(self.training.epochs),
            parameters: network.parameter_count(),
            rows: x.nrows(),
        };

        for epoch in 0..self.training.epochs {
            if self.training.shuffle {
                order.shuffle(&mut Stream::Shuffle { epoch }.rng(seed));
            }
            let mut loss_sum = 0.0;
            let mut correct = 0usize;
            for batch in order.chunks(self.training.batch_size) {
                let xb = DMatrix::from_fn(batch.len(), x.ncols(), |r, c| x[(batch[r], c)]);
                let yb: Vec<f64> = batch.iter().map(|idx| targets[*idx]).collect();
                let logits = network.forward_train(&xb);
                let (loss, grad) = bce_with_logits(&logits, &yb);
                loss_sum += loss * batch.len() as f64;
                correct += logits
                    .iter()
                    .zip(&yb)
                    .filter(|(z, y)| (**z >= 0.0) == (**y >= 0.5))
                    .count();
                network.backward(&grad);
                network.apply(&self.training.optimizer);
            }
            let record = EpochRecord {
                epoch,
                loss: loss_sum / x.nrows() as f64,
                accuracy: correct as f64 / x.nrows() as f64,
            };
            if !record.loss.is_finite() {
                return Err(training_error(
                    "non-finite-loss",
                    "training loss diverged",
                    training,
                ));
            }
            tracing::info!(
                epoch = record.epoch,
                loss = record.loss,
                accuracy = record.accuracy,
                "training epoch"
            );
            history.epochs.push(record);
        }

        Ok(NeuralClassifier {
            columns: training.features.columns().to_vec(),
            scaler,
            network,
            history,
        })
    }
}
