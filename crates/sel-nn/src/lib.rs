#![deny(missing_docs)]
#![doc = "Feed-forward binary classifier trained with binary cross-entropy."]

/// Architecture and training schedule configuration.
pub mod config;
pub mod layers;
/// Sequential network and loss.
pub mod network;
/// Optimiser update rules.
pub mod optimizer;
/// Input standardisation.
pub mod scaler;
/// Trainer and trained classifier.
pub mod trainer;

pub use config::{Activation, LayerSpec, NetworkSpec, OptimizerSpec, TrainingOpts};
pub use network::Network;
pub use scaler::Standardizer;
pub use trainer::{EpochRecord, NeuralClassifier, NeuralTrainer, TrainingHistory};
