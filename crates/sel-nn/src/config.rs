use sel_core::errors::{ErrorInfo, SelError};
use serde::{Deserialize, Serialize};

/// Element-wise activation applied after a hidden layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    /// Rectified linear unit.
    #[default]
    Relu,
    /// Hyperbolic tangent.
    Tanh,
    /// Logistic sigmoid.
    Sigmoid,
    /// Identity.
    Linear,
}

/// One dense hidden layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    /// Number of units.
    pub width: usize,
    /// Insert batch normalisation between the affine map and the activation.
    #[serde(default)]
    pub batch_norm: bool,
    /// Activation applied to the layer output.
    #[serde(default)]
    pub activation: Activation,
}

fn default_hidden() -> Vec<LayerSpec> {
    vec![
        LayerSpec {
            width: 16,
            batch_norm: true,
            activation: Activation::Relu,
        },
        LayerSpec {
            width: 8,
            batch_norm: false,
            activation: Activation::Relu,
        },
    ]
}

fn default_true() -> bool {
    true
}

/// Network architecture. The single sigmoid output unit is implicit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Hidden layers from input to output.
    #[serde(default = "default_hidden")]
    pub hidden: Vec<LayerSpec>,
    /// Standardise every feature with training-split mean and deviation.
    #[serde(default = "default_true")]
    pub standardize_inputs: bool,
}

impl Default for NetworkSpec {
    fn default() -> Self {
        Self {
            hidden: default_hidden(),
            standardize_inputs: true,
        }
    }
}

fn default_learning_rate() -> f64 {
    1e-3
}

fn default_rho() -> f64 {
    0.9
}

fn default_epsilon() -> f64 {
    1e-7
}

/// Gradient-based optimiser applied after every mini-batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OptimizerSpec {
    /// RMSprop with a running average of squared gradients.
    RmsProp {
        /// Step size.
        #[serde(default = "default_learning_rate")]
        learning_rate: f64,
        /// Decay of the squared-gradient average.
        #[serde(default = "default_rho")]
        rho: f64,
        /// Denominator guard.
        #[serde(default = "default_epsilon")]
        epsilon: f64,
    },
    /// Plain stochastic gradient descent with optional momentum.
    Sgd {
        /// Step size.
        learning_rate: f64,
        /// Momentum coefficient in `[0, 1)`.
        #[serde(default)]
        momentum: f64,
    },
}

impl Default for OptimizerSpec {
    fn default() -> Self {
        OptimizerSpec::RmsProp {
            learning_rate: default_learning_rate(),
            rho: default_rho(),
            epsilon: default_epsilon(),
        }
    }
}

fn default_epochs() -> usize {
    10
}

fn default_batch_size() -> usize {
    32
}

fn default_seed() -> u64 {
    2024
}

/// Mini-batch training schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingOpts {
    /// Full passes over the training split.
    #[serde(default = "default_epochs")]
    pub epochs: usize,
    /// Rows per gradient step.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Optimiser.
    #[serde(default)]
    pub optimizer: OptimizerSpec,
    /// Reshuffle the row order at the start of every epoch.
    #[serde(default = "default_true")]
    pub shuffle: bool,
    /// Seed for weight initialisation and shuffling.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for TrainingOpts {
    fn default() -> Self {
        Self {
            epochs: default_epochs(),
            batch_size: default_batch_size(),
            optimizer: OptimizerSpec::default(),
            shuffle: true,
            seed: default_seed(),
        }
    }
}

fn config_error(code: &str, message: &str) -> SelError {
    SelError::Config(ErrorInfo::new(code, message))
}

impl NetworkSpec {
    /// Rejects zero-width layers.
    pub fn validate(&self) -> Result<(), SelError> {
        if self.hidden.iter().any(|layer| layer.width == 0) {
            return Err(config_error("layer-width", "hidden layers need at least one unit"));
        }
        Ok(())
    }
}

impl TrainingOpts {
    /// Rejects empty schedules and non-positive step sizes.
    pub fn validate(&self) -> Result<(), SelError> {
        if self.epochs == 0 {
            return Err(config_error("epochs", "at least one epoch is required"));
        }
        if self.batch_size == 0 {
            return Err(config_error("batch-size", "batch size must be positive"));
        }
        let learning_rate = match &self.optimizer {
            OptimizerSpec::RmsProp { learning_rate, .. } => *learning_rate,
            OptimizerSpec::Sgd { learning_rate, .. } => *learning_rate,
        };
        if !(learning_rate.is_finite() && learning_rate > 0.0) {
            return Err(config_error("learning-rate", "learning rate must be positive"));
        }
        Ok(())
    }
}
