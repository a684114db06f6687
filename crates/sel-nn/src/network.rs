use nalgebra::DMatrix;
use sel_core::RngHandle;

use crate::config::{NetworkSpec, OptimizerSpec};
use crate::layers::{sigmoid, ActivationLayer, BatchNorm, Dense, Layer};

/// Sequential feed-forward network ending in a single logit.
#[derive(Debug, Clone)]
pub struct Network {
    layers: Vec<Layer>,
}

impl Network {
    /// Builds the hidden stack described by `spec` plus one output unit.
    pub fn build(inputs: usize, spec: &NetworkSpec, rng: &mut RngHandle) -> Self {
        let mut layers = Vec::new();
        let mut width = inputs;
        for hidden in &spec.hidden {
            layers.push(Layer::Dense(Dense::new(width, hidden.width, rng)));
            if hidden.batch_norm {
                layers.push(Layer::BatchNorm(BatchNorm::new(hidden.width)));
            }
            layers.push(Layer::Activation(ActivationLayer::new(hidden.activation)));
            width = hidden.width;
        }
        layers.push(Layer::Dense(Dense::new(width, 1, rng)));
        Self { layers }
    }

    /// Logits for a training batch, caching intermediate values.
    pub fn forward_train(&mut self, x: &DMatrix<f64>) -> DMatrix<f64> {
        self.layers
            .iter_mut()
            .fold(x.clone(), |acc, layer| layer.forward_train(&acc))
    }

    /// Back-propagates `d loss / d logits` through every layer.
    pub fn backward(&mut self, grad: &DMatrix<f64>) {
        self.layers
            .iter_mut()
            .rev()
            .fold(grad.clone(), |acc, layer| layer.backward(&acc));
    }

    /// Applies one optimiser step to every parameter.
    pub fn apply(&mut self, optimizer: &OptimizerSpec) {
        for layer in &mut self.layers {
            for param in layer.params_mut() {
                optimizer.step(param);
            }
        }
    }

    /// Probabilities for every row of `x`.
    pub fn predict(&self, x: &DMatrix<f64>) -> Vec<f64> {
        let logits = self
            .layers
            .iter()
            .fold(x.clone(), |acc, layer| layer.infer(&acc));
        logits.iter().map(|z| sigmoid(*z)).collect()
    }

    /// Number of trainable scalars.
    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(Layer::parameter_count).sum()
    }
}

/// Mean binary cross-entropy of a batch and its gradient with respect to the logits.
pub fn bce_with_logits(logits: &DMatrix<f64>, targets: &[f64]) -> (f64, DMatrix<f64>) {
    let n = targets.len().max(1) as f64;
    let mut loss = 0.0;
    let mut grad = DMatrix::zeros(logits.nrows(), 1);
    for (idx, target) in targets.iter().enumerate() {
        let z = logits[(idx, 0)];
        loss += z.max(0.0) - z * target + (-z.abs()).exp().ln_1p();
        grad[(idx, 0)] = (sigmoid(z) - target) / n;
    }
    (loss / n, grad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sel_core::rng::Stream;

    #[test]
    fn default_architecture_parameter_count() {
        let mut rng = Stream::WeightInit.rng(1);
        let net = Network::build(9, &NetworkSpec::default(), &mut rng);
        // dense 9x16 + bias, batch norm 2x16, dense 16x8 + bias, dense 8x1 + bias
        assert_eq!(net.parameter_count(), 160 + 32 + 136 + 9);
    }

    #[test]
    fn bce_at_zero_logit_is_ln_two() {
        let logits = DMatrix::zeros(2, 1);
        let (loss, grad) = bce_with_logits(&logits, &[0.0, 1.0]);
        assert!((loss - std::f64::consts::LN_2).abs() < 1e-12);
        assert!((grad[(0, 0)] - 0.25).abs() < 1e-12);
        assert!((grad[(1, 0)] + 0.25).abs() < 1e-12);
    }

    #[test]
    fn predictions_lie_in_unit_interval() {
        let mut rng = Stream::WeightInit.rng(5);
        let net = Network::build(3, &NetworkSpec::default(), &mut rng);
        let x = DMatrix::from_fn(10, 3, |r, c| (r as f64 - 5.0) * (c as f64 + 1.0));
        assert!(net.predict(&x).iter().all(|p| (0.0..=1.0).contains(p)));
    }
}
