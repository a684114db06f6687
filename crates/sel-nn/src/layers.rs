//! Layer primitives operating on `batch x units` matrices.

use nalgebra::DMatrix;
use rand::Rng;
use sel_core::RngHandle;

use crate::config::Activation;

/// Trainable tensor together with its gradient and optimiser state.
#[derive(Debug, Clone)]
pub struct Param {
    /// Current value.
    pub value: DMatrix<f64>,
    /// Gradient of the batch loss with respect to `value`.
    pub grad: DMatrix<f64>,
    /// Optimiser accumulator (squared-gradient average or velocity).
    pub state: DMatrix<f64>,
}

impl Param {
    fn new(value: DMatrix<f64>) -> Self {
        let (rows, cols) = value.shape();
        Self {
            value,
            grad: DMatrix::zeros(rows, cols),
            state: DMatrix::zeros(rows, cols),
        }
    }
}

fn column_sums(matrix: &DMatrix<f64>) -> DMatrix<f64> {
    let mut sums = DMatrix::zeros(1, matrix.ncols());
    for col in 0..matrix.ncols() {
        sums[(0, col)] = matrix.column(col).sum();
    }
    sums
}

fn add_row(matrix: &mut DMatrix<f64>, row: &DMatrix<f64>) {
    for r in 0..matrix.nrows() {
        for c in 0..matrix.ncols() {
            matrix[(r, c)] += row[(0, c)];
        }
    }
}

/// Fully connected affine layer `x W + b`.
#[derive(Debug, Clone)]
pub struct Dense {
    weights: Param,
    bias: Param,
    input: Option<DMatrix<f64>>,
}

impl Dense {
    /// Glorot-uniform weights, zero bias.
    pub fn new(inputs: usize, outputs: usize, rng: &mut RngHandle) -> Self {
        let limit = (6.0 / (inputs + outputs) as f64).sqrt();
        let weights = DMatrix::from_fn(inputs, outputs, |_, _| rng.gen_range(-limit..limit));
        Self {
            weights: Param::new(weights),
            bias: Param::new(DMatrix::zeros(1, outputs)),
            input: None,
        }
    }

    fn infer(&self, x: &DMatrix<f64>) -> DMatrix<f64> {
        let mut out = x * &self.weights.value;
        add_row(&mut out, &self.bias.value);
        out
    }

    fn backward(&mut self, grad: &DMatrix<f64>) -> DMatrix<f64> {
        if let Some(input) = &self.input {
            self.weights.grad = input.transpose() * grad;
        }
        self.bias.grad = column_sums(grad);
        grad * self.weights.value.transpose()
    }
}

/// Batch normalisation with learned scale and shift.
///
/// Training batches are normalised with their own statistics; inference uses
/// exponential moving averages of those statistics.
#[derive(Debug, Clone)]
pub struct BatchNorm {
    gamma: Param,
    beta: Param,
    running_mean: Vec<f64>,
    running_var: Vec<f64>,
    momentum: f64,
    epsilon: f64,
    cache: Option<(DMatrix<f64>, Vec<f64>)>,
}

impl BatchNorm {
    /// Unit scale, zero shift, running statistics at (0, 1).
    pub fn new(units: usize) -> Self {
        Self {
            gamma: Param::new(DMatrix::from_element(1, units, 1.0)),
            beta: Param::new(DMatrix::zeros(1, units)),
            running_mean: vec![0.0; units],
            running_var: vec![1.0; units],
            momentum: 0.99,
            epsilon: 1e-3,
            cache: None,
        }
    }

    fn scale_shift(&self, xhat: &DMatrix<f64>) -> DMatrix<f64> {
        let mut out = xhat.clone();
        for r in 0..out.nrows() {
            for c in 0..out.ncols() {
                out[(r, c)] = out[(r, c)] * self.gamma.value[(0, c)] + self.beta.value[(0, c)];
            }
        }
        out
    }

    fn infer(&self, x: &DMatrix<f64>) -> DMatrix<f64> {
        let mut xhat = x.clone();
        for c in 0..xhat.ncols() {
            let inv_std = 1.0 / (self.running_var[c] + self.epsilon).sqrt();
            for r in 0..xhat.nrows() {
                xhat[(r, c)] = (xhat[(r, c)] - self.running_mean[c]) * inv_std;
            }
        }
        self.scale_shift(&xhat)
    }

    fn forward_train(&mut self, x: &DMatrix<f64>) -> DMatrix<f64> {
        let rows = x.nrows() as f64;
        let mut xhat = x.clone();
        let mut inv_stds = Vec::with_capacity(x.ncols());
        for c in 0..x.ncols() {
            let column = x.column(c);
            let mean = column.sum() / rows;
            let var = column.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / rows;
            let inv_std = 1.0 / (var + self.epsilon).sqrt();
            for r in 0..x.nrows() {
                xhat[(r, c)] = (x[(r, c)] - mean) * inv_std;
            }
            let keep = self.momentum;
            self.running_mean[c] = keep * self.running_mean[c] + (1.0 - keep) * mean;
            self.running_var[c] = keep * self.running_var[c] + (1.0 - keep) * var;
            inv_stds.push(inv_std);
        }
        let out = self.scale_shift(&xhat);
        self.cache = Some((xhat, inv_stds));
        out
    }

    fn backward(&mut self, grad: &DMatrix<f64>) -> DMatrix<f64> {
        let Some((xhat, inv_stds)) = &self.cache else {
            return grad.clone();
        };
        let rows = grad.nrows() as f64;
        let cols = grad.ncols();
        let mut dgamma = DMatrix::zeros(1, cols);
        let mut dbeta = DMatrix::zeros(1, cols);
        let mut dx = DMatrix::zeros(grad.nrows(), cols);
        for c in 0..cols {
            let gamma = self.gamma.value[(0, c)];
            let mut sum_dxhat = 0.0;
            let mut sum_dxhat_xhat = 0.0;
            for r in 0..grad.nrows() {
                dgamma[(0, c)] += grad[(r, c)] * xhat[(r, c)];
                dbeta[(0, c)] += grad[(r, c)];
                let dxhat = grad[(r, c)] * gamma;
                sum_dxhat += dxhat;
                sum_dxhat_xhat += dxhat * xhat[(r, c)];
            }
            for r in 0..grad.nrows() {
                let dxhat = grad[(r, c)] * gamma;
                dx[(r, c)] = inv_stds[c] / rows
                    * (rows * dxhat - sum_dxhat - xhat[(r, c)] * sum_dxhat_xhat);
            }
        }
        self.gamma.grad = dgamma;
        self.beta.grad = dbeta;
        dx
    }
}

/// Element-wise activation layer.
#[derive(Debug, Clone)]
pub struct ActivationLayer {
    kind: Activation,
    output: Option<DMatrix<f64>>,
}

impl ActivationLayer {
    /// Wraps an activation kind.
    pub fn new(kind: Activation) -> Self {
        Self { kind, output: None }
    }

    fn infer(&self, x: &DMatrix<f64>) -> DMatrix<f64> {
        match self.kind {
            Activation::Relu => x.map(|v| v.max(0.0)),
            Activation::Tanh => x.map(f64::tanh),
            Activation::Sigmoid => x.map(sigmoid),
            Activation::Linear => x.clone(),
        }
    }

    fn backward(&self, grad: &DMatrix<f64>) -> DMatrix<f64> {
        let Some(out) = &self.output else {
            return grad.clone();
        };
        let derivative = match self.kind {
            Activation::Relu => out.map(|v| if v > 0.0 { 1.0 } else { 0.0 }),
            Activation::Tanh => out.map(|v| 1.0 - v * v),
            Activation::Sigmoid => out.map(|v| v * (1.0 - v)),
            Activation::Linear => return grad.clone(),
        };
        grad.component_mul(&derivative)
    }
}

/// Numerically stable logistic function.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Any layer of the network.
#[derive(Debug, Clone)]
pub enum Layer {
    /// Affine map.
    Dense(Dense),
    /// Batch normalisation.
    BatchNorm(BatchNorm),
    /// Element-wise activation.
    Activation(ActivationLayer),
}

impl Layer {
    /// Inference pass; never touches cached state.
    pub fn infer(&self, x: &DMatrix<f64>) -> DMatrix<f64> {
        match self {
            Layer::Dense(layer) => layer.infer(x),
            Layer::BatchNorm(layer) => layer.infer(x),
            Layer::Activation(layer) => layer.infer(x),
        }
    }

    /// Training pass; caches what [`Layer::backward`] needs.
    pub fn forward_train(&mut self, x: &DMatrix<f64>) -> DMatrix<f64> {
        match self {
            Layer::Dense(layer) => {
                layer.input = Some(x.clone());
                layer.infer(x)
            }
            Layer::BatchNorm(layer) => layer.forward_train(x),
            Layer::Activation(layer) => {
                let out = layer.infer(x);
                layer.output = Some(out.clone());
                out
            }
        }
    }

    /// Propagates the loss gradient to the layer input, storing parameter gradients.
    pub fn backward(&mut self, grad: &DMatrix<f64>) -> DMatrix<f64> {
        match self {
            Layer::Dense(layer) => layer.backward(grad),
            Layer::BatchNorm(layer) => layer.backward(grad),
            Layer::Activation(layer) => layer.backward(grad),
        }
    }

    /// Trainable parameters of the layer.
    pub fn params_mut(&mut self) -> Vec<&mut Param> {
        match self {
            Layer::Dense(layer) => vec![&mut layer.weights, &mut layer.bias],
            Layer::BatchNorm(layer) => vec![&mut layer.gamma, &mut layer.beta],
            Layer::Activation(_) => Vec::new(),
        }
    }

    /// Number of trainable scalars.
    pub fn parameter_count(&self) -> usize {
        match self {
            Layer::Dense(layer) => layer.weights.value.len() + layer.bias.value.len(),
            Layer::BatchNorm(layer) => layer.gamma.value.len() + layer.beta.value.len(),
            Layer::Activation(_) => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sel_core::rng::Stream;

    fn loss(layer: &Layer, x: &DMatrix<f64>, upstream: &DMatrix<f64>) -> f64 {
        layer.infer(x).component_mul(upstream).sum()
    }

    #[test]
    fn dense_input_gradient_matches_finite_difference() {
        let mut rng = Stream::WeightInit.rng(3);
        let mut layer = Layer::Dense(Dense::new(3, 2, &mut rng));
        let x = DMatrix::from_row_slice(2, 3, &[0.5, -1.0, 2.0, 1.5, 0.25, -0.75]);
        let upstream = DMatrix::from_row_slice(2, 2, &[1.0, -2.0, 0.5, 3.0]);
        layer.forward_train(&x);
        let analytic = layer.backward(&upstream);
        let h = 1e-6;
        for r in 0..2 {
            for c in 0..3 {
                let mut plus = x.clone();
                plus[(r, c)] += h;
                let mut minus = x.clone();
                minus[(r, c)] -= h;
                let numeric =
                    (loss(&layer, &plus, &upstream) - loss(&layer, &minus, &upstream)) / (2.0 * h);
                assert!((numeric - analytic[(r, c)]).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn batch_norm_training_output_is_standardised() {
        let mut layer = BatchNorm::new(1);
        let x = DMatrix::from_column_slice(4, 1, &[1.0, 2.0, 3.0, 4.0]);
        let out = layer.forward_train(&x);
        assert!(out.sum().abs() < 1e-12);
        assert!(layer.running_mean[0] > 0.0);
    }

    #[test]
    fn batch_norm_gradient_matches_finite_difference() {
        let x = DMatrix::from_row_slice(3, 2, &[0.3, 1.0, -0.7, 2.0, 1.1, -0.5]);
        let upstream = DMatrix::from_row_slice(3, 2, &[0.2, -1.0, 1.5, 0.3, -0.4, 0.8]);
        let mut layer = BatchNorm::new(2);
        layer.forward_train(&x);
        let analytic = layer.backward(&upstream);
        let h = 1e-6;
        let objective = |input: &DMatrix<f64>| {
            let mut fresh = BatchNorm::new(2);
            fresh.forward_train(input).component_mul(&upstream).sum()
        };
        for r in 0..3 {
            for c in 0..2 {
                let mut plus = x.clone();
                plus[(r, c)] += h;
                let mut minus = x.clone();
                minus[(r, c)] -= h;
                let numeric = (objective(&plus) - objective(&minus)) / (2.0 * h);
                assert!((numeric - analytic[(r, c)]).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn sigmoid_is_stable_at_extremes() {
        assert_eq!(sigmoid(-1000.0), 0.0);
        assert_eq!(sigmoid(1000.0), 1.0);
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-15);
    }
}
