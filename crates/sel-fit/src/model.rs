//! Fit models and the binned data they are fit to.

use serde::{Deserialize, Serialize};

use crate::params::ParameterSet;

/// (x, y, sigma) points handed to a least-squares solver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BinnedData {
    /// Bin centres.
    pub x: Vec<f64>,
    /// Observed counts.
    pub y: Vec<f64>,
    /// Per-point uncertainty; every entry is strictly positive.
    pub sigma: Vec<f64>,
}

impl BinnedData {
    /// Number of points.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// True when there is nothing to fit.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// A scalar function of one observable with named parameters.
pub trait FitModel: Send + Sync {
    /// Parameter names in the order `eval` expects their values.
    fn parameter_names(&self) -> &[&'static str];

    /// Human readable formula used in fit reports.
    fn formula(&self) -> &str;

    /// Evaluates the model at `x` for the given parameter values.
    fn eval(&self, values: &[f64], x: f64) -> f64;
}

/// Seeds of the exponential-plus-Gaussian model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitSeeds {
    /// Resonance mass the Gaussian is centred on.
    pub mean: f64,
    /// Whether `mean` may float.
    pub vary_mean: bool,
    /// Gaussian width seed.
    pub width: f64,
    /// Exponential slope seed.
    pub k: f64,
    /// `norm` is seeded at `norm_scale` times the first window count.
    pub norm_scale: f64,
}

impl Default for FitSeeds {
    fn default() -> Self {
        Self {
            mean: 5280.0,
            vary_mean: false,
            width: 20.0,
            k: 1.0 / 500.0,
            norm_scale: 5.0,
        }
    }
}

/// `a·exp(-k·(m-mean)) + norm·exp(-(m-mean)²/(2·width²))`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpGaussModel;

impl ExpGaussModel {
    /// Index of the exponential amplitude.
    pub const A: usize = 0;
    /// Index of the exponential slope.
    pub const K: usize = 1;
    /// Index of the Gaussian centre.
    pub const MEAN: usize = 2;
    /// Index of the Gaussian width.
    pub const WIDTH: usize = 3;
    /// Index of the Gaussian amplitude.
    pub const NORM: usize = 4;

    const NAMES: [&'static str; 5] = ["a", "k", "mean", "width", "norm"];

    /// Seeds a parameter set: `a` and `norm` scale with the first count in the window.
    pub fn seed_parameters(seeds: &FitSeeds, first_count: f64) -> ParameterSet {
        let mut params = ParameterSet::new();
        params.add("a", first_count).add("k", seeds.k);
        if seeds.vary_mean {
            params.add("mean", seeds.mean);
        } else {
            params.add_fixed("mean", seeds.mean);
        }
        params
            .add("width", seeds.width)
            .add("norm", seeds.norm_scale * first_count);
        params
    }

    /// Exponential background component.
    pub fn background(values: &[f64], x: f64) -> f64 {
        values[Self::A] * (-values[Self::K] * (x - values[Self::MEAN])).exp()
    }

    /// Gaussian signal component.
    pub fn signal(values: &[f64], x: f64) -> f64 {
        let delta = x - values[Self::MEAN];
        let width = values[Self::WIDTH];
        values[Self::NORM] * (-delta * delta / (2.0 * width * width)).exp()
    }
}

impl FitModel for ExpGaussModel {
    fn parameter_names(&self) -> &[&'static str] {
        &Self::NAMES
    }

    fn formula(&self) -> &str {
        "a*exp(-k*(m-mean)) + norm*exp(-(m-mean)^2/(2*width^2))"
    }

    fn eval(&self, values: &[f64], x: f64) -> f64 {
        Self::background(values, x) + Self::signal(values, x)
    }
}
