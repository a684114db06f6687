use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// Per-feature standardisation fitted on the training split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standardizer {
    /// Column means.
    pub mean: Vec<f64>,
    /// Column standard deviations; constant columns use 1.
    pub scale: Vec<f64>,
}

impl Standardizer {
    /// Fits means and deviations column by column.
    pub fn fit(x: &DMatrix<f64>) -> Self {
        let rows = x.nrows().max(1) as f64;
        let mut mean = Vec::with_capacity(x.ncols());
        let mut scale = Vec::with_capacity(x.ncols());
        for column in x.column_iter() {
            let mu = column.sum() / rows;
            let var = column.iter().map(|v| (v - mu) * (v - mu)).sum::<f64>() / rows;
            let sd = var.sqrt();
            mean.push(mu);
            scale.push(if sd > 0.0 && sd.is_finite() { sd } else { 1.0 });
        }
        Self { mean, scale }
    }

    /// Returns a standardised copy of `x`.
    pub fn transform(&self, x: &DMatrix<f64>) -> DMatrix<f64> {
        DMatrix::from_fn(x.nrows(), x.ncols(), |r, c| {
            (x[(r, c)] - self.mean[c]) / self.scale[c]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_columns_keep_unit_scale() {
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 5.0, 2.0, 5.0, 3.0, 5.0]);
        let scaler = Standardizer::fit(&x);
        assert_eq!(scaler.scale[1], 1.0);
        let z = scaler.transform(&x);
        assert_eq!(z[(1, 0)], 0.0);
        assert_eq!(z[(2, 1)], 0.0);
    }
}
