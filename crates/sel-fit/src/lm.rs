//! Weighted Levenberg–Marquardt least squares.

use nalgebra::{DMatrix, DVector};
use sel_core::errors::{ErrorInfo, SelError};
use serde::{Deserialize, Serialize};

use crate::model::{BinnedData, FitModel};
use crate::params::ParameterSet;

const LAMBDA_START: f64 = 1e-3;
const LAMBDA_MAX: f64 = 1e16;

/// Solver stopping rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOpts {
    /// Upper bound on Jacobian evaluations.
    pub max_iterations: usize,
    /// Relative chi-square reduction below which the fit has converged.
    pub ftol: f64,
    /// Relative step size below which the fit has converged.
    pub xtol: f64,
}

impl Default for SolverOpts {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            ftol: 1e-10,
            xtol: 1e-10,
        }
    }
}

impl SolverOpts {
    /// Rejects non-positive tolerances and a zero iteration budget.
    pub fn validate(&self) -> Result<(), SelError> {
        if self.max_iterations == 0 {
            return Err(SelError::Config(ErrorInfo::new(
                "solver-iterations",
                "max_iterations must be at least 1",
            )));
        }
        for (name, value) in [("ftol", self.ftol), ("xtol", self.xtol)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(SelError::Config(
                    ErrorInfo::new("solver-tolerance", "tolerances must be finite and positive")
                        .with_context(name, value.to_string()),
                ));
            }
        }
        Ok(())
    }
}

/// Correlation between two free parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correlation {
    /// First parameter name.
    pub first: String,
    /// Second parameter name.
    pub second: String,
    /// Correlation coefficient in `[-1, 1]`.
    pub value: f64,
}

/// Goodness-of-fit and convergence information.
///
/// A fit that did not converge is still returned; callers decide whether to
/// trust it from these numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitDiagnostics {
    /// Solver name.
    pub method: String,
    /// Whether a tolerance criterion was met.
    pub converged: bool,
    /// Termination reason.
    pub message: String,
    /// Model evaluations over the whole data set.
    pub nfev: usize,
    /// Jacobian evaluations.
    pub iterations: usize,
    /// Number of data points.
    pub ndata: usize,
    /// Number of free parameters.
    pub nvarys: usize,
    /// Degrees of freedom.
    pub nfree: usize,
    /// Weighted sum of squared residuals.
    pub chisqr: f64,
    /// `chisqr / nfree`.
    pub redchi: f64,
    /// Akaike information criterion.
    pub aic: f64,
    /// Bayesian information criterion.
    pub bic: f64,
    /// Covariance of the free parameters scaled by `redchi`, in free-parameter order.
    pub covariance: Option<Vec<Vec<f64>>>,
    /// Pairwise correlations of the free parameters.
    pub correlations: Vec<Correlation>,
}

/// Best-fit parameters with their diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    /// Formula of the fitted model.
    pub formula: String,
    /// Best-fit parameters, `stderr` filled when the covariance exists.
    pub params: ParameterSet,
    /// Solver diagnostics.
    pub diagnostics: FitDiagnostics,
}

impl FitResult {
    /// Covariance entry for two parameters given by model position.
    pub fn covariance(&self, first: usize, second: usize) -> Option<f64> {
        let free = self.params.free_indices();
        let i = free.iter().position(|idx| *idx == first)?;
        let j = free.iter().position(|idx| *idx == second)?;
        self.diagnostics.covariance.as_ref().map(|cov| cov[i][j])
    }
}

/// Capability that fits a model to binned data starting from seeded parameters.
pub trait Fitter {
    /// Minimises the weighted residuals `(y - f(x)) / sigma`.
    fn fit(
        &self,
        model: &dyn FitModel,
        seeds: &ParameterSet,
        data: &BinnedData,
    ) -> Result<FitResult, SelError>;
}

/// Levenberg–Marquardt with Marquardt diagonal scaling and a central-difference Jacobian.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LevenbergMarquardt {
    /// Stopping rules.
    pub opts: SolverOpts,
}

impl LevenbergMarquardt {
    /// Solver with the given stopping rules.
    pub fn new(opts: SolverOpts) -> Self {
        Self { opts }
    }
}

struct Problem<'a> {
    model: &'a dyn FitModel,
    data: &'a BinnedData,
    base: Vec<f64>,
    free: Vec<usize>,
}

impl Problem<'_> {
    fn expand(&self, free_values: &DVector<f64>) -> Vec<f64> {
        let mut values = self.base.clone();
        for (slot, idx) in self.free.iter().enumerate() {
            values[*idx] = free_values[slot];
        }
        values
    }

    fn residuals(&self, free_values: &DVector<f64>) -> DVector<f64> {
        let values = self.expand(free_values);
        DVector::from_iterator(
            self.data.len(),
            (0..self.data.len()).map(|i| {
                (self.data.y[i] - self.model.eval(&values, self.data.x[i])) / self.data.sigma[i]
            }),
        )
    }

    fn jacobian(&self, free_values: &DVector<f64>) -> DMatrix<f64> {
        let step_scale = f64::EPSILON.cbrt();
        let mut jac = DMatrix::zeros(self.data.len(), self.free.len());
        for col in 0..self.free.len() {
            let h = step_scale * free_values[col].abs().max(1e-3);
            let mut plus = free_values.clone();
            plus[col] += h;
            let mut minus = free_values.clone();
            minus[col] -= h;
            let diff = (self.residuals(&plus) - self.residuals(&minus)) / (2.0 * h);
            jac.set_column(col, &diff);
        }
        jac
    }
}

fn fit_error(code: &str, message: &str) -> SelError {
    SelError::Fit(ErrorInfo::new(code, message))
}

fn validate_data(data: &BinnedData) -> Result<(), SelError> {
    if data.y.len() != data.x.len() || data.sigma.len() != data.x.len() {
        return Err(SelError::Shape(
            ErrorInfo::new("fit-data-length", "x, y and sigma must have equal length")
                .with_context("x", data.x.len().to_string())
                .with_context("y", data.y.len().to_string())
                .with_context("sigma", data.sigma.len().to_string()),
        ));
    }
    if data.is_empty() {
        return Err(fit_error("empty-fit-data", "no data points to fit"));
    }
    if let Some(idx) = data
        .sigma
        .iter()
        .position(|sigma| !(sigma.is_finite() && *sigma > 0.0))
    {
        return Err(SelError::Fit(
            ErrorInfo::new("invalid-uncertainty", "every point needs a finite positive uncertainty")
                .with_context("point", idx.to_string())
                .with_hint("exclude zero-count bins before fitting"),
        ));
    }
    Ok(())
}

impl Fitter for LevenbergMarquardt {
    fn fit(
        &self,
        model: &dyn FitModel,
        seeds: &ParameterSet,
        data: &BinnedData,
    ) -> Result<FitResult, SelError> {
        self.opts.validate()?;
        validate_data(data)?;
        if seeds.len() != model.parameter_names().len() {
            return Err(SelError::Shape(
                ErrorInfo::new("parameter-count", "parameter set does not match the model")
                    .with_context("expected", model.parameter_names().len().to_string())
                    .with_context("got", seeds.len().to_string()),
            ));
        }
        let problem = Problem {
            model,
            data,
            base: seeds.values(),
            free: seeds.free_indices(),
        };
        let nvarys = problem.free.len();
        let ndata = data.len();
        if nvarys == 0 {
            return Err(fit_error("no-free-parameters", "every parameter is fixed"));
        }
        if ndata <= nvarys {
            return Err(SelError::Fit(
                ErrorInfo::new("too-few-points", "need more data points than free parameters")
                    .with_context("points", ndata.to_string())
                    .with_context("variables", nvarys.to_string()),
            ));
        }

        let start = problem.free.iter().map(|idx| problem.base[*idx]);
        let mut p = DVector::from_iterator(nvarys, start);
        let mut r = problem.residuals(&p);
        let mut chi2 = r.norm_squared();
        if !chi2.is_finite() {
            return Err(fit_error("non-finite-residual", "model is not finite at the seed values"));
        }

        let mut lambda = LAMBDA_START;
        let mut nfev = 1;
        let mut iterations = 0;
        let mut converged = false;
        let mut message = String::new();

        while iterations < self.opts.max_iterations {
            iterations += 1;
            let jac = problem.jacobian(&p);
            nfev += 2 * nvarys;
            let jtj = jac.transpose() * &jac;
            let rhs = -(jac.transpose() * &r);

            let mut accepted = false;
            loop {
                let mut damped = jtj.clone();
                for j in 0..nvarys {
                    let diag = jtj[(j, j)];
                    damped[(j, j)] += lambda * if diag > 0.0 { diag } else { 1.0 };
                }
                let Some(factor) = damped.cholesky() else {
                    lambda *= 10.0;
                    if lambda > LAMBDA_MAX {
                        message = "normal equations stayed singular".into();
                        break;
                    }
                    continue;
                };
                let step = factor.solve(&rhs);
                let trial = &p + &step;
                let trial_r = problem.residuals(&trial);
                nfev += 1;
                let trial_chi2 = trial_r.norm_squared();
                let small_step = step.norm() <= self.opts.xtol * (p.norm() + self.opts.xtol);

                if trial_chi2.is_finite() && trial_chi2 <= chi2 {
                    let reduction = chi2 - trial_chi2;
                    let previous = chi2;
                    p = trial;
                    r = trial_r;
                    chi2 = trial_chi2;
                    lambda = (lambda / 10.0).max(1e-12);
                    accepted = true;
                    if reduction <= self.opts.ftol * previous {
                        converged = true;
                        message = "relative reduction in chi-square is below ftol".into();
                    } else if small_step {
                        converged = true;
                        message = "relative step size is below xtol".into();
                    }
                    break;
                }
                if small_step {
                    converged = true;
                    message = "relative step size is below xtol".into();
                    break;
                }
                lambda *= 10.0;
                if lambda > LAMBDA_MAX {
                    message = "damping grew without reducing chi-square".into();
                    break;
                }
            }
            tracing::debug!(iteration = iterations, chi2, lambda, "levenberg-marquardt step");
            if converged || !accepted {
                break;
            }
        }
        if !converged && message.is_empty() {
            message = format!("reached max_iterations ({})", self.opts.max_iterations);
        }

        let nfree = ndata - nvarys;
        let redchi = chi2 / nfree as f64;
        let jac = problem.jacobian(&p);
        nfev += 2 * nvarys;
        let covariance = (jac.transpose() * &jac)
            .cholesky()
            .map(|factor| factor.inverse() * redchi)
            .filter(|cov| (0..nvarys).all(|j| cov[(j, j)].is_finite() && cov[(j, j)] > 0.0));

        let mut params = seeds.clone();
        let values = problem.expand(&p);
        for (param, value) in params.params_mut().iter_mut().zip(&values) {
            param.value = *value;
            param.stderr = None;
        }
        let mut correlations = Vec::new();
        if let Some(cov) = &covariance {
            for (slot, idx) in problem.free.iter().enumerate() {
                params.params_mut()[*idx].stderr = Some(cov[(slot, slot)].sqrt());
            }
            for i in 0..nvarys {
                for j in (i + 1)..nvarys {
                    correlations.push(Correlation {
                        first: model.parameter_names()[problem.free[i]].to_string(),
                        second: model.parameter_names()[problem.free[j]].to_string(),
                        value: cov[(i, j)] / (cov[(i, i)] * cov[(j, j)]).sqrt(),
                    });
                }
            }
        }

        let n = ndata as f64;
        let neg2_log_like = n * (chi2.max(1e-250) / n).ln();
        let diagnostics = FitDiagnostics {
            method: "levenberg-marquardt".into(),
            converged,
            message,
            nfev,
            iterations,
            ndata,
            nvarys,
            nfree,
            chisqr: chi2,
            redchi,
            aic: neg2_log_like + 2.0 * nvarys as f64,
            bic: neg2_log_like + n.ln() * nvarys as f64,
            covariance: covariance.map(|cov| {
                (0..nvarys)
                    .map(|i| (0..nvarys).map(|j| cov[(i, j)]).collect())
                    .collect()
            }),
            correlations,
        };
        tracing::debug!(
            converged = diagnostics.converged,
            chisqr = diagnostics.chisqr,
            nfev = diagnostics.nfev,
            "fit finished"
        );

        Ok(FitResult {
            formula: model.formula().to_string(),
            params,
            diagnostics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Line;

    impl FitModel for Line {
        fn parameter_names(&self) -> &[&'static str] {
            &["slope", "intercept"]
        }

        fn formula(&self) -> &str {
            "slope*x + intercept"
        }

        fn eval(&self, values: &[f64], x: f64) -> f64 {
            values[0] * x + values[1]
        }
    }

    struct Decay;

    impl FitModel for Decay {
        fn parameter_names(&self) -> &[&'static str] {
            &["amplitude", "rate"]
        }

        fn formula(&self) -> &str {
            "amplitude*exp(-rate*x)"
        }

        fn eval(&self, values: &[f64], x: f64) -> f64 {
            values[0] * (-values[1] * x).exp()
        }
    }

    fn line_data() -> BinnedData {
        let x: Vec<f64> = (0..10).map(f64::from).collect();
        let y = x.iter().map(|x| 2.0 * x + 1.0).collect();
        BinnedData {
            sigma: vec![1.0; x.len()],
            x,
            y,
        }
    }

    #[test]
    fn recovers_exact_line() {
        let mut seeds = ParameterSet::new();
        seeds.add("slope", 0.0).add("intercept", 0.0);
        let result = LevenbergMarquardt::default().fit(&Line, &seeds, &line_data()).unwrap();
        assert!(result.diagnostics.converged, "{}", result.diagnostics.message);
        assert!((result.params.value("slope").unwrap() - 2.0).abs() < 1e-6);
        assert!((result.params.value("intercept").unwrap() - 1.0).abs() < 1e-6);
        assert!(result.diagnostics.chisqr < 1e-10);
        assert_eq!(result.diagnostics.nfree, 8);
    }

    #[test]
    fn fixed_parameters_do_not_move() {
        let mut seeds = ParameterSet::new();
        seeds.add("slope", 0.0).add_fixed("intercept", 0.0);
        let result = LevenbergMarquardt::default().fit(&Line, &seeds, &line_data()).unwrap();
        assert_eq!(result.params.value("intercept").unwrap(), 0.0);
        assert!(result.params.get("intercept").unwrap().stderr.is_none());
        assert!(result.params.get("slope").unwrap().stderr.is_some());
        assert!(result.diagnostics.correlations.is_empty());
    }

    #[test]
    fn nonlinear_decay_with_weights() {
        let x: Vec<f64> = (0..30).map(|i| f64::from(i) * 0.2).collect();
        let y: Vec<f64> = x.iter().map(|x| 50.0 * (-0.7 * x).exp()).collect();
        let sigma = y.iter().map(|y| y.sqrt().max(1.0)).collect();
        let data = BinnedData { x, y, sigma };
        let mut seeds = ParameterSet::new();
        seeds.add("amplitude", 10.0).add("rate", 0.1);
        let result = LevenbergMarquardt::default().fit(&Decay, &seeds, &data).unwrap();
        assert!(result.diagnostics.converged);
        assert!((result.params.value("amplitude").unwrap() - 50.0).abs() < 1e-4);
        assert!((result.params.value("rate").unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn covariance_matches_weighted_linear_regression() {
        let x = vec![0.0, 1.0, 2.0, 3.0];
        let y = vec![1.0, 2.9, 5.2, 6.8];
        let data = BinnedData {
            x,
            y,
            sigma: vec![1.0; 4],
        };
        let mut seeds = ParameterSet::new();
        seeds.add("slope", 1.0).add("intercept", 0.0);
        let result = LevenbergMarquardt::default().fit(&Line, &seeds, &data).unwrap();
        // Ordinary least squares: slope 1.97, intercept 1.02, residual sum 0.083.
        assert!((result.params.value("slope").unwrap() - 1.97).abs() < 1e-6);
        assert!((result.params.value("intercept").unwrap() - 1.02).abs() < 1e-6);
        let redchi = result.diagnostics.redchi;
        assert!((redchi - 0.0415).abs() < 1e-6);
        let slope_err = result.params.get("slope").unwrap().stderr.unwrap();
        assert!((slope_err - (redchi / 5.0).sqrt()).abs() < 1e-6);
        let corr = &result.diagnostics.correlations[0];
        assert_eq!((corr.first.as_str(), corr.second.as_str()), ("slope", "intercept"));
        assert!(corr.value < 0.0);
    }

    #[test]
    fn zero_uncertainty_is_rejected() {
        let mut data = line_data();
        data.sigma[3] = 0.0;
        let mut seeds = ParameterSet::new();
        seeds.add("slope", 0.0).add("intercept", 0.0);
        let err = LevenbergMarquardt::default().fit(&Line, &seeds, &data).unwrap_err();
        assert_eq!(err.info().code, "invalid-uncertainty");
    }

    #[test]
    fn underdetermined_fit_is_an_error() {
        let data = BinnedData {
            x: vec![0.0, 1.0],
            y: vec![1.0, 2.0],
            sigma: vec![1.0, 1.0],
        };
        let mut seeds = ParameterSet::new();
        seeds.add("slope", 0.0).add("intercept", 0.0);
        let err = LevenbergMarquardt::default().fit(&Line, &seeds, &data).unwrap_err();
        assert!(matches!(err, SelError::Fit(_)));
    }

    #[test]
    fn iteration_budget_is_reported() {
        let x: Vec<f64> = (0..30).map(|i| f64::from(i) * 0.2).collect();
        let y: Vec<f64> = x.iter().map(|x| 50.0 * (-0.7 * x).exp()).collect();
        let data = BinnedData {
            sigma: vec![1.0; x.len()],
            x,
            y,
        };
        let mut seeds = ParameterSet::new();
        seeds.add("amplitude", 1.0).add("rate", 3.0);
        let opts = SolverOpts {
            max_iterations: 1,
            ..SolverOpts::default()
        };
        let result = LevenbergMarquardt::new(opts).fit(&Decay, &seeds, &data).unwrap();
        assert!(!result.diagnostics.converged);
        assert_eq!(result.diagnostics.iterations, 1);
    }
}
