//! Named fit parameters.

use sel_core::errors::{ErrorInfo, SelError};
use serde::{Deserialize, Serialize};

/// One model parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitParameter {
    /// Parameter name as used by the model.
    pub name: String,
    /// Current (or best-fit) value.
    pub value: f64,
    /// Seed value the fit started from.
    pub init_value: f64,
    /// Whether the solver may move this parameter.
    pub vary: bool,
    /// Standard error from the scaled covariance, when available.
    pub stderr: Option<f64>,
}

/// Ordered collection of parameters; order matches the model's parameter order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    params: Vec<FitParameter>,
}

impl ParameterSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a free parameter.
    pub fn add(&mut self, name: impl Into<String>, value: f64) -> &mut Self {
        self.push(name.into(), value, true)
    }

    /// Appends a parameter held at `value`.
    pub fn add_fixed(&mut self, name: impl Into<String>, value: f64) -> &mut Self {
        self.push(name.into(), value, false)
    }

    fn push(&mut self, name: String, value: f64, vary: bool) -> &mut Self {
        self.params.push(FitParameter {
            name,
            value,
            init_value: value,
            vary,
            stderr: None,
        });
        self
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// True when no parameter has been added.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterates the parameters in model order.
    pub fn iter(&self) -> impl Iterator<Item = &FitParameter> + '_ {
        self.params.iter()
    }

    /// Looks up a parameter by name.
    pub fn get(&self, name: &str) -> Option<&FitParameter> {
        self.params.iter().find(|param| param.name == name)
    }

    /// Value of the named parameter, or a `Fit` error if it does not exist.
    pub fn value(&self, name: &str) -> Result<f64, SelError> {
        self.get(name).map(|param| param.value).ok_or_else(|| {
            SelError::Fit(
                ErrorInfo::new("unknown-parameter", "parameter is not part of the set")
                    .with_context("name", name),
            )
        })
    }

    /// All values in model order.
    pub fn values(&self) -> Vec<f64> {
        self.params.iter().map(|param| param.value).collect()
    }

    /// Positions of the parameters the solver may move.
    pub fn free_indices(&self) -> Vec<usize> {
        self.params
            .iter()
            .enumerate()
            .filter(|(_, param)| param.vary)
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Number of free parameters.
    pub fn nvarys(&self) -> usize {
        self.params.iter().filter(|param| param.vary).count()
    }

    pub(crate) fn params_mut(&mut self) -> &mut [FitParameter] {
        &mut self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_indices_skip_fixed_parameters() {
        let mut set = ParameterSet::new();
        set.add("a", 1.0).add_fixed("mean", 5280.0).add("width", 20.0);
        assert_eq!(set.free_indices(), vec![0, 2]);
        assert_eq!(set.nvarys(), 2);
        assert_eq!(set.value("mean").unwrap(), 5280.0);
        assert!(matches!(set.value("sigma"), Err(SelError::Fit(_))));
    }
}
