use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, SelError};

fn shape_info(code: &str, message: impl Into<String>) -> ErrorInfo {
    ErrorInfo::new(code, message.into())
}

/// Binary ground truth attached to training and evaluation rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    /// Sideband data, assumed free of true signal.
    Background,
    /// Simulated true signal.
    Signal,
}

impl Label {
    /// Returns the numeric target used by the loss (0 or 1).
    pub fn target(self) -> f64 {
        match self {
            Label::Background => 0.0,
            Label::Signal => 1.0,
        }
    }

    /// Returns `true` for [`Label::Signal`].
    pub fn is_signal(self) -> bool {
        matches!(self, Label::Signal)
    }
}

/// Dense row-major feature matrix with named columns.
///
/// Column order is part of the contract: a classifier trained on one order
/// must be fed the identical order at inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    rows: usize,
    data: Vec<f64>,
}

impl FeatureMatrix {
    /// Creates an empty matrix with the given column layout.
    pub fn empty(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: 0,
            data: Vec::new(),
        }
    }

    /// Stacks equally long column slices side by side.
    pub fn from_columns(columns: Vec<String>, values: &[&[f64]]) -> Result<Self, SelError> {
        if columns.len() != values.len() {
            return Err(SelError::Shape(shape_info(
                "column-count",
                "number of column names and column slices differ",
            )));
        }
        let rows = values.first().map(|col| col.len()).unwrap_or(0);
        if let Some((idx, _)) = values
            .iter()
            .enumerate()
            .find(|(_, col)| col.len() != rows)
        {
            return Err(SelError::Shape(
                shape_info("ragged-columns", "columns have different lengths")
                    .with_context("column", columns[idx].clone())
                    .with_context("expected_rows", rows.to_string()),
            ));
        }
        let mut data = Vec::with_capacity(rows * columns.len());
        for row in 0..rows {
            data.extend(values.iter().map(|col| col[row]));
        }
        Ok(Self {
            columns,
            rows,
            data,
        })
    }

    /// Number of rows (events).
    pub fn n_rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (features).
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Ordered column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns row `idx`.
    pub fn row(&self, idx: usize) -> &[f64] {
        let width = self.n_cols();
        &self.data[idx * width..(idx + 1) * width]
    }

    /// Iterates over rows in order.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.rows).map(move |idx| self.row(idx))
    }

    /// Row-major backing storage.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Copies out a contiguous range of rows.
    pub fn slice_rows(&self, range: Range<usize>) -> Self {
        let width = self.n_cols();
        let start = range.start.min(self.rows);
        let end = range.end.clamp(start, self.rows);
        Self {
            columns: self.columns.clone(),
            rows: end - start,
            data: self.data[start * width..end * width].to_vec(),
        }
    }

    /// Appends the rows of `other` below the rows of `self`.
    pub fn concat(&self, other: &FeatureMatrix) -> Result<Self, SelError> {
        self.ensure_same_columns(other.columns())?;
        let mut data = Vec::with_capacity(self.data.len() + other.data.len());
        data.extend_from_slice(&self.data);
        data.extend_from_slice(&other.data);
        Ok(Self {
            columns: self.columns.clone(),
            rows: self.rows + other.rows,
            data,
        })
    }

    /// Fails with a shape error unless the column layout equals `expected`.
    pub fn ensure_same_columns(&self, expected: &[String]) -> Result<(), SelError> {
        if self.columns != expected {
            return Err(SelError::Shape(
                shape_info("column-layout", "feature columns differ in name or order")
                    .with_context("expected", expected.join(","))
                    .with_context("found", self.columns.join(",")),
            ));
        }
        Ok(())
    }
}

/// Feature matrix paired with one label per row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledSet {
    /// Feature rows.
    pub features: FeatureMatrix,
    /// Ground-truth label per row.
    pub labels: Vec<Label>,
}

impl LabeledSet {
    /// Pairs features with labels, checking that the row counts agree.
    pub fn new(features: FeatureMatrix, labels: Vec<Label>) -> Result<Self, SelError> {
        if features.n_rows() != labels.len() {
            return Err(SelError::Shape(
                shape_info("label-count", "labels and feature rows differ")
                    .with_context("rows", features.n_rows().to_string())
                    .with_context("labels", labels.len().to_string()),
            ));
        }
        Ok(Self { features, labels })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns `true` when the set holds no rows.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of signal-labelled rows.
    pub fn positives(&self) -> usize {
        self.labels.iter().filter(|label| label.is_signal()).count()
    }

    /// Number of background-labelled rows.
    pub fn negatives(&self) -> usize {
        self.len() - self.positives()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn stacking_keeps_column_order() {
        let a = [1.0, 2.0, 3.0];
        let b = [10.0, 20.0, 30.0];
        let matrix = FeatureMatrix::from_columns(names(&["a", "b"]), &[&a, &b]).unwrap();
        assert_eq!(matrix.n_rows(), 3);
        assert_eq!(matrix.row(1), &[2.0, 20.0]);
    }

    #[test]
    fn ragged_columns_are_rejected() {
        let a = [1.0, 2.0];
        let b = [1.0];
        let err = FeatureMatrix::from_columns(names(&["a", "b"]), &[&a, &b]).unwrap_err();
        assert_eq!(err.info().code, "ragged-columns");
    }

    #[test]
    fn concat_requires_identical_layout() {
        let left = FeatureMatrix::empty(names(&["a", "b"]));
        let right = FeatureMatrix::empty(names(&["b", "a"]));
        assert!(matches!(left.concat(&right), Err(SelError::Shape(_))));
    }

    #[test]
    fn slicing_clamps_to_bounds() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let matrix = FeatureMatrix::from_columns(names(&["a"]), &[&a]).unwrap();
        let tail = matrix.slice_rows(3..10);
        assert_eq!(tail.as_slice(), &[4.0]);
    }

    #[test]
    fn labeled_set_checks_lengths() {
        let a = [1.0, 2.0];
        let matrix = FeatureMatrix::from_columns(names(&["a"]), &[&a]).unwrap();
        assert!(LabeledSet::new(matrix.clone(), vec![Label::Signal]).is_err());
        let set = LabeledSet::new(matrix, vec![Label::Signal, Label::Background]).unwrap();
        assert_eq!(set.positives(), 1);
        assert_eq!(set.negatives(), 1);
    }
}
