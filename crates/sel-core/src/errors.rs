//! Structured error types shared across the selection crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Payload of every [`SelError`]: a stable code, a message and the
/// source/column/count details needed to locate the problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Kebab-case code, stable across releases (`missing-column`, `fit-window`, ...).
    pub code: String,
    /// One-line description.
    pub message: String,
    /// Location details such as `source`, `column`, `row` or expected counts.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, String>,
    /// What to change in the inputs or configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Payload with a code and message and no details.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Records a detail; counts and thresholds can be passed directly.
    pub fn with_context(mut self, key: &str, value: impl ToString) -> Self {
        self.context.insert(key.to_string(), value.to_string());
        self
    }

    /// Attaches a remediation hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the selection pipeline.
///
/// Solver convergence problems are deliberately absent: they are reported
/// through fit diagnostics rather than raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum SelError {
    /// A required column is missing or holds non-numeric data.
    #[error("schema error: {0}")]
    Schema(ErrorInfo),
    /// Row or column counts disagree between stages.
    #[error("shape error: {0}")]
    Shape(ErrorInfo),
    /// Invalid configuration values.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// Classifier training failures.
    #[error("training error: {0}")]
    Training(ErrorInfo),
    /// Evaluation failures such as a ROC curve missing one class.
    #[error("evaluation error: {0}")]
    Evaluation(ErrorInfo),
    /// Least-squares solver failures.
    #[error("fit error: {0}")]
    Fit(ErrorInfo),
    /// Filesystem access errors.
    #[error("io error: {0}")]
    Io(ErrorInfo),
    /// Serialization and decoding errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        let mut details = self.context.iter();
        if let Some((key, value)) = details.next() {
            write!(f, " ({key}={value}")?;
            for (key, value) in details {
                write!(f, ", {key}={value}")?;
            }
            write!(f, ")")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, "; hint: {hint}")?;
        }
        Ok(())
    }
}

impl SelError {
    /// Lower-case family name, as printed before the payload.
    pub fn family(&self) -> &'static str {
        match self {
            SelError::Schema(_) => "schema",
            SelError::Shape(_) => "shape",
            SelError::Config(_) => "config",
            SelError::Training(_) => "training",
            SelError::Evaluation(_) => "evaluation",
            SelError::Fit(_) => "fit",
            SelError::Io(_) => "io",
            SelError::Serde(_) => "serde",
        }
    }

    /// Whether the error comes from the inputs or configuration rather than
    /// from a computation on valid inputs.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            SelError::Schema(_) | SelError::Shape(_) | SelError::Config(_) | SelError::Io(_)
        )
    }

    /// The payload.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            SelError::Schema(info)
            | SelError::Shape(info)
            | SelError::Config(info)
            | SelError::Training(info)
            | SelError::Evaluation(info)
            | SelError::Fit(info)
            | SelError::Io(info)
            | SelError::Serde(info) => info,
        }
    }

    /// I/O failure on `path`.
    pub fn io(path: &std::path::Path, err: impl ToString) -> Self {
        SelError::Io(ErrorInfo::new("io", err.to_string()).with_context("path", path.display()))
    }
}
