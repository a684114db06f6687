//! Schema-validated record sets: named numeric columns, one row per event.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use sel_core::errors::{ErrorInfo, SelError};
use sel_core::hash::ContentHasher;
use sel_core::FeatureMatrix;

fn schema_error(code: &str, message: impl Into<String>) -> ErrorInfo {
    ErrorInfo::new(code, message.into())
}

/// Table of named numeric columns sharing one row count.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSet {
    name: String,
    order: Vec<String>,
    columns: BTreeMap<String, Vec<f64>>,
    rows: usize,
}


impl RecordSet {
    /// Builds a record set from `(column name, values)` pairs in file order.
    pub fn new(
        name: impl Into<String>,
        columns: Vec<(String, Vec<f64>)>,
    ) -> Result<Self, SelError> {
        let name = name.into();
        let rows = columns.first().map(|(_, values)| values.len()).unwrap_or(0);
        let mut order = Vec::with_capacity(columns.len());
        let mut map = BTreeMap::new();
        for (column, values) in columns {
            if values.len() != rows {
                return Err(SelError::Shape(
                    ErrorInfo::new("ragged-record-set", "columns have different lengths")
                        .with_context("source", name.clone())
                        .with_context("column", column)
                        .with_context("expected_rows", rows.to_string())
                        .with_context("found_rows", values.len().to_string()),
                ));
            }
            if map.contains_key(&column) {
                return Err(SelError::Schema(
                    schema_error("duplicate-column", "column name appears twice")
                        .with_context("source", name.clone())
                        .with_context("column", column),
                ));
            }
            order.push(column.clone());
            map.insert(column, values);
        }
        Ok(Self {
            name,
            order,
            columns: map,
            rows,
        })
    }

    /// Loads a comma separated file whose header names the columns.
    pub fn from_csv_path(name: impl Into<String>, path: &Path) -> Result<Self, SelError> {
        let file = File::open(path).map_err(|err| SelError::io(path, err))?;
        let set = Self::from_csv_reader(name, file)?;
        tracing::info!(
            source = %set.name,
            path = %path.display(),
            rows = set.rows,
            columns = set.order.len(),
            "loaded record set"
        );
        Ok(set)
    }

    /// Parses comma separated data from any reader.
    pub fn from_csv_reader<R: Read>(name: impl Into<String>, reader: R) -> Result<Self, SelError> {
        let name = name.into();
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers: Vec<String> = csv_reader
            .headers()
            .map_err(|err| csv_error(&name, err))?
            .iter()
            .map(str::to_string)
            .collect();
        let mut values: Vec<Vec<f64>> = vec![Vec::new(); headers.len()];
        for (row, record) in csv_reader.records().enumerate() {
            let record = record.map_err(|err| csv_error(&name, err))?;
            for (idx, field) in record.iter().enumerate() {
                let value = field.parse::<f64>().map_err(|_| {
                    SelError::Schema(
                        schema_error("non-numeric-value", "column holds a non-numeric value")
                            .with_context("source", name.clone())
                            .with_context("column", headers[idx].clone())
                            .with_context("row", row.to_string())
                            .with_context("value", field.to_string()),
                    )
                })?;
                values[idx].push(value);
            }
        }
        Self::new(name, headers.into_iter().zip(values).collect())
    }

    /// Writes the record set as comma separated text in column order.
    pub fn write_csv(&self, path: &Path) -> Result<(), SelError> {
        let mut writer = csv::Writer::from_path(path).map_err(|err| SelError::io(path, err))?;
        writer
            .write_record(&self.order)
            .map_err(|err| SelError::io(path, err))?;
        for row in 0..self.rows {
            let record: Vec<String> = self
                .order
                .iter()
                .map(|column| self.columns[column][row].to_string())
                .collect();
            writer
                .write_record(&record)
                .map_err(|err| SelError::io(path, err))?;
        }
        writer.flush().map_err(|err| SelError::io(path, err))
    }

    /// Source name used in diagnostics and provenance.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of rows (events).
    pub fn n_rows(&self) -> usize {
        self.rows
    }

    /// Column names in file order.
    pub fn column_names(&self) -> &[String] {
        &self.order
    }

    /// Returns `true` when the column exists.
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    /// Fails with a schema error naming every column in `required` that is absent.
    pub fn require<S: AsRef<str>>(&self, required: &[S]) -> Result<(), SelError> {
        let missing: BTreeSet<&str> = required
            .iter()
            .map(|column| column.as_ref())
            .filter(|column| !self.has_column(column))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        Err(SelError::Schema(
            schema_error("missing-column", "required columns are absent from the record set")
                .with_context("source", self.name.clone())
                .with_context("missing", missing.into_iter().collect::<Vec<_>>().join(","))
                .with_hint("all sources must share the feature-column schema"),
        ))
    }

    /// Returns the values of one column.
    pub fn column(&self, column: &str) -> Result<&[f64], SelError> {
        self.columns
            .get(column)
            .map(Vec::as_slice)
            .ok_or_else(|| {
                SelError::Schema(
                    schema_error("missing-column", "column not found")
                        .with_context("source", self.name.clone())
                        .with_context("missing", column.to_string()),
                )
            })
    }

    /// Stacks the named columns, in the given order, into a feature matrix.
    pub fn stack(&self, columns: &[String]) -> Result<FeatureMatrix, SelError> {
        self.require(columns)?;
        let slices: Vec<&[f64]> = columns
            .iter()
            .map(|column| self.columns[column].as_slice())
            .collect();
        FeatureMatrix::from_columns(columns.to_vec(), &slices)
    }

    /// SHA-256 of the column contents, independent of file column order and
    /// of the record set's name.
    pub fn canonical_hash(&self) -> String {
        let mut hasher = ContentHasher::new("record-set");
        for (name, values) in &self.columns {
            hasher.column(name, values);
        }
        hasher.finish()
    }
}

fn csv_error(source: &str, err: csv::Error) -> SelError {
    let info = ErrorInfo::new("csv", err.to_string()).with_context("source", source.to_string());
    if err.is_io_error() {
        SelError::Io(info)
    } else {
        SelError::Serde(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "B0_MM, K_PT ,BDT\n5279.1,1200.5,0.9\n5301.0,900.0,0.1\n";

    #[test]
    fn parses_header_and_rows() {
        let set = RecordSet::from_csv_reader("data", SAMPLE.as_bytes()).unwrap();
        assert_eq!(set.n_rows(), 2);
        assert_eq!(set.column_names(), &["B0_MM", "K_PT", "BDT"]);
        assert_eq!(set.column("K_PT").unwrap(), &[1200.5, 900.0]);
    }

    #[test]
    fn non_numeric_fields_are_schema_errors() {
        let err = RecordSet::from_csv_reader("data", "a,b\n1,x\n".as_bytes()).unwrap_err();
        assert_eq!(err.info().code, "non-numeric-value");
        assert_eq!(err.info().context["column"], "b");
    }

    #[test]
    fn require_lists_every_missing_column() {
        let set = RecordSet::from_csv_reader("data", SAMPLE.as_bytes()).unwrap();
        let err = set.require(&["B0_MM", "Pi_PT", "K_PIDK"]).unwrap_err();
        assert!(matches!(err, SelError::Schema(_)));
        assert_eq!(err.info().context["missing"], "K_PIDK,Pi_PT");
    }

    #[test]
    fn stack_follows_requested_order() {
        let set = RecordSet::from_csv_reader("data", SAMPLE.as_bytes()).unwrap();
        let matrix = set.stack(&["BDT".to_string(), "B0_MM".to_string()]).unwrap();
        assert_eq!(matrix.row(0), &[0.9, 5279.1]);
    }

    #[test]
    fn hash_ignores_file_column_order() {
        let a = RecordSet::from_csv_reader("a", "x,y\n1,2\n".as_bytes()).unwrap();
        let b = RecordSet::from_csv_reader("b", "y,x\n2,1\n".as_bytes()).unwrap();
        assert_eq!(a.canonical_hash(), b.canonical_hash());
    }

    #[test]
    fn duplicate_columns_are_rejected() {
        let err = RecordSet::new(
            "dup",
            vec![("a".into(), vec![1.0]), ("a".into(), vec![2.0])],
        )
        .unwrap_err();
        assert_eq!(err.info().code, "duplicate-column");
    }
}
