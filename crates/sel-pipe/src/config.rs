use std::fs;
use std::path::Path;

use sel_core::errors::{ErrorInfo, SelError};
use sel_core::hash::document_hash;
use sel_core::serde::{from_yaml_slice, to_yaml_string};
use sel_data::{AssemblyOpts, FEATURE_COLUMNS};
use sel_fit::ExtractionOpts;
use sel_nn::{NetworkSpec, TrainingOpts};
use serde::{Deserialize, Serialize};

fn default_features() -> Vec<String> {
    FEATURE_COLUMNS.iter().map(|column| column.to_string()).collect()
}

fn default_split_fraction() -> f64 {
    0.8
}

fn default_mass_column() -> String {
    "B0_MM".to_string()
}

fn default_baseline_column() -> Option<String> {
    Some("BDT".to_string())
}

fn default_score_bins() -> usize {
    50
}

/// Thresholds of the data-driven efficiency scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanSpec {
    /// Score thresholds; the scan is skipped when empty.
    #[serde(default)]
    pub thresholds: Vec<f64>,
}

/// Every tunable of a pipeline run; an empty YAML document yields the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Ordered feature columns fed to the classifier.
    #[serde(default = "default_features")]
    pub features: Vec<String>,
    /// Leading fraction of each labelled source used for training.
    #[serde(default = "default_split_fraction")]
    pub split_fraction: f64,
    /// Mass observable of the signal region.
    #[serde(default = "default_mass_column")]
    pub mass_column: String,
    /// Pre-existing discriminator compared against the classifier.
    #[serde(default = "default_baseline_column")]
    pub baseline_column: Option<String>,
    /// Classifier architecture.
    #[serde(default)]
    pub network: NetworkSpec,
    /// Training schedule.
    #[serde(default)]
    pub training: TrainingOpts,
    /// Signal extraction settings.
    #[serde(default)]
    pub extraction: ExtractionOpts,
    /// Optional threshold scan.
    #[serde(default)]
    pub scan: ScanSpec,
    /// Bins of the per-class score histograms.
    #[serde(default = "default_score_bins")]
    pub score_bins: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            features: default_features(),
            split_fraction: default_split_fraction(),
            mass_column: default_mass_column(),
            baseline_column: default_baseline_column(),
            network: NetworkSpec::default(),
            training: TrainingOpts::default(),
            extraction: ExtractionOpts::default(),
            scan: ScanSpec::default(),
            score_bins: default_score_bins(),
        }
    }
}

impl PipelineConfig {
    /// Rejects any value no stage could run with.
    pub fn validate(&self) -> Result<(), SelError> {
        if self.features.is_empty() {
            return Err(SelError::Config(ErrorInfo::new(
                "empty-features",
                "at least one feature column is required",
            )));
        }
        if !(self.split_fraction > 0.0 && self.split_fraction < 1.0) {
            return Err(SelError::Config(
                ErrorInfo::new("split-fraction", "split fraction must lie strictly between 0 and 1")
                    .with_context("split_fraction", self.split_fraction.to_string()),
            ));
        }
        if self.score_bins == 0 {
            return Err(SelError::Config(ErrorInfo::new(
                "score-bins",
                "score histograms need at least one bin",
            )));
        }
        if let Some(bad) = self
            .scan
            .thresholds
            .iter()
            .find(|threshold| !(0.0..=1.0).contains(*threshold))
        {
            return Err(SelError::Config(
                ErrorInfo::new("scan-threshold", "scan thresholds must lie in [0, 1]")
                    .with_context("threshold", bad.to_string()),
            ));
        }
        self.network.validate()?;
        self.training.validate()?;
        self.extraction.validate()
    }

    /// Dataset assembly view of this configuration.
    pub fn assembly_opts(&self) -> AssemblyOpts {
        AssemblyOpts {
            features: self.features.clone(),
            split_fraction: self.split_fraction,
            mass_column: self.mass_column.clone(),
            baseline_column: self.baseline_column.clone(),
        }
    }

    /// SHA-256 of the canonical JSON form.
    pub fn config_hash(&self) -> Result<String, SelError> {
        document_hash(self)
    }

    /// YAML rendering with every default spelled out.
    pub fn to_yaml_string(&self) -> Result<String, SelError> {
        to_yaml_string(self)
    }
}

/// Reads and validates a YAML configuration.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PipelineConfig, SelError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|err| SelError::io(path, err))?;
    let config: PipelineConfig = if bytes.iter().all(u8::is_ascii_whitespace) {
        PipelineConfig::default()
    } else {
        from_yaml_slice(&bytes)?
    };
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_remaining_defaults() {
        let yaml = b"extraction:\n  threshold: 0.6\ntraining:\n  epochs: 3\n";
        let config: PipelineConfig = from_yaml_slice(yaml).unwrap();
        assert_eq!(config.extraction.threshold, 0.6);
        assert_eq!(config.extraction.bins, 200);
        assert_eq!(config.extraction.fit_window.first_bin, 65);
        assert_eq!(config.training.epochs, 3);
        assert_eq!(config.training.batch_size, 32);
        assert_eq!(config.features.len(), 9);
        assert_eq!(config.baseline_column.as_deref(), Some("BDT"));
        config.validate().unwrap();
    }

    #[test]
    fn yaml_round_trip_is_stable() {
        let config = PipelineConfig::default();
        let yaml = config.to_yaml_string().unwrap();
        let back: PipelineConfig = from_yaml_slice(yaml.as_bytes()).unwrap();
        assert_eq!(back, config);
        assert_eq!(back.config_hash().unwrap(), config.config_hash().unwrap());
    }

    #[test]
    fn invalid_values_are_config_errors() {
        let mut config = PipelineConfig::default();
        config.split_fraction = 1.0;
        assert!(matches!(config.validate(), Err(SelError::Config(_))));

        let mut config = PipelineConfig::default();
        config.extraction.fit_window.end_bin = 250;
        assert!(matches!(config.validate(), Err(SelError::Config(_))));

        let mut config = PipelineConfig::default();
        config.scan.thresholds = vec![0.5, 1.2];
        assert_eq!(config.validate().unwrap_err().info().code, "scan-threshold");
    }
}
