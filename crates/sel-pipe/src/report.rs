use std::collections::BTreeMap;

use chrono::Utc;
use sel_core::errors::SelError;
use sel_core::RunProvenance;
use sel_data::{AssembledDataset, SplitCounts};
use sel_fit::{SignalExtraction, ThresholdScan};
use sel_nn::TrainingHistory;
use sel_roc::{RocComparison, ScoreDistributions};
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::run::RecordSets;

/// Row counts of every split the run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitSummary {
    /// Background sideband split.
    pub background: SplitCounts,
    /// Simulated signal split.
    pub simulation: SplitCounts,
    /// Rows in the training split.
    pub training_rows: usize,
    /// Rows in the evaluation split.
    pub evaluation_rows: usize,
    /// Rows in the signal region.
    pub signal_region_rows: usize,
}

impl SplitSummary {
    pub(crate) fn of(data: &AssembledDataset) -> Self {
        Self {
            background: data.background_split,
            simulation: data.simulation_split,
            training_rows: data.training.len(),
            evaluation_rows: data.evaluation.len(),
            signal_region_rows: data.signal_region.n_rows(),
        }
    }
}

/// Everything a pipeline run reports, serialised as `report.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Configuration the run used.
    pub config: PipelineConfig,
    /// Split sizes.
    pub splits: SplitSummary,
    /// Per-epoch training record.
    pub training: TrainingHistory,
    /// Classifier versus baseline ROC curves.
    pub roc: RocComparison,
    /// Held-out score histograms per class.
    pub score_distributions: ScoreDistributions,
    /// Signal extraction at the configured threshold.
    pub extraction: SignalExtraction,
    /// Threshold scan, when thresholds were configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan: Option<ThresholdScan>,
    /// Input, configuration and tool fingerprints.
    pub provenance: RunProvenance,
}

/// Fingerprints the inputs and configuration of a run.
pub fn provenance(config: &PipelineConfig, sets: &RecordSets) -> Result<RunProvenance, SelError> {
    let mut versions = BTreeMap::new();
    versions.insert("sel-pipe".to_string(), env!("CARGO_PKG_VERSION").to_string());
    Ok(RunProvenance {
        config_hash: config.config_hash()?,
        input_hashes: sets.input_hashes(),
        seed: config.training.seed,
        created_at: Utc::now().to_rfc3339(),
        tool_versions: versions,
    })
}
