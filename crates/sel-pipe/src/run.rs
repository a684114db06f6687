use std::collections::BTreeMap;
use std::path::PathBuf;

use sel_core::errors::SelError;
use sel_core::{Label, Trainer};
use sel_data::{assemble, evaluation_column, split_counts, RecordSet};
use sel_fit::{extract, scan_thresholds, LevenbergMarquardt};
use sel_nn::{NeuralClassifier, NeuralTrainer};
use sel_roc::{
    best_orientation, cut_roc, evaluate, Evaluation, EvaluationOpts, Orientation, RocCurve,
    RocSummary,
};
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::report::{provenance, PipelineReport, SplitSummary};

/// Paths of the three input tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sources {
    /// Sideband background data.
    pub background: PathBuf,
    /// Simulated signal.
    pub simulation: PathBuf,
    /// Signal-region data.
    pub signal_region: PathBuf,
}

impl Sources {
    /// Loads all three tables.
    pub fn load(&self) -> Result<RecordSets, SelError> {
        Ok(RecordSets {
            background: RecordSet::from_csv_path("background", &self.background)?,
            simulation: RecordSet::from_csv_path("simulation", &self.simulation)?,
            signal_region: RecordSet::from_csv_path("signal_region", &self.signal_region)?,
        })
    }
}

/// The three loaded input tables.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSets {
    /// Sideband background data.
    pub background: RecordSet,
    /// Simulated signal.
    pub simulation: RecordSet,
    /// Signal-region data.
    pub signal_region: RecordSet,
}

impl RecordSets {
    /// Content hash per source name.
    pub fn input_hashes(&self) -> BTreeMap<String, String> {
        [&self.background, &self.simulation, &self.signal_region]
            .into_iter()
            .map(|set| (set.name().to_string(), set.canonical_hash()))
            .collect()
    }
}

/// Report plus the in-memory artefacts it was built from.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Serialisable summary.
    pub report: PipelineReport,
    /// Trained classifier.
    pub classifier: NeuralClassifier,
    /// Per-row scores and ROC curves.
    pub evaluation: Evaluation,
}

/// Assembles, trains, evaluates and extracts the signal in one pass.
pub fn run_pipeline(
    config: &PipelineConfig,
    sets: &RecordSets,
) -> Result<PipelineOutcome, SelError> {
    config.validate()?;
    let data = assemble(
        &sets.background,
        &sets.simulation,
        &sets.signal_region,
        &config.assembly_opts(),
    )?;

    let trainer = NeuralTrainer::new(config.network.clone(), config.training.clone());
    let classifier = trainer.train(&data.training)?;

    let evaluation = evaluate(
        &classifier,
        &data.evaluation,
        &data.signal_region,
        data.evaluation_baseline.as_deref(),
        &EvaluationOpts {
            score_bins: config.score_bins,
        },
    )?;

    let fitter = LevenbergMarquardt::new(config.extraction.solver);
    let extraction = extract(
        &evaluation.signal_region_scores,
        &data.signal_region_mass,
        &config.extraction,
        &fitter,
    )?;
    let scan = if config.scan.thresholds.is_empty() {
        None
    } else {
        Some(scan_thresholds(
            &evaluation.signal_region_scores,
            &data.signal_region_mass,
            &config.scan.thresholds,
            &config.extraction,
            &fitter,
        )?)
    };

    let report = PipelineReport {
        config: config.clone(),
        splits: SplitSummary::of(&data),
        training: classifier.history().clone(),
        roc: evaluation.comparison.clone(),
        score_distributions: evaluation.distributions.clone(),
        extraction,
        scan,
        provenance: provenance(config, sets)?,
    };
    tracing::info!(
        signal_yield = report.extraction.signal_yield,
        trusted = report.extraction.trusted,
        "pipeline finished"
    );

    Ok(PipelineOutcome {
        report,
        classifier,
        evaluation,
    })
}

/// Cut-based ROC of one raw column over the evaluation split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableRoc {
    /// Column the cut is placed on.
    pub column: String,
    /// Side of the cut treated as signal.
    pub orientation: Orientation,
    /// The curve.
    pub curve: RocCurve,
    /// Headline numbers.
    pub summary: RocSummary,
}

/// Builds the cut-based ROC of `column`; picks the better orientation when none is given.
pub fn variable_roc(
    config: &PipelineConfig,
    sets: &RecordSets,
    column: &str,
    orientation: Option<Orientation>,
) -> Result<VariableRoc, SelError> {
    let values = evaluation_column(
        &sets.background,
        &sets.simulation,
        column,
        config.split_fraction,
    )?;
    let background = split_counts(sets.background.n_rows(), config.split_fraction)?;
    let simulation = split_counts(sets.simulation.n_rows(), config.split_fraction)?;
    let mut labels = vec![Label::Background; background.evaluation];
    labels.extend(std::iter::repeat(Label::Signal).take(simulation.evaluation));

    let (orientation, curve) = match orientation {
        Some(orientation) => (orientation, cut_roc(&values, &labels, orientation)?),
        None => best_orientation(&values, &labels)?,
    };
    tracing::info!(column, auc = curve.auc(), "variable roc");
    Ok(VariableRoc {
        column: column.to_string(),
        orientation,
        summary: RocSummary::of(&curve),
        curve,
    })
}
