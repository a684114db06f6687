//! Dataset assembly: labelling, deterministic train/evaluation split and
//! extraction of the unlabelled signal-region features.

use sel_core::errors::{ErrorInfo, SelError};
use sel_core::{FeatureMatrix, Label, LabeledSet};
use serde::{Deserialize, Serialize};

use crate::record::RecordSet;

/// Role of an input record set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Real data from the sideband, assumed signal free.
    Background,
    /// Simulated true signal.
    Simulation,
    /// Real data in the signal-containing mass window.
    SignalRegion,
}

impl Source {
    /// Stable name used in reports and provenance.
    pub fn name(self) -> &'static str {
        match self {
            Source::Background => "background",
            Source::Simulation => "simulation",
            Source::SignalRegion => "signal_region",
        }
    }

    /// Ground-truth label of every row of this source, if one is defined.
    pub fn label(self) -> Option<Label> {
        match self {
            Source::Background => Some(Label::Background),
            Source::Simulation => Some(Label::Signal),
            Source::SignalRegion => None,
        }
    }
}

/// Row counts of one split source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitCounts {
    /// Rows in the source.
    pub total: usize,
    /// Leading rows used for training.
    pub training: usize,
    /// Trailing rows held out for evaluation.
    pub evaluation: usize,
}

/// Returns `floor(fraction * rows)`, the number of leading training rows.
pub fn split_point(rows: usize, fraction: f64) -> Result<usize, SelError> {
    validate_fraction(fraction)?;
    Ok(((fraction * rows as f64).floor() as usize).min(rows))
}

/// Splits `rows` into leading training and trailing evaluation counts.
pub fn split_counts(rows: usize, fraction: f64) -> Result<SplitCounts, SelError> {
    let training = split_point(rows, fraction)?;
    Ok(SplitCounts {
        total: rows,
        training,
        evaluation: rows - training,
    })
}

fn validate_fraction(fraction: f64) -> Result<(), SelError> {
    if fraction.is_finite() && fraction > 0.0 && fraction < 1.0 {
        return Ok(());
    }
    Err(SelError::Config(
        ErrorInfo::new("split-fraction", "split fraction must lie strictly between 0 and 1")
            .with_context("fraction", fraction.to_string()),
    ))
}

/// Options controlling dataset assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyOpts {
    /// Ordered feature columns.
    pub features: Vec<String>,
    /// Leading fraction of each labelled source used for training.
    pub split_fraction: f64,
    /// Mass observable carried by the signal-region set.
    pub mass_column: String,
    /// Optional pre-existing discriminator used as the comparison baseline.
    pub baseline_column: Option<String>,
}

/// Output of [`assemble`].
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledDataset {
    /// Background-then-simulation training rows.
    pub training: LabeledSet,
    /// Background-then-simulation held-out rows.
    pub evaluation: LabeledSet,
    /// Unlabelled signal-region features.
    pub signal_region: FeatureMatrix,
    /// Mass observable of every signal-region row.
    pub signal_region_mass: Vec<f64>,
    /// Baseline discriminator over the evaluation rows, aligned with `evaluation`.
    pub evaluation_baseline: Option<Vec<f64>>,
    /// Split of the background source.
    pub background_split: SplitCounts,
    /// Split of the simulation source.
    pub simulation_split: SplitCounts,
}

/// Checks every column requirement before any data is touched.
pub fn validate_schema(
    background: &RecordSet,
    simulation: &RecordSet,
    signal_region: &RecordSet,
    opts: &AssemblyOpts,
) -> Result<(), SelError> {
    if opts.features.is_empty() {
        return Err(SelError::Config(ErrorInfo::new(
            "empty-features",
            "at least one feature column is required",
        )));
    }
    let mut labelled = opts.features.clone();
    if let Some(baseline) = &opts.baseline_column {
        labelled.push(baseline.clone());
    }
    background.require(&labelled)?;
    simulation.require(&labelled)?;
    labelled.push(opts.mass_column.clone());
    signal_region.require(&labelled)
}

/// Labels, splits and concatenates the three sources.
///
/// Each labelled source keeps its first `floor(fraction * N)` rows for
/// training and the rest for evaluation; background rows precede simulation
/// rows in both splits. Row order is never shuffled.
pub fn assemble(
    background: &RecordSet,
    simulation: &RecordSet,
    signal_region: &RecordSet,
    opts: &AssemblyOpts,
) -> Result<AssembledDataset, SelError> {
    validate_fraction(opts.split_fraction)?;
    validate_schema(background, simulation, signal_region, opts)?;

    let bkg = background.stack(&opts.features)?;
    let sim = simulation.stack(&opts.features)?;
    let background_split = split_counts(bkg.n_rows(), opts.split_fraction)?;
    let simulation_split = split_counts(sim.n_rows(), opts.split_fraction)?;

    let training = labelled_concat(
        &bkg.slice_rows(0..background_split.training),
        &sim.slice_rows(0..simulation_split.training),
    )?;
    let evaluation = labelled_concat(
        &bkg.slice_rows(background_split.training..background_split.total),
        &sim.slice_rows(simulation_split.training..simulation_split.total),
    )?;

    let evaluation_baseline = match &opts.baseline_column {
        Some(column) => Some(evaluation_column(
            background,
            simulation,
            column,
            opts.split_fraction,
        )?),
        None => None,
    };

    let signal_region_features = signal_region.stack(&opts.features)?;
    let signal_region_mass = signal_region.column(&opts.mass_column)?.to_vec();

    tracing::info!(
        training = training.len(),
        evaluation = evaluation.len(),
        signal_region = signal_region_features.n_rows(),
        background_training = background_split.training,
        simulation_training = simulation_split.training,
        "assembled dataset"
    );

    Ok(AssembledDataset {
        training,
        evaluation,
        signal_region: signal_region_features,
        signal_region_mass,
        evaluation_baseline,
        background_split,
        simulation_split,
    })
}

/// Held-out values of a single column, background then simulation, aligned
/// with the evaluation split produced by [`assemble`].
pub fn evaluation_column(
    background: &RecordSet,
    simulation: &RecordSet,
    column: &str,
    fraction: f64,
) -> Result<Vec<f64>, SelError> {
    let bkg = background.column(column)?;
    let sim = simulation.column(column)?;
    let bkg_start = split_point(bkg.len(), fraction)?;
    let sim_start = split_point(sim.len(), fraction)?;
    let mut values = Vec::with_capacity(bkg.len() - bkg_start + sim.len() - sim_start);
    values.extend_from_slice(&bkg[bkg_start..]);
    values.extend_from_slice(&sim[sim_start..]);
    Ok(values)
}

fn labelled_concat(
    background: &FeatureMatrix,
    simulation: &FeatureMatrix,
) -> Result<LabeledSet, SelError> {
    let features = background.concat(simulation)?;
    let mut labels = vec![Label::Background; background.n_rows()];
    labels.extend(std::iter::repeat(Label::Signal).take(simulation.n_rows()));
    LabeledSet::new(features, labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(name: &str, rows: usize, offset: f64) -> RecordSet {
        let xs: Vec<f64> = (0..rows).map(|idx| offset + idx as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|x| x * 2.0).collect();
        RecordSet::new(
            name,
            vec![
                ("x".into(), xs.clone()),
                ("y".into(), ys),
                ("B0_MM".into(), vec![5280.0; rows]),
                ("BDT".into(), xs),
            ],
        )
        .unwrap()
    }

    fn opts() -> AssemblyOpts {
        AssemblyOpts {
            features: vec!["x".into(), "y".into()],
            split_fraction: 0.8,
            mass_column: "B0_MM".into(),
            baseline_column: Some("BDT".into()),
        }
    }

    #[test]
    fn hundred_plus_hundred_scenario() {
        let data = assemble(
            &set("background", 100, 0.0),
            &set("simulation", 100, 1000.0),
            &set("signal_region", 30, 0.0),
            &opts(),
        )
        .unwrap();
        assert_eq!(data.training.len(), 160);
        assert_eq!(data.evaluation.len(), 40);
        let expected: Vec<Label> = std::iter::repeat(Label::Background)
            .take(80)
            .chain(std::iter::repeat(Label::Signal).take(80))
            .collect();
        assert_eq!(data.training.labels, expected);
        assert_eq!(data.evaluation.negatives(), 20);
        assert_eq!(data.evaluation.positives(), 20);
        // First evaluation row is background row 80, unshuffled.
        assert_eq!(data.evaluation.features.row(0), &[80.0, 160.0]);
        assert_eq!(data.evaluation.features.row(20), &[1080.0, 2160.0]);
        assert_eq!(data.evaluation_baseline.as_ref().unwrap().len(), 40);
        assert_eq!(data.signal_region_mass.len(), 30);
    }

    #[test]
    fn missing_feature_in_signal_region_is_fatal() {
        let region = RecordSet::new("signal_region", vec![("x".into(), vec![1.0])]).unwrap();
        let err = assemble(
            &set("background", 10, 0.0),
            &set("simulation", 10, 0.0),
            &region,
            &opts(),
        )
        .unwrap_err();
        assert!(matches!(err, SelError::Schema(_)));
        assert_eq!(err.info().context["source"], "signal_region");
    }

    #[test]
    fn fraction_outside_unit_interval_is_rejected() {
        assert!(matches!(split_point(10, 1.0), Err(SelError::Config(_))));
        assert!(matches!(split_point(10, 0.0), Err(SelError::Config(_))));
        assert!(matches!(split_point(10, f64::NAN), Err(SelError::Config(_))));
    }

    #[test]
    fn small_sources_split_by_floor() {
        assert_eq!(split_counts(1, 0.8).unwrap().training, 0);
        assert_eq!(split_counts(7, 0.8).unwrap().training, 5);
    }
}
