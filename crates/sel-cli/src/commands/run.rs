use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use sel_fit::ExtractionReport;
use sel_pipe::{run_pipeline, write_artefacts};

use super::InputArgs;

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub inputs: InputArgs,
    /// Output directory for the report and CSV tables.
    #[arg(long)]
    pub out: PathBuf,
    /// Override the score threshold.
    #[arg(long)]
    pub threshold: Option<f64>,
    /// Override the number of training epochs.
    #[arg(long)]
    pub epochs: Option<usize>,
    /// Override the training seed.
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn run(args: &RunArgs) -> Result<(), Box<dyn Error>> {
    let mut config = args.inputs.config()?;
    if let Some(threshold) = args.threshold {
        config.extraction.threshold = threshold;
    }
    if let Some(epochs) = args.epochs {
        config.training.epochs = epochs;
    }
    if let Some(seed) = args.seed {
        config.training.seed = seed;
    }
    config.validate()?;

    let sets = args.inputs.sources().load()?;
    let outcome = run_pipeline(&config, &sets)?;
    write_artefacts(&outcome.report, &args.out)?;

    let roc = &outcome.report.roc;
    println!("classifier AUC: {:.4}", roc.classifier_summary.auc);
    if let Some(baseline) = &roc.baseline_summary {
        println!("baseline AUC:   {:.4}", baseline.auc);
    }
    print!("{}", ExtractionReport(&outcome.report.extraction));
    Ok(())
}
