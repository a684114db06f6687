use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use sel_pipe::{run_pipeline, write_artefacts};

use super::InputArgs;

#[derive(Args, Debug)]
pub struct ScanArgs {
    #[command(flatten)]
    pub inputs: InputArgs,
    /// Comma separated score thresholds; the loosest is the reference.
    #[arg(long, value_delimiter = ',', required = true)]
    pub thresholds: Vec<f64>,
    /// Output directory for the report and CSV tables.
    #[arg(long)]
    pub out: PathBuf,
}

fn cell(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |value| format!("{value:.3}"))
}

pub fn run(args: &ScanArgs) -> Result<(), Box<dyn Error>> {
    let mut config = args.inputs.config()?;
    config.scan.thresholds = args.thresholds.clone();
    config.validate()?;

    let sets = args.inputs.sources().load()?;
    let outcome = run_pipeline(&config, &sets)?;
    write_artefacts(&outcome.report, &args.out)?;

    let Some(scan) = &outcome.report.scan else {
        return Ok(());
    };
    println!(
        "{:>9} {:>8} {:>12} {:>12} {:>8} {:>8} {:>8}",
        "threshold", "kept", "signal", "background", "eff_S", "eff_B", "trusted"
    );
    for point in &scan.points {
        println!(
            "{:>9.3} {:>8} {:>12} {:>12} {:>8} {:>8} {:>8}",
            point.threshold,
            point.kept,
            cell(point.signal_yield),
            cell(point.background_yield),
            cell(point.signal_efficiency),
            cell(point.background_efficiency),
            point.trusted
        );
        if let Some(failure) = &point.failure {
            println!("          fit failed: {failure}");
        }
    }
    Ok(())
}
