use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::{Args, ValueEnum};
use sel_core::serde::to_report_json;
use sel_pipe::variable_roc;
use sel_roc::Orientation;

use super::InputArgs;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OrientationArg {
    /// Larger values are signal-like.
    Higher,
    /// Smaller values are signal-like.
    Lower,
    /// Whichever side gives the larger area.
    Auto,
}

impl OrientationArg {
    fn resolve(self) -> Option<Orientation> {
        match self {
            OrientationArg::Higher => Some(Orientation::HigherIsSignal),
            OrientationArg::Lower => Some(Orientation::LowerIsSignal),
            OrientationArg::Auto => None,
        }
    }
}

#[derive(Args, Debug)]
pub struct RocArgs {
    #[command(flatten)]
    pub inputs: InputArgs,
    /// Columns to cut on.
    #[arg(long = "column", value_name = "NAME", required = true)]
    pub columns: Vec<String>,
    /// Side of the cut treated as signal.
    #[arg(long, value_enum, default_value_t = OrientationArg::Auto)]
    pub orientation: OrientationArg,
    /// Write every curve as JSON.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn run(args: &RocArgs) -> Result<(), Box<dyn Error>> {
    let config = args.inputs.config()?;
    let sets = args.inputs.sources().load()?;
    let mut curves = Vec::with_capacity(args.columns.len());
    for column in &args.columns {
        curves.push(variable_roc(&config, &sets, column, args.orientation.resolve())?);
    }

    println!(
        "{:<28} {:>18} {:>8} {:>12} {:>12}",
        "column", "orientation", "AUC", "eff@1%", "eff@10%"
    );
    for roc in &curves {
        let orientation = match roc.orientation {
            Orientation::HigherIsSignal => "higher-is-signal",
            Orientation::LowerIsSignal => "lower-is-signal",
        };
        println!(
            "{:<28} {:>18} {:>8.4} {:>12.4} {:>12.4}",
            roc.column,
            orientation,
            roc.summary.auc,
            roc.summary.tpr_at_fpr_1pct,
            roc.summary.tpr_at_fpr_10pct
        );
    }
    if let Some(out) = &args.out {
        fs::write(out, to_report_json(&curves)?)?;
    }
    Ok(())
}
