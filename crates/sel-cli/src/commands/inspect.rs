use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Args;
use sel_core::serde::to_report_json;
use sel_data::{overview, summarize_column, ColumnSummary, DatasetOverview, RecordSet, Transform};
use serde::Serialize;

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Table to inspect (CSV).
    #[arg(long)]
    pub input: PathBuf,
    /// Columns to summarise; every column when omitted.
    #[arg(long = "column", value_name = "NAME")]
    pub columns: Vec<String>,
    /// Columns summarised on a natural-log scale.
    #[arg(long = "log", value_name = "NAME")]
    pub log_columns: Vec<String>,
    /// Histogram bins per column.
    #[arg(long, default_value_t = 50)]
    pub bins: usize,
    /// Write the summary as JSON instead of printing a table.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct Inspection {
    overview: DatasetOverview,
    columns: Vec<ColumnSummary>,
}

pub fn run(args: &InspectArgs) -> Result<(), Box<dyn Error>> {
    let name = args
        .input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "input".into());
    let set = RecordSet::from_csv_path(name, &args.input)?;
    let listing = overview(&set);
    let selected = if args.columns.is_empty() {
        listing.columns.clone()
    } else {
        args.columns.clone()
    };

    let mut columns = Vec::with_capacity(selected.len());
    for column in &selected {
        let transform = if args.log_columns.contains(column) {
            Transform::Log
        } else {
            Transform::Identity
        };
        columns.push(summarize_column(&set, column, args.bins, transform)?);
    }

    if let Some(out) = &args.out {
        let inspection = Inspection {
            overview: listing,
            columns,
        };
        fs::write(out, to_report_json(&inspection)?)?;
        return Ok(());
    }

    println!("{}: {} rows, {} columns", listing.source, listing.rows, listing.columns.len());
    println!(
        "{:<28} {:>8} {:>12} {:>12} {:>12} {:>12} {:>12}",
        "column", "count", "min", "median", "max", "mean", "std"
    );
    for summary in &columns {
        let label = match summary.transform {
            Transform::Log => format!("log({})", summary.name),
            Transform::Identity => summary.name.clone(),
        };
        println!(
            "{:<28} {:>8} {:>12.4} {:>12.4} {:>12.4} {:>12.4} {:>12.4}",
            label,
            summary.count,
            summary.min,
            summary.quantiles.q50,
            summary.max,
            summary.mean,
            summary.std
        );
    }
    Ok(())
}
