use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Args;
use sel_data::{generate_toys, ToySpec};
use sel_pipe::PipelineConfig;

#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Directory receiving the three tables and `config.yaml`.
    #[arg(long)]
    pub out: PathBuf,
    /// Generator seed.
    #[arg(long, default_value_t = 2024)]
    pub seed: u64,
    /// Rows in each labelled sample.
    #[arg(long, default_value_t = 4000)]
    pub events: usize,
    /// True signal rows in the signal region.
    #[arg(long, default_value_t = 800)]
    pub region_signal: usize,
    /// Background rows in the signal region.
    #[arg(long, default_value_t = 6000)]
    pub region_background: usize,
}

pub fn run(args: &DemoArgs) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(&args.out)?;
    let toys = generate_toys(&ToySpec {
        seed: args.seed,
        background_events: args.events,
        simulation_events: args.events,
        region_signal_events: args.region_signal,
        region_background_events: args.region_background,
        ..ToySpec::default()
    })?;
    toys.background.write_csv(&args.out.join("background.csv"))?;
    toys.simulation.write_csv(&args.out.join("simulation.csv"))?;
    toys.signal_region.write_csv(&args.out.join("signal_region.csv"))?;
    fs::write(
        args.out.join("config.yaml"),
        PipelineConfig::default().to_yaml_string()?,
    )?;
    println!("wrote demo inputs to {}", args.out.display());
    Ok(())
}
