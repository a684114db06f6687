pub mod demo;
pub mod inspect;
pub mod roc;
pub mod run;
pub mod scan;
pub mod version;

use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use sel_pipe::{load_config, PipelineConfig, Sources};

/// Input tables and configuration shared by the pipeline commands.
#[derive(Args, Debug)]
pub struct InputArgs {
    /// Sideband background table (CSV).
    #[arg(long)]
    pub background: PathBuf,
    /// Simulated signal table (CSV).
    #[arg(long)]
    pub simulation: PathBuf,
    /// Signal-region table (CSV).
    #[arg(long = "signal-region")]
    pub signal_region: PathBuf,
    /// YAML configuration; built-in defaults when omitted.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl InputArgs {
    pub fn sources(&self) -> Sources {
        Sources {
            background: self.background.clone(),
            simulation: self.simulation.clone(),
            signal_region: self.signal_region.clone(),
        }
    }

    pub fn config(&self) -> Result<PipelineConfig, Box<dyn Error>> {
        Ok(match &self.config {
            Some(path) => load_config(path)?,
            None => PipelineConfig::default(),
        })
    }
}
