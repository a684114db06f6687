use std::error::Error;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sel_core::SelError;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{demo, inspect, roc, run, scan, version};

#[derive(Parser, Debug)]
#[command(name = "sel", about = "Classifier-based event selection and signal extraction")]
struct Cli {
    /// Log debug events to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assemble, train, evaluate and fit the signal yield.
    Run(run::RunArgs),
    /// Summarise the columns of one input table.
    Inspect(inspect::InspectArgs),
    /// ROC curves of raw columns used as single cuts.
    Roc(roc::RocArgs),
    /// Repeat the signal extraction over several score thresholds.
    Scan(scan::ScanArgs),
    /// Write synthetic input tables and a default configuration.
    Demo(demo::DemoArgs),
    /// Print version information.
    Version(version::VersionArgs),
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn dispatch(cli: &Cli) -> Result<(), Box<dyn Error>> {
    match &cli.command {
        Command::Run(args) => run::run(args),
        Command::Inspect(args) => inspect::run(args),
        Command::Roc(args) => roc::run(args),
        Command::Scan(args) => scan::run(args),
        Command::Demo(args) => demo::run(args),
        Command::Version(args) => version::run(args),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match dispatch(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<SelError>() {
            Some(sel) => {
                tracing::error!(family = sel.family(), code = %sel.info().code, "run aborted");
                eprintln!("error: {sel}");
                if sel.is_input_error() {
                    ExitCode::from(2)
                } else {
                    ExitCode::FAILURE
                }
            }
            None => {
                eprintln!("error: {err}");
                ExitCode::FAILURE
            }
        },
    }
}
