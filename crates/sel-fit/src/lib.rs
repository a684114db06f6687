#![deny(missing_docs)]
#![doc = "Weighted least-squares fit of an exponential background plus a Gaussian peak."]

pub mod extract;
pub mod lm;
pub mod model;
pub mod params;
pub mod report;
pub mod scan;
pub mod window;

pub use extract::{
    background_yield, extract, kept_mask, signal_yield, signal_yield_uncertainty, ExtractionOpts,
    SignalExtraction,
};
pub use lm::{Correlation, FitDiagnostics, FitResult, Fitter, LevenbergMarquardt, SolverOpts};
pub use model::{BinnedData, ExpGaussModel, FitModel, FitSeeds};
pub use params::{FitParameter, ParameterSet};
pub use report::{ExtractionReport, FitReport};
pub use scan::{scan_thresholds, ScanPoint, ThresholdScan};
pub use window::FitWindow;
