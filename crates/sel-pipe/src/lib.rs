#![deny(missing_docs)]
#![doc = "Pipeline configuration, stage orchestration and run reports."]

/// CSV and JSON artefact writers.
pub mod artefacts;
/// YAML configuration with documented defaults.
pub mod config;
/// Serialisable run report and provenance.
pub mod report;
/// Stage orchestration.
pub mod run;

pub use artefacts::write_artefacts;
pub use config::{load_config, PipelineConfig, ScanSpec};
pub use report::{provenance, PipelineReport, SplitSummary};
pub use run::{run_pipeline, variable_roc, PipelineOutcome, RecordSets, Sources, VariableRoc};
