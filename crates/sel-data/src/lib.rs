#![deny(missing_docs)]
#![doc = "Record set loading, schema validation and deterministic train/evaluation assembly."]

pub mod assemble;
pub mod record;
pub mod summary;
pub mod synth;

pub use assemble::{
    assemble, evaluation_column, split_counts, split_point, validate_schema, AssembledDataset,
    AssemblyOpts, Source, SplitCounts,
};
pub use record::RecordSet;
pub use summary::{overview, summarize_column, ColumnSummary, DatasetOverview, Transform};
pub use synth::{generate as generate_toys, ToySamples, ToySpec, FEATURE_COLUMNS};
