//! Data preparation for audio classification datasets.
/// Filtering and scrubbing of dictionary-shaped records.
pub mod filter_scrub;
/// Dataset info describing each field.
pub mod schema;
/// Typed records and batches.
pub mod example;
/// Example transforms and pipeline assembly.
pub mod pipeline;
/// Stream adaptors.
pub mod stream;
/// Per-element seed derivation.
pub mod seed;
/// TOML configuration.
pub mod config;
/// Tracing setup for the binaries.
pub mod logging;

pub use config::{DataConfig, PipelineConfig};
pub use example::{Batch, Example, RawExample};
pub use pipeline::{Pipeline, PipelineError, Split};
pub use schema::{DatasetInfo, FeatureSpec};
