//! Pipeline configuration stored as TOML.

mod defaults;
mod errors;
mod io;
mod types;

#[cfg(test)]
mod tests;

/// Default filename for the pipeline configuration.
pub const CONFIG_FILE_NAME: &str = "chirp.toml";

pub use errors::ConfigError;
pub use io::{load_from, parse, save_to};
pub use types::{DataConfig, LoggingSettings, PipelineConfig};
