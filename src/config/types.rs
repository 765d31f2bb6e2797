use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::defaults::{
    SHUFFLE_BUFFER_BATCHES, default_batch_size, default_log_level, default_max_gain,
    default_min_gain, default_mixin_prob, default_window_size_s,
};
use super::errors::ConfigError;

/// Top-level pipeline configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Transform options passed into the example pipeline.
    #[serde(default)]
    pub data: DataConfig,
    /// Logging preferences for the binaries.
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.data.validate()
    }
}

/// Options recognized by the audio transform chain.
///
/// The sample rate is not configured here; it comes from the dataset info.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Crop window length in seconds.
    #[serde(default = "default_window_size_s")]
    pub window_size_s: f32,
    /// Lower bound of the random target peak gain.
    #[serde(default = "default_min_gain")]
    pub min_gain: f32,
    /// Upper bound (exclusive) of the random target peak gain.
    #[serde(default = "default_max_gain")]
    pub max_gain: f32,
    /// Probability that a training example is routed to pairwise mixing.
    #[serde(default = "default_mixin_prob")]
    pub mixin_prob: f32,
    /// Examples per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Shuffle buffer for training data; defaults to ten batches.
    #[serde(default)]
    pub shuffle_buffer: Option<usize>,
    /// Base seed for every random draw in the pipeline.
    #[serde(default)]
    pub seed: u64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            window_size_s: default_window_size_s(),
            min_gain: default_min_gain(),
            max_gain: default_max_gain(),
            mixin_prob: default_mixin_prob(),
            batch_size: default_batch_size(),
            shuffle_buffer: None,
            seed: 0,
        }
    }
}

impl DataConfig {
    pub fn shuffle_buffer_size(&self) -> usize {
        self.shuffle_buffer
            .unwrap_or(self.batch_size.saturating_mul(SHUFFLE_BUFFER_BATCHES))
            .max(1)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.window_size_s > 0.0 && self.window_size_s.is_finite()) {
            return Err(invalid("window_size_s", "must be positive and finite"));
        }
        if !(self.min_gain > 0.0 && self.min_gain.is_finite()) {
            return Err(invalid("min_gain", "must be positive and finite"));
        }
        if !self.max_gain.is_finite() {
            return Err(invalid("max_gain", "must be finite"));
        }
        if self.max_gain < self.min_gain {
            return Err(invalid("max_gain", "must not be below min_gain"));
        }
        if !(0.0..=1.0).contains(&self.mixin_prob) {
            return Err(invalid("mixin_prob", "must be within [0, 1]"));
        }
        if self.batch_size == 0 {
            return Err(invalid("batch_size", "must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

/// Logging preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Directory for per-launch log files; console only when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
        }
    }
}
