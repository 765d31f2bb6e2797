//! Example transforms and their assembly into a batched training stream.
//!
//! Raw examples flow through:
//!
//! ```text
//! multi_hot -> shuffle (train) -> mix_audio -> try_batch -> process_audio per example -> stack
//! ```

pub mod batch;
pub mod mix;
pub mod multi_hot;
pub mod trim;

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;
use tracing::info;

use crate::config::{ConfigError, DataConfig};
use crate::example::{Batch, RawExample};
use crate::schema::{DatasetInfo, SchemaError};
use crate::seed::{MIX_STREAM, SHUFFLE_STREAM, derive_seed};
use crate::stream::ExampleStreamExt;

pub use batch::{process_batch, stack};
pub use mix::{MixAudio, mix_key, mix_window, mixin_prob_for_fraction};
pub use multi_hot::multi_hot;
pub use trim::{ProcessOptions, Trimmed, normalize_audio, process_audio, trim};

/// Errors raised while transforming examples. Any error ends the stream.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Window of {window_size_s}s at {sample_rate} Hz has no samples")]
    EmptyWindow { window_size_s: f32, sample_rate: u32 },
    #[error("Example is missing class field `{field}`")]
    MissingClassField { field: String },
    #[error("Class field `{field}` is not declared in the dataset info")]
    UndeclaredClassField { field: String },
    #[error("Mixing window holds {size} examples")]
    InvalidWindow { size: usize },
    #[error("Waveform length mismatch: expected {expected}, found {found}")]
    LengthMismatch { expected: usize, found: usize },
    #[error("Example has the wrong number of sources (expected {expected})")]
    SourceCount { expected: usize },
    #[error("Label field `{field}` differs between mixed examples")]
    LabelMismatch { field: String },
    #[error("Example {index} does not match the shape of the batch")]
    BatchShape { index: usize },
    #[error("Cannot stack an empty batch")]
    EmptyBatch,
    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

/// Dataset split being read. Only training data is shuffled and mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Eval,
}

impl Split {
    /// Classify a split name such as `train`, `train[:80%]` or `test`.
    pub fn from_name(name: &str) -> Self {
        if name.contains("train") {
            Self::Train
        } else {
            Self::Eval
        }
    }
}

/// Batched audio pipeline bound to a dataset schema and configuration.
#[derive(Debug, Clone)]
pub struct Pipeline {
    info: Arc<DatasetInfo>,
    config: DataConfig,
    options: ProcessOptions,
}

impl Pipeline {
    pub fn new(info: DatasetInfo, config: DataConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let sample_rate = info.sample_rate()?;
        let options = ProcessOptions::from_seconds(
            config.window_size_s,
            sample_rate,
            config.min_gain,
            config.max_gain,
        );
        if options.window_size == 0 {
            return Err(PipelineError::EmptyWindow {
                window_size_s: config.window_size_s,
                sample_rate,
            });
        }
        info!(
            "Audio pipeline: window {} samples, gain [{}, {}), mixin_prob {}, batch {}",
            options.window_size, config.min_gain, config.max_gain, config.mixin_prob, config.batch_size
        );
        Ok(Self {
            info: Arc::new(info),
            config,
            options,
        })
    }

    pub fn options(&self) -> &ProcessOptions {
        &self.options
    }

    /// Turn raw examples into processed batches.
    ///
    /// Training data is shuffled through a buffer and mixed with `mixin_prob`. Evaluation
    /// data keeps its order and runs the mixer with probability zero, which only pads
    /// every example with a silent second source. Incomplete trailing batches are
    /// dropped. The stream ends after the first error.
    pub fn batches<I>(
        &self,
        raw: I,
        split: Split,
    ) -> impl Iterator<Item = Result<Batch, PipelineError>> + use<I>
    where
        I: IntoIterator<Item = RawExample>,
    {
        let seed = self.config.seed;
        let batch_size = self.config.batch_size;
        let options = self.options;
        let (buffer_size, mixin_prob) = match split {
            Split::Train => (self.config.shuffle_buffer_size(), self.config.mixin_prob),
            Split::Eval => (1, 0.0),
        };
        let info = Arc::clone(&self.info);

        raw.into_iter()
            .map(move |example| multi_hot::multi_hot(example, &info))
            .shuffle_buffered(
                buffer_size,
                StdRng::seed_from_u64(derive_seed(seed, SHUFFLE_STREAM, 0)),
            )
            .mix_audio(
                mixin_prob,
                StdRng::seed_from_u64(derive_seed(seed, MIX_STREAM, 0)),
            )
            .try_batched(batch_size, true)
            .enumerate()
            .map(move |(index, batch)| {
                process_batch(batch?, &options, seed, (index * batch_size) as u64)
            })
            .scan(false, |failed, item| {
                if *failed {
                    return None;
                }
                *failed = item.is_err();
                Some(item)
            })
    }
}
