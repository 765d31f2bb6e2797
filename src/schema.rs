//! Dataset info: per-field feature descriptions supplied alongside a dataset.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the field carrying the raw waveform.
pub const AUDIO_FIELD: &str = "audio";

/// Errors returned when reading or querying dataset info.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Failed to read dataset info {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid dataset info: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Dataset info has no `audio` feature")]
    MissingAudio,
}

/// Description of a single feature in the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureSpec {
    /// Mono waveform at a fixed sample rate.
    Audio { sample_rate: u32 },
    /// Variable-length sequence of class indices over a fixed vocabulary.
    ClassSequence {
        num_classes: usize,
        #[serde(default)]
        names: Vec<String>,
    },
    /// Single class index.
    ClassLabel {
        num_classes: usize,
        #[serde(default)]
        names: Vec<String>,
    },
    /// Free-form string.
    Text,
    /// Fixed-shape numeric tensor.
    Tensor { shape: Vec<usize>, dtype: String },
}

/// Schema of a dataset: one [`FeatureSpec`] per field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub features: BTreeMap<String, FeatureSpec>,
}

impl DatasetInfo {
    /// Parse dataset info from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read dataset info from a JSON file.
    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let text = std::fs::read_to_string(path).map_err(|source| SchemaError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Sample rate of the `audio` feature.
    pub fn sample_rate(&self) -> Result<u32, SchemaError> {
        match self.features.get(AUDIO_FIELD) {
            Some(FeatureSpec::Audio { sample_rate }) => Ok(*sample_rate),
            _ => Err(SchemaError::MissingAudio),
        }
    }

    /// Fields encoded as multi-hot vectors, with their vocabulary sizes.
    pub fn class_sequences(&self) -> impl Iterator<Item = (&str, usize)> {
        self.features.iter().filter_map(|(name, spec)| match spec {
            FeatureSpec::ClassSequence { num_classes, .. } => Some((name.as_str(), *num_classes)),
            _ => None,
        })
    }
}
