//! Typed records flowing through the audio pipeline.

use std::collections::BTreeMap;

use ndarray::{Array2, Array3};

/// A record as produced by the upstream dataset reader.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawExample {
    /// Source recording identifier. Dropped by the multi-hot encoder.
    pub filename: String,
    /// Human-readable labels. Dropped by the multi-hot encoder.
    pub label_str: Vec<String>,
    /// Mono waveform of arbitrary length.
    pub audio: Vec<f32>,
    /// Class index sequences keyed by field name (`label`, `bg_labels`, ...).
    pub class_sequences: BTreeMap<String, Vec<i64>>,
}

/// An encoded example: multi-hot labels plus the waveforms that make up `audio`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Example {
    /// The (possibly mixed) waveform.
    pub audio: Vec<f32>,
    /// Per-source contributions. One entry after encoding, two after mixing.
    pub sources: Vec<Vec<f32>>,
    /// `{0,1}` indicator vectors keyed by field name.
    pub labels: BTreeMap<String, Vec<u8>>,
}

impl Example {
    pub fn label(&self, field: &str) -> Option<&[u8]> {
        self.labels.get(field).map(Vec::as_slice)
    }
}

/// A stack of processed examples with uniform shapes.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// `[batch, time]`
    pub audio: Array2<f32>,
    /// `[batch, sources, time]`
    pub source_audio: Array3<f32>,
    /// `[batch, classes]` per label field.
    pub labels: BTreeMap<String, Array2<u8>>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.audio.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
