//! Conversion of class index sequences to fixed-width multi-hot vectors.

use std::collections::BTreeMap;

use tracing::warn;

use super::PipelineError;
use crate::example::{Example, RawExample};
use crate::schema::DatasetInfo;

/// Encode the class sequences of `raw` and stage its audio as the only source.
///
/// Every `class_sequence` field declared in `info` must be present. Identifier fields
/// (`filename`, `label_str`) are dropped. Indices outside the vocabulary set no bit.
pub fn multi_hot(raw: RawExample, info: &DatasetInfo) -> Result<Example, PipelineError> {
    let RawExample {
        filename,
        audio,
        mut class_sequences,
        ..
    } = raw;

    let mut labels = BTreeMap::new();
    for (field, num_classes) in info.class_sequences() {
        let indices = class_sequences
            .remove(field)
            .ok_or_else(|| PipelineError::MissingClassField {
                field: field.to_string(),
            })?;
        let encoded = encode_indices(&indices, num_classes);
        if indices.iter().any(|index| !in_vocab(*index, num_classes)) {
            warn!(
                "Ignoring out-of-vocabulary class index in `{field}` of {filename} (vocabulary size {num_classes})"
            );
        }
        labels.insert(field.to_string(), encoded);
    }
    if let Some(field) = class_sequences.into_keys().next() {
        return Err(PipelineError::UndeclaredClassField { field });
    }

    Ok(Example {
        sources: vec![audio.clone()],
        audio,
        labels,
    })
}

/// Sum of one-hot rows for `indices`, clipped to `{0,1}`.
pub fn encode_indices(indices: &[i64], num_classes: usize) -> Vec<u8> {
    let mut encoded = vec![0u8; num_classes];
    for &index in indices {
        if in_vocab(index, num_classes) {
            encoded[index as usize] = 1;
        }
    }
    encoded
}

fn in_vocab(index: i64, num_classes: usize) -> bool {
    usize::try_from(index).is_ok_and(|index| index < num_classes)
}
