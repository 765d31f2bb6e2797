//! Per-batch processing: independent per-example transforms run in parallel, then
//! the results are stacked into dense arrays.

use std::collections::BTreeMap;

use ndarray::{Array2, Array3};
use rayon::prelude::*;

use super::PipelineError;
use super::trim::{ProcessOptions, process_audio};
use crate::example::{Batch, Example};
use crate::seed::{PROCESS_STREAM, element_rng};

/// Apply [`process_audio`] to every example of a batch and stack the results.
///
/// Example `i` of the batch draws from a generator seeded with `first_index + i`, so the
/// output does not depend on how rayon schedules the work.
pub fn process_batch(
    examples: Vec<Example>,
    options: &ProcessOptions,
    seed: u64,
    first_index: u64,
) -> Result<Batch, PipelineError> {
    let processed: Vec<Example> = examples
        .into_par_iter()
        .enumerate()
        .map(|(offset, example)| {
            let mut rng = element_rng(seed, PROCESS_STREAM, first_index + offset as u64);
            process_audio(example, options, &mut rng)
        })
        .collect();
    stack(processed)
}

/// Stack examples of identical shape into a [`Batch`].
pub fn stack(examples: Vec<Example>) -> Result<Batch, PipelineError> {
    let Some(first) = examples.first() else {
        return Err(PipelineError::EmptyBatch);
    };
    let batch_size = examples.len();
    let time = first.audio.len();
    let source_count = first.sources.len();
    let label_widths: Vec<(String, usize)> = first
        .labels
        .iter()
        .map(|(field, bits)| (field.clone(), bits.len()))
        .collect();

    let mut audio = Vec::with_capacity(batch_size * time);
    let mut source_audio = Vec::with_capacity(batch_size * source_count * time);
    let mut labels: BTreeMap<String, Vec<u8>> = label_widths
        .iter()
        .map(|(field, width)| (field.clone(), Vec::with_capacity(batch_size * width)))
        .collect();

    for (index, example) in examples.into_iter().enumerate() {
        let shape_error = || PipelineError::BatchShape { index };
        if example.audio.len() != time
            || example.sources.len() != source_count
            || example.sources.iter().any(|source| source.len() != time)
            || example.labels.len() != label_widths.len()
        {
            return Err(shape_error());
        }
        audio.extend_from_slice(&example.audio);
        for source in &example.sources {
            source_audio.extend_from_slice(source);
        }
        for (field, width) in &label_widths {
            let bits = example.labels.get(field).ok_or_else(shape_error)?;
            if bits.len() != *width {
                return Err(shape_error());
            }
            if let Some(stacked) = labels.get_mut(field) {
                stacked.extend_from_slice(bits);
            }
        }
    }

    let audio = Array2::from_shape_vec((batch_size, time), audio)?;
    let source_audio = Array3::from_shape_vec((batch_size, source_count, time), source_audio)?;
    let labels: BTreeMap<String, Array2<u8>> = label_widths
        .into_iter()
        .map(|(field, width)| {
            let bits = labels.remove(&field).unwrap_or_default();
            Array2::from_shape_vec((batch_size, width), bits).map(|array| (field, array))
        })
        .collect::<Result<_, _>>()?;

    Ok(Batch {
        audio,
        source_audio,
        labels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example(value: f32, len: usize, label: Vec<u8>) -> Example {
        Example {
            audio: vec![value; len],
            sources: vec![vec![value; len], vec![0.0; len]],
            labels: BTreeMap::from([("label".to_string(), label)]),
        }
    }

    fn options(window_size: usize) -> ProcessOptions {
        ProcessOptions {
            window_size,
            min_gain: 0.1,
            max_gain: 0.5,
        }
    }

    #[test]
    fn stacks_into_dense_arrays() {
        let batch = stack(vec![example(0.5, 4, vec![1, 0]), example(-0.25, 4, vec![0, 1])]).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.audio.dim(), (2, 4));
        assert_eq!(batch.source_audio.dim(), (2, 2, 4));
        assert_eq!(batch.audio[[1, 3]], -0.25);
        assert_eq!(batch.source_audio[[0, 0, 2]], 0.5);
        assert_eq!(batch.source_audio[[0, 1, 2]], 0.0);
        assert_eq!(batch.labels["label"].row(1).to_vec(), vec![0, 1]);
    }

    #[test]
    fn stacking_rejects_ragged_examples() {
        let err = stack(vec![example(0.5, 4, vec![1, 0]), example(0.5, 5, vec![1, 0])]).unwrap_err();
        assert!(matches!(err, PipelineError::BatchShape { index: 1 }));
        let err = stack(vec![example(0.5, 4, vec![1, 0]), example(0.5, 4, vec![1])]).unwrap_err();
        assert!(matches!(err, PipelineError::BatchShape { index: 1 }));
        assert!(matches!(stack(Vec::new()), Err(PipelineError::EmptyBatch)));
    }

    #[test]
    fn processing_is_reproducible_and_independent_per_example() {
        let ramp: Vec<f32> = (0..1_000).map(|i| (i as f32 / 1_000.0) - 0.5).collect();
        let make = || {
            (0..8)
                .map(|_| Example {
                    audio: ramp.clone(),
                    sources: vec![ramp.clone(), vec![0.0; ramp.len()]],
                    labels: BTreeMap::new(),
                })
                .collect::<Vec<_>>()
        };
        let first = process_batch(make(), &options(100), 17, 0).unwrap();
        let again = process_batch(make(), &options(100), 17, 0).unwrap();
        assert_eq!(first, again);
        assert_eq!(first.audio.dim(), (8, 100));

        // Identical inputs still draw their own windows and gains.
        let rows: Vec<Vec<f32>> = first.audio.rows().into_iter().map(|r| r.to_vec()).collect();
        assert!(rows.iter().any(|row| row != &rows[0]));

        let shifted = process_batch(make(), &options(100), 17, 8).unwrap();
        assert_ne!(first, shifted);
    }
}
