//! Probabilistic pairwise mixing of consecutive examples.
//!
//! Each incoming example draws a key: `true` with probability `mixin_prob`. Examples
//! keyed `false` are reduced alone, padded with a silent second source. Examples keyed
//! `true` wait for the next `true` example and the two are reduced together. A `true`
//! example still waiting when the stream ends is dropped.
//!
//! With this scheme a fraction `f` of mixed outputs needs `mixin_prob = 2f / (f + 1)`,
//! see [`mixin_prob_for_fraction`].

use std::collections::BTreeMap;

use rand::Rng;
use tracing::debug;

use super::PipelineError;
use crate::example::Example;

/// Number of sources carried by every mixed example.
pub const MIX_SOURCES: usize = 2;

/// Draw the grouping key for one example.
pub fn mix_key<R: Rng + ?Sized>(mixin_prob: f32, rng: &mut R) -> bool {
    rng.random::<f32>() < mixin_prob
}

/// Probability to pass to the mixer so that a fraction `fraction` of outputs is mixed.
pub fn mixin_prob_for_fraction(fraction: f32) -> f32 {
    2.0 * fraction / (fraction + 1.0)
}

/// Reduce a window of one or two single-source examples into one two-source example.
///
/// Labels become the elementwise maximum over the window, `audio` the elementwise
/// mean, and sources are divided by the window size so they sum back to `audio`.
pub fn mix_window(window: Vec<Example>) -> Result<Example, PipelineError> {
    let count = window.len();
    if count == 0 || count > MIX_SOURCES {
        return Err(PipelineError::InvalidWindow { size: count });
    }
    let len = window[0].audio.len();
    let scale = 1.0 / count as f32;

    let mut audio = vec![0.0f32; len];
    let mut sources: Vec<Vec<f32>> = Vec::with_capacity(MIX_SOURCES);
    let mut labels: Option<BTreeMap<String, Vec<u8>>> = None;
    for example in window {
        if example.audio.len() != len {
            return Err(PipelineError::LengthMismatch {
                expected: len,
                found: example.audio.len(),
            });
        }
        let Ok([source]) = <[Vec<f32>; 1]>::try_from(example.sources) else {
            return Err(PipelineError::SourceCount { expected: 1 });
        };
        if source.len() != len {
            return Err(PipelineError::LengthMismatch {
                expected: len,
                found: source.len(),
            });
        }
        for (acc, sample) in audio.iter_mut().zip(&example.audio) {
            *acc += sample * scale;
        }
        sources.push(source.into_iter().map(|sample| sample * scale).collect());
        labels = Some(match labels {
            None => example.labels,
            Some(acc) => union_labels(acc, &example.labels)?,
        });
    }
    sources.resize(MIX_SOURCES, vec![0.0; len]);

    Ok(Example {
        audio,
        sources,
        labels: labels.unwrap_or_default(),
    })
}

fn union_labels(
    mut acc: BTreeMap<String, Vec<u8>>,
    other: &BTreeMap<String, Vec<u8>>,
) -> Result<BTreeMap<String, Vec<u8>>, PipelineError> {
    if acc.len() != other.len() {
        return Err(label_mismatch(&acc, other));
    }
    for (field, bits) in &mut acc {
        let other_bits = other.get(field).ok_or_else(|| PipelineError::LabelMismatch {
            field: field.clone(),
        })?;
        if other_bits.len() != bits.len() {
            return Err(PipelineError::LabelMismatch {
                field: field.clone(),
            });
        }
        for (bit, other_bit) in bits.iter_mut().zip(other_bits) {
            *bit = (*bit).max(*other_bit);
        }
    }
    Ok(acc)
}

fn label_mismatch(a: &BTreeMap<String, Vec<u8>>, b: &BTreeMap<String, Vec<u8>>) -> PipelineError {
    let field = a
        .keys()
        .find(|key| !b.contains_key(*key))
        .or_else(|| b.keys().find(|key| !a.contains_key(*key)))
        .cloned()
        .unwrap_or_default();
    PipelineError::LabelMismatch { field }
}

/// Stream adaptor that applies the mixer to an upstream of encoded examples.
///
/// Upstream errors are passed through unchanged.
pub struct MixAudio<I, R> {
    inner: I,
    rng: R,
    mixin_prob: f32,
    pending: Option<Example>,
}

impl<I, R> MixAudio<I, R> {
    pub fn new(inner: I, mixin_prob: f32, rng: R) -> Self {
        Self {
            inner,
            rng,
            mixin_prob,
            pending: None,
        }
    }
}

impl<I, R> Iterator for MixAudio<I, R>
where
    I: Iterator<Item = Result<Example, PipelineError>>,
    R: Rng,
{
    type Item = Result<Example, PipelineError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let example = match self.inner.next() {
                Some(Ok(example)) => example,
                Some(Err(err)) => return Some(Err(err)),
                None => {
                    if self.pending.take().is_some() {
                        debug!("Dropping unpaired example at end of stream");
                    }
                    return None;
                }
            };
            if !mix_key(self.mixin_prob, &mut self.rng) {
                return Some(mix_window(vec![example]));
            }
            match self.pending.take() {
                Some(first) => return Some(mix_window(vec![first, example])),
                None => self.pending = Some(example),
            }
        }
    }
}
