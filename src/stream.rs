//! Lazy stream adaptors used to assemble the pipeline.
//!
//! Streams are plain iterators; `map` and `filter` come from [`Iterator`]. This module
//! adds the buffered shuffle and fixed-size batching, plus an extension trait so the
//! mixer reads like the other adaptors.

use rand::Rng;

use crate::example::Example;
use crate::pipeline::PipelineError;
use crate::pipeline::mix::MixAudio;

/// Shuffle through a bounded buffer.
///
/// The buffer is filled with up to `buffer_size` elements; each output is drawn uniformly
/// from the buffer and its slot refilled from upstream. A buffer of one preserves order.
pub struct Shuffle<I: Iterator, R> {
    inner: I,
    rng: R,
    buffer: Vec<I::Item>,
    buffer_size: usize,
}

impl<I: Iterator, R: Rng> Shuffle<I, R> {
    pub fn new(inner: I, buffer_size: usize, rng: R) -> Self {
        let buffer_size = buffer_size.max(1);
        Self {
            inner,
            rng,
            buffer: Vec::with_capacity(buffer_size),
            buffer_size,
        }
    }
}

impl<I: Iterator, R: Rng> Iterator for Shuffle<I, R> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        while self.buffer.len() < self.buffer_size {
            match self.inner.next() {
                Some(item) => self.buffer.push(item),
                None => break,
            }
        }
        if self.buffer.is_empty() {
            return None;
        }
        let index = self.rng.random_range(0..self.buffer.len());
        Some(self.buffer.swap_remove(index))
    }
}

/// Group consecutive elements into `Vec`s of `batch_size`.
pub struct Batched<I> {
    inner: I,
    batch_size: usize,
    drop_remainder: bool,
}

impl<I> Batched<I> {
    pub fn new(inner: I, batch_size: usize, drop_remainder: bool) -> Self {
        Self {
            inner,
            batch_size: batch_size.max(1),
            drop_remainder,
        }
    }
}

impl<I: Iterator> Iterator for Batched<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let batch: Vec<_> = self.inner.by_ref().take(self.batch_size).collect();
        if batch.is_empty() || (self.drop_remainder && batch.len() < self.batch_size) {
            return None;
        }
        Some(batch)
    }
}

/// Group a stream of `Result`s into batches, yielding an upstream error as soon as it
/// is pulled.
///
/// Examples already gathered for the failing batch are discarded with it. An error is
/// never lost to `drop_remainder`, even when it arrives in the trailing batch.
pub struct TryBatched<I> {
    inner: I,
    batch_size: usize,
    drop_remainder: bool,
}

impl<I> TryBatched<I> {
    pub fn new(inner: I, batch_size: usize, drop_remainder: bool) -> Self {
        Self {
            inner,
            batch_size: batch_size.max(1),
            drop_remainder,
        }
    }
}

impl<I, T, E> Iterator for TryBatched<I>
where
    I: Iterator<Item = Result<T, E>>,
{
    type Item = Result<Vec<T>, E>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut batch = Vec::with_capacity(self.batch_size);
        while batch.len() < self.batch_size {
            match self.inner.next() {
                Some(Ok(item)) => batch.push(item),
                Some(Err(err)) => return Some(Err(err)),
                None => break,
            }
        }
        if batch.is_empty() || (self.drop_remainder && batch.len() < self.batch_size) {
            return None;
        }
        Some(Ok(batch))
    }
}

/// Stream operations available on every iterator.
pub trait ExampleStreamExt: Iterator + Sized {
    fn shuffle_buffered<R: Rng>(self, buffer_size: usize, rng: R) -> Shuffle<Self, R> {
        Shuffle::new(self, buffer_size, rng)
    }

    fn batched(self, batch_size: usize, drop_remainder: bool) -> Batched<Self> {
        Batched::new(self, batch_size, drop_remainder)
    }

    fn try_batched<T, E>(self, batch_size: usize, drop_remainder: bool) -> TryBatched<Self>
    where
        Self: Iterator<Item = Result<T, E>>,
    {
        TryBatched::new(self, batch_size, drop_remainder)
    }

    fn mix_audio<R: Rng>(self, mixin_prob: f32, rng: R) -> MixAudio<Self, R>
    where
        Self: Iterator<Item = Result<Example, PipelineError>>,
    {
        MixAudio::new(self, mixin_prob, rng)
    }
}

impl<I: Iterator> ExampleStreamExt for I {}
