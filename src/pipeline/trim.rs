//! Random windowing and peak renormalization of single examples.

use rand::Rng;

use crate::example::Example;

/// Added to the peak amplitude so silent clips scale to silence instead of dividing by zero.
pub const GAIN_EPSILON: f32 = 0.01;

/// Result of cropping a waveform to a fixed window.
#[derive(Debug, Clone, PartialEq)]
pub struct Trimmed {
    /// Exactly `window_size` samples.
    pub audio: Vec<f32>,
    pub start_index: usize,
    pub end_index: usize,
}

/// Per-example crop and gain parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessOptions {
    /// Window length in samples.
    pub window_size: usize,
    pub min_gain: f32,
    pub max_gain: f32,
}

impl ProcessOptions {
    /// Build options from a window length in seconds and the dataset sample rate.
    pub fn from_seconds(window_size_s: f32, sample_rate: u32, min_gain: f32, max_gain: f32) -> Self {
        Self {
            window_size: window_size_samples(window_size_s, sample_rate),
            min_gain,
            max_gain,
        }
    }
}

/// Number of samples covered by `window_size_s` seconds at `sample_rate`.
pub fn window_size_samples(window_size_s: f32, sample_rate: u32) -> usize {
    (f64::from(window_size_s) * f64::from(sample_rate)).round().max(0.0) as usize
}

/// Crop `audio` to a random window of `window_size` samples.
///
/// The start is drawn from `[0, max(len - window_size, 1))`, so clips no longer than
/// the window always start at zero. Short crops are zero-padded on the right.
pub fn trim<R: Rng + ?Sized>(audio: &[f32], window_size: usize, rng: &mut R) -> Trimmed {
    let max_start = audio.len().saturating_sub(window_size).max(1);
    let start_index = rng.random_range(0..max_start);
    let end_index = start_index + window_size;
    Trimmed {
        audio: crop_padded(audio, start_index, end_index),
        start_index,
        end_index,
    }
}

/// Scale `audio` so its peak absolute amplitude approaches `target_gain`.
///
/// Returns the scaled waveform and the scale factor applied.
pub fn normalize_audio(audio: &[f32], target_gain: f32) -> (Vec<f32>, f32) {
    let max_gain = audio.iter().fold(0.0f32, |peak, sample| peak.max(sample.abs()));
    let scale = target_gain / (max_gain + GAIN_EPSILON);
    let scaled = audio.iter().map(|sample| sample * scale).collect();
    (scaled, scale)
}

/// Crop `example` to a random window and renormalize it to a random target gain.
///
/// Every source is cropped to the same window and scaled by the same factor as `audio`,
/// so summing the sources keeps tracking the mixed waveform.
pub fn process_audio<R: Rng + ?Sized>(
    mut example: Example,
    options: &ProcessOptions,
    rng: &mut R,
) -> Example {
    let trimmed = trim(&example.audio, options.window_size, rng);
    let target_gain = draw_gain(options.min_gain, options.max_gain, rng);
    let (audio, scale) = normalize_audio(&trimmed.audio, target_gain);
    example.audio = audio;
    for source in &mut example.sources {
        let mut cropped = crop_padded(source, trimmed.start_index, trimmed.end_index);
        for sample in &mut cropped {
            *sample *= scale;
        }
        *source = cropped;
    }
    example
}

fn draw_gain<R: Rng + ?Sized>(min_gain: f32, max_gain: f32, rng: &mut R) -> f32 {
    if max_gain > min_gain {
        rng.random_range(min_gain..max_gain)
    } else {
        min_gain
    }
}

fn crop_padded(samples: &[f32], start: usize, end: usize) -> Vec<f32> {
    let available = samples.get(start..end.min(samples.len())).unwrap_or(&[]);
    let mut out = Vec::with_capacity(end.saturating_sub(start));
    out.extend_from_slice(available);
    out.resize(end.saturating_sub(start), 0.0);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::BTreeMap;

    fn ramp(len: usize) -> Vec<f32> {
        (0..len).map(|i| i as f32).collect()
    }

    fn peak(samples: &[f32]) -> f32 {
        samples.iter().fold(0.0f32, |p, s| p.max(s.abs()))
    }

    #[test]
    fn trim_output_has_window_length_and_valid_start() {
        let mut rng = StdRng::seed_from_u64(3);
        let audio = ramp(1_000);
        for _ in 0..200 {
            let trimmed = trim(&audio, 160, &mut rng);
            assert_eq!(trimmed.audio.len(), 160);
            assert!(trimmed.start_index < 1_000 - 160);
            assert_eq!(trimmed.end_index, trimmed.start_index + 160);
            assert_eq!(trimmed.audio[0], trimmed.start_index as f32);
        }
    }

    #[test]
    fn short_clips_start_at_zero_and_pad_right() {
        let mut rng = StdRng::seed_from_u64(11);
        let audio = ramp(5);
        for window in [5, 6, 12] {
            let trimmed = trim(&audio, window, &mut rng);
            assert_eq!(trimmed.start_index, 0);
            assert_eq!(trimmed.audio.len(), window);
            assert_eq!(&trimmed.audio[..5], &audio[..]);
            assert!(trimmed.audio[5..].iter().all(|s| *s == 0.0));
        }
    }

    #[test]
    fn one_sample_longer_than_window_still_starts_at_zero() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..20 {
            assert_eq!(trim(&ramp(11), 10, &mut rng).start_index, 0);
        }
    }

    #[test]
    fn empty_clip_trims_to_silence() {
        let mut rng = StdRng::seed_from_u64(0);
        let trimmed = trim(&[], 4, &mut rng);
        assert_eq!(trimmed.audio, vec![0.0; 4]);
        assert_eq!((trimmed.start_index, trimmed.end_index), (0, 4));
    }

    #[test]
    fn normalize_hits_target_up_to_epsilon() {
        let audio = vec![0.1, -0.8, 0.4, 0.0];
        let (scaled, scale) = normalize_audio(&audio, 0.5);
        let expected_peak = 0.5 * 0.8 / (0.8 + GAIN_EPSILON);
        assert!((peak(&scaled) - expected_peak).abs() < 1e-6);
        assert!((scale - 0.5 / 0.81).abs() < 1e-6);
    }

    #[test]
    fn normalize_silence_stays_silent() {
        let (scaled, scale) = normalize_audio(&[0.0; 8], 0.25);
        assert!(scaled.iter().all(|s| *s == 0.0));
        assert!(scale.is_finite());
    }

    #[test]
    fn process_audio_applies_shared_window_and_scale_to_sources() {
        let mut rng = StdRng::seed_from_u64(21);
        let a: Vec<f32> = (0..400).map(|i| ((i as f32) * 0.05).sin() * 0.6).collect();
        let b: Vec<f32> = (0..400).map(|i| ((i as f32) * 0.11).cos() * 0.3).collect();
        let audio: Vec<f32> = a.iter().zip(&b).map(|(x, y)| (x + y) / 2.0).collect();
        let example = Example {
            audio,
            sources: vec![
                a.iter().map(|x| x / 2.0).collect(),
                b.iter().map(|x| x / 2.0).collect(),
            ],
            labels: BTreeMap::new(),
        };
        let options = ProcessOptions {
            window_size: 100,
            min_gain: 0.15,
            max_gain: 0.25,
        };
        let processed = process_audio(example, &options, &mut rng);
        assert_eq!(processed.audio.len(), 100);
        assert_eq!(processed.sources.len(), 2);
        let p = peak(&processed.audio);
        assert!(p <= 0.25 && p > 0.1, "peak {p}");
        for t in 0..100 {
            let resynth = processed.sources[0][t] + processed.sources[1][t];
            assert!((resynth - processed.audio[t]).abs() < 1e-5);
        }
    }

    #[test]
    fn process_audio_pads_sources_like_audio() {
        let mut rng = StdRng::seed_from_u64(2);
        let example = Example {
            audio: vec![0.5; 10],
            sources: vec![vec![0.5; 10], vec![0.0; 10]],
            labels: BTreeMap::new(),
        };
        let options = ProcessOptions {
            window_size: 16,
            min_gain: 0.2,
            max_gain: 0.2,
        };
        let processed = process_audio(example, &options, &mut rng);
        assert!(processed.sources.iter().all(|s| s.len() == 16));
        assert!(processed.sources[0][10..].iter().all(|s| *s == 0.0));
        assert!((peak(&processed.audio) - 0.2 * 0.5 / 0.51).abs() < 1e-6);
    }

    #[test]
    fn window_size_in_samples() {
        assert_eq!(window_size_samples(5.0, 32_000), 160_000);
        assert_eq!(window_size_samples(0.5, 22_050), 11_025);
        let options = ProcessOptions::from_seconds(1.0, 100, 0.1, 0.2);
        assert_eq!(options.window_size, 100);
    }
}
