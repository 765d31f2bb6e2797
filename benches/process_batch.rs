use std::collections::BTreeMap;

use chirp_data::Example;
use chirp_data::pipeline::{ProcessOptions, mix_window, process_batch};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

const SAMPLE_RATE: usize = 32_000;
const CLIP_SECONDS: usize = 8;
const BATCH_SIZE: usize = 64;

fn mixed_examples() -> Vec<Example> {
    (0..BATCH_SIZE)
        .map(|i| {
            let audio: Vec<f32> = (0..SAMPLE_RATE * CLIP_SECONDS)
                .map(|t| ((t * (i + 1)) as f32 * 1e-3).sin() * 0.5)
                .collect();
            let example = Example {
                sources: vec![audio.clone()],
                audio,
                labels: BTreeMap::from([("label".to_string(), vec![0u8; 512])]),
            };
            mix_window(vec![example]).expect("singleton window")
        })
        .collect()
}

fn bench_process_batch(c: &mut Criterion) {
    let examples = mixed_examples();
    let options = ProcessOptions {
        window_size: SAMPLE_RATE * 5,
        min_gain: 0.15,
        max_gain: 0.25,
    };
    c.bench_with_input(
        BenchmarkId::new("process_batch", BATCH_SIZE),
        &examples,
        |b, examples| {
            b.iter(|| {
                process_batch(black_box(examples.clone()), &options, 7, 0).expect("process_batch");
            });
        },
    );
}

criterion_group!(benches, bench_process_batch);
criterion_main!(benches);
