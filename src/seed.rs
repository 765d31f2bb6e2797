//! Seed derivation for independent per-element random streams.

use rand::SeedableRng;
use rand::rngs::StdRng;

/// Stream tag for the shuffle buffer.
pub const SHUFFLE_STREAM: &str = "shuffle";
/// Stream tag for mixer key draws.
pub const MIX_STREAM: &str = "mix";
/// Stream tag for per-example crop and gain draws.
pub const PROCESS_STREAM: &str = "process";

/// Hash `(base, stream, index)` into a 64-bit seed.
///
/// Distinct indices give unrelated seeds, so elements processed in any order (or in
/// parallel) see the same draws.
pub fn derive_seed(base: u64, stream: &str, index: u64) -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&base.to_le_bytes());
    hasher.update(stream.as_bytes());
    hasher.update(&[0]);
    hasher.update(&index.to_le_bytes());
    let hash = hasher.finalize();
    let bytes = hash.as_bytes();
    u64::from_le_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ])
}

/// Seeded generator for element `index` of `stream`.
pub fn element_rng(base: u64, stream: &str, index: u64) -> StdRng {
    StdRng::seed_from_u64(derive_seed(base, stream, index))
}
