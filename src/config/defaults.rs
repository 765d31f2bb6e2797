pub(super) fn default_window_size_s() -> f32 {
    5.0
}

pub(super) fn default_min_gain() -> f32 {
    0.15
}

pub(super) fn default_max_gain() -> f32 {
    0.25
}

pub(super) fn default_mixin_prob() -> f32 {
    0.0
}

pub(super) fn default_batch_size() -> usize {
    64
}

/// Shuffle buffer as a multiple of the batch size when not configured.
pub(super) const SHUFFLE_BUFFER_BATCHES: usize = 10;

pub(super) fn default_log_level() -> String {
    "info".to_string()
}
