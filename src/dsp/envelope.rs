//! Level detection
//!
//! Turns one multi-channel frame into a single level estimate relative to the
//! threshold. Channels are averaged (signed) before rectification, so the
//! detector follows the mid signal of a stereo pair.

use crate::engine::buffer::linear_to_db;

/// Peak level detector over the channel mean
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeDetector;

impl EnvelopeDetector {
    pub fn new() -> Self {
        Self
    }

    /// Level of frame `index` in dB relative to `threshold_db`
    ///
    /// Silence maps to the decibel floor rather than `-inf`.
    #[inline]
    pub fn level_over_threshold(
        &self,
        channels: &[Vec<f32>],
        index: usize,
        threshold_db: f32,
    ) -> f32 {
        if channels.is_empty() {
            return linear_to_db(0.0) - threshold_db;
        }
        let sum: f32 = channels.iter().map(|ch| ch[index]).sum();
        let mean = sum / channels.len() as f32;
        linear_to_db(mean.abs()) - threshold_db
    }
}
