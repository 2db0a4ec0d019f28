//! Audio Buffer Management
//!
//! Planar sample storage shared by every processing stage. Buffers used on
//! the real-time path are created once with a fixed capacity and only ever
//! change length within that capacity.

use crate::error::{MultibandError, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default sample rate for generated material and fresh buffers
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

/// Decibel value reported for silence (zero or negative amplitude)
pub const DB_FLOOR: f32 = -100.0;

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert decibels to linear amplitude
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert linear amplitude to decibels
///
/// Amplitudes at or below zero, and anything quieter than [`DB_FLOOR`], map
/// to [`DB_FLOOR`]. The result is always finite.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear > 0.0 {
        (20.0 * linear.log10()).max(DB_FLOOR)
    } else {
        DB_FLOOR
    }
}

/// Calculate the linear RMS of a single channel slice
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_squares / samples.len() as f64).sqrt() as f32
}

// ============================================================================
// Channel Layout
// ============================================================================

/// Audio channel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelLayout {
    /// Single channel
    Mono,
    /// Two channels (left, right)
    #[default]
    Stereo,
    /// Two stereo pairs: `[low_L, low_R, high_L, high_R]` as produced by a crossover
    SplitStereo,
}

impl ChannelLayout {
    /// Returns the number of channels for this layout
    pub fn num_channels(&self) -> usize {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
            ChannelLayout::SplitStereo => 4,
        }
    }

    /// Create a ChannelLayout from a channel count
    pub fn from_count(count: usize) -> Option<Self> {
        match count {
            1 => Some(ChannelLayout::Mono),
            2 => Some(ChannelLayout::Stereo),
            4 => Some(ChannelLayout::SplitStereo),
            _ => None,
        }
    }
}

// ============================================================================
// Audio Buffer
// ============================================================================

/// Non-interleaved 32-bit float audio, indexed `[channel][sample]`
///
/// # Example
/// ```
/// use multiband::engine::buffer::{AudioBuffer, ChannelLayout};
///
/// let buffer = AudioBuffer::new(480, ChannelLayout::Stereo);
/// assert_eq!(buffer.channels(), 2);
/// assert_eq!(buffer.len(), 480);
/// ```
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    /// Sample data: outer Vec is channels, inner Vec is samples
    pub samples: Vec<Vec<f32>>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Create a zeroed buffer with `num_samples` frames
    pub fn new(num_samples: usize, layout: ChannelLayout) -> Self {
        Self {
            samples: vec![vec![0.0_f32; num_samples]; layout.num_channels()],
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }

    /// Create an empty buffer able to hold `capacity` frames without reallocating
    pub fn with_capacity(layout: ChannelLayout, capacity: usize) -> Self {
        Self {
            samples: (0..layout.num_channels())
                .map(|_| Vec::with_capacity(capacity))
                .collect(),
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }

    /// Create a buffer from per-channel vectors
    pub fn from_channels(samples: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if let Some(first) = samples.first() {
            if samples.iter().any(|ch| ch.len() != first.len()) {
                return Err(MultibandError::BufferMismatch {
                    reason: "channels have different lengths".to_string(),
                });
            }
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Create an audio buffer from interleaved sample data
    pub fn from_interleaved(
        interleaved: &[f32],
        layout: ChannelLayout,
        sample_rate: u32,
    ) -> Result<Self> {
        let num_channels = layout.num_channels();

        if interleaved.len() % num_channels != 0 {
            return Err(MultibandError::InvalidAudio {
                reason: format!(
                    "Interleaved data length {} is not divisible by channel count {}",
                    interleaved.len(),
                    num_channels
                ),
                source: None,
            });
        }

        let num_samples = interleaved.len() / num_channels;
        let mut samples = vec![Vec::with_capacity(num_samples); num_channels];
        for frame in interleaved.chunks_exact(num_channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                samples[ch].push(sample);
            }
        }

        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Convert the buffer to interleaved format
    pub fn to_interleaved(&self) -> Vec<f32> {
        let num_channels = self.channels();
        let num_samples = self.len();
        let mut interleaved = Vec::with_capacity(num_channels * num_samples);
        for sample_idx in 0..num_samples {
            for channel in &self.samples {
                interleaved.push(channel[sample_idx]);
            }
        }
        interleaved
    }

    /// Get the number of channels
    #[inline]
    pub fn channels(&self) -> usize {
        self.samples.len()
    }

    /// Get the number of samples per channel
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.first().map(|ch| ch.len()).unwrap_or(0)
    }

    /// Check if the buffer is empty (no samples)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of frames every channel can hold without reallocating
    pub fn capacity(&self) -> usize {
        self.samples
            .iter()
            .map(|ch| ch.capacity())
            .min()
            .unwrap_or(0)
    }

    /// Change the frame count of every channel
    ///
    /// New frames are zeroed. Does not allocate while `len <= capacity()`.
    pub fn set_len(&mut self, len: usize) {
        for channel in &mut self.samples {
            channel.resize(len, 0.0);
        }
    }

    /// Grow every channel's capacity to at least `capacity` frames
    pub fn reserve(&mut self, capacity: usize) {
        for channel in &mut self.samples {
            let len = channel.len();
            if channel.capacity() < capacity {
                channel.reserve_exact(capacity - len);
            }
        }
    }

    /// Get immutable access to a channel's samples
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.samples[index]
    }

    /// Get mutable access to a channel's samples
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.samples[index]
    }

    /// Overwrite channel `dest` with `source`, truncated to the shorter length
    #[inline]
    pub fn copy_channel_from(&mut self, dest: usize, source: &[f32]) {
        let target = &mut self.samples[dest];
        let n = target.len().min(source.len());
        target[..n].copy_from_slice(&source[..n]);
    }

    /// Copy one channel of this buffer onto another channel of the same buffer
    #[inline]
    pub fn copy_channel_within(&mut self, source: usize, dest: usize) {
        if source == dest {
            return;
        }
        let (src, dst) = if source < dest {
            let (head, tail) = self.samples.split_at_mut(dest);
            (&head[source], &mut tail[0])
        } else {
            let (head, tail) = self.samples.split_at_mut(source);
            (&tail[0], &mut head[dest])
        };
        dst.copy_from_slice(src);
    }

    /// Add `source` sample by sample onto channel `dest`
    #[inline]
    pub fn add_channel_from(&mut self, dest: usize, source: &[f32]) {
        for (out, &s) in self.samples[dest].iter_mut().zip(source) {
            *out += s;
        }
    }

    /// Zero every sample without changing the length
    pub fn clear(&mut self) {
        for channel in &mut self.samples {
            channel.fill(0.0);
        }
    }

    /// Check if all samples are finite (not NaN or Infinity)
    pub fn is_finite(&self) -> bool {
        self.samples
            .iter()
            .flat_map(|ch| ch.iter())
            .all(|s| s.is_finite())
    }

    /// Peak absolute sample value across all channels
    pub fn peak(&self) -> f32 {
        self.samples
            .iter()
            .flat_map(|ch| ch.iter())
            .map(|&s| s.abs())
            .fold(0.0_f32, f32::max)
    }
}

impl Default for AudioBuffer {
    fn default() -> Self {
        Self::new(0, ChannelLayout::Stereo)
    }
}

// ============================================================================
// Tests
// ============================================================================
