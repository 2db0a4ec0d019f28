//! Two-way crossover filter
//!
//! Splits a stereo signal into a low and a high sub-band with two cascaded
//! 2nd-order Butterworth sections per side (24 dB/octave, Linkwitz-Riley
//! alignment). The low and high outputs sum to an all-pass response.
//!
//! Buffers handed to [`CrossoverFilter::process`] carry four channels: the
//! input occupies channels 0-1 and the result is
//! `[low_L, low_R, high_L, high_R]`.

use std::sync::Arc;

use super::biquad::{BiquadCoeffs, StereoBiquad};
use super::processor::Processor;
use crate::engine::{AudioBuffer, ChannelLayout};
use crate::error::{MultibandError, Result};
use crate::params::{ParamId, Parameter, CUTOFF_RANGE};

/// Channel index of the first high-band output
pub const HIGH_OUTPUT_OFFSET: usize = 2;

/// Cascaded low-pass / high-pass split around one cutoff frequency
#[derive(Debug, Clone)]
pub struct CrossoverFilter {
    index: usize,
    cutoff_hz: Arc<Parameter>,
    low_pass: [StereoBiquad; 2],
    high_pass: [StereoBiquad; 2],
    sample_rate: f64,
}

impl CrossoverFilter {
    /// Create crossover `index` at `cutoff_hz`
    pub fn new(index: usize, cutoff_hz: f32) -> Self {
        let param = Arc::new(Parameter::with_value(
            ParamId::cutoff(index),
            CUTOFF_RANGE,
            cutoff_hz,
        ));
        Self::with_param(index, param)
    }

    /// Create a crossover reading a shared cutoff parameter
    pub fn with_param(index: usize, cutoff_hz: Arc<Parameter>) -> Self {
        let mut filter = Self {
            index,
            cutoff_hz,
            low_pass: Default::default(),
            high_pass: Default::default(),
            sample_rate: 48000.0,
        };
        filter.update_coefficients(filter.sample_rate);
        filter
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Shared cutoff parameter handle
    pub fn cutoff(&self) -> &Arc<Parameter> {
        &self.cutoff_hz
    }

    /// True when every delay line is zeroed
    pub fn is_cleared(&self) -> bool {
        self.low_pass
            .iter()
            .chain(self.high_pass.iter())
            .all(StereoBiquad::is_cleared)
    }

    /// Low-pass coefficients currently in use
    pub fn low_pass_coeffs(&self) -> BiquadCoeffs {
        *self.low_pass[0].coeffs()
    }

    /// Split channels 0-1 of a four-channel buffer into
    /// `[low_L, low_R, high_L, high_R]`
    ///
    /// Fails with `BufferMismatch`, before touching any state, when the
    /// buffer does not have four channels.
    pub fn split(&mut self, sample_rate: f64, buffer: &mut AudioBuffer) -> Result<()> {
        let expected = ChannelLayout::SplitStereo.num_channels();
        if buffer.channels() != expected {
            return Err(MultibandError::BufferMismatch {
                reason: format!(
                    "crossover needs {} channels, got {}",
                    expected,
                    buffer.channels()
                ),
            });
        }
        self.update_coefficients(sample_rate);

        for ch in 0..2 {
            // High path runs on a copy of the untouched input
            buffer.copy_channel_within(ch, ch + HIGH_OUTPUT_OFFSET);

            let low = buffer.channel_mut(ch);
            for section in &mut self.low_pass {
                section.process_slice(ch, low);
            }

            let high = buffer.channel_mut(ch + HIGH_OUTPUT_OFFSET);
            for section in &mut self.high_pass {
                section.process_slice(ch, high);
            }
        }
        Ok(())
    }

    /// Recompute all four sections from the current cutoff; keeps state
    fn update_coefficients(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        let cutoff = self.cutoff_hz.get() as f64;
        let lpf = BiquadCoeffs::butterworth_lowpass(sample_rate, cutoff);
        let hpf = BiquadCoeffs::butterworth_highpass(sample_rate, cutoff);
        for section in &mut self.low_pass {
            section.set_coeffs(lpf);
        }
        for section in &mut self.high_pass {
            section.set_coeffs(hpf);
        }
    }
}

impl Processor for CrossoverFilter {
    fn prepare(&mut self, sample_rate: f64, _max_block_size: usize) {
        self.update_coefficients(sample_rate);
    }

    /// Split channels 0-1 into `[low_L, low_R, high_L, high_R]`
    ///
    /// A buffer without four channels is left untouched; use
    /// [`CrossoverFilter::split`] to have that reported.
    fn process(&mut self, sample_rate: f64, buffer: &mut AudioBuffer) {
        let _ = self.split(sample_rate, buffer);
    }

    fn reset(&mut self) {
        for section in self.low_pass.iter_mut().chain(self.high_pass.iter_mut()) {
            section.reset();
        }
    }

    fn name(&self) -> &'static str {
        "Crossover Filter"
    }

    fn parameters(&self) -> Vec<Arc<Parameter>> {
        vec![Arc::clone(&self.cutoff_hz)]
    }
}
