//! Per-band compressor
//!
//! Per sample: detect the channel-mean level relative to the threshold, map
//! it through the soft-knee curve, smooth the result with separate attack
//! and release rates, then apply smoothed gain plus makeup to every channel.

use std::sync::Arc;

use super::envelope::EnvelopeDetector;
use super::gain_curve::GainCurve;
use super::processor::Processor;
use super::smoother::GainSmoother;
use crate::engine::buffer::db_to_linear;
use crate::engine::AudioBuffer;
use crate::params::{CompressorParam, Parameter};

/// The six shared controls of one band
#[derive(Debug, Clone)]
pub struct CompressorParams {
    pub attack_ms: Arc<Parameter>,
    pub release_ms: Arc<Parameter>,
    pub makeup_db: Arc<Parameter>,
    pub knee_db: Arc<Parameter>,
    pub threshold_db: Arc<Parameter>,
    pub ratio: Arc<Parameter>,
}

impl CompressorParams {
    /// Fresh parameters at their defaults for band `band`
    pub fn for_band(band: usize) -> Self {
        Self {
            attack_ms: Parameter::shared_band(band, CompressorParam::Attack),
            release_ms: Parameter::shared_band(band, CompressorParam::Release),
            makeup_db: Parameter::shared_band(band, CompressorParam::Makeup),
            knee_db: Parameter::shared_band(band, CompressorParam::Knee),
            threshold_db: Parameter::shared_band(band, CompressorParam::Threshold),
            ratio: Parameter::shared_band(band, CompressorParam::Ratio),
        }
    }

    pub fn get(&self, kind: CompressorParam) -> &Arc<Parameter> {
        match kind {
            CompressorParam::Attack => &self.attack_ms,
            CompressorParam::Release => &self.release_ms,
            CompressorParam::Makeup => &self.makeup_db,
            CompressorParam::Knee => &self.knee_db,
            CompressorParam::Threshold => &self.threshold_db,
            CompressorParam::Ratio => &self.ratio,
        }
    }

    /// All six in host order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Parameter>> {
        CompressorParam::ALL.into_iter().map(move |kind| self.get(kind))
    }
}

/// Soft-knee compressor for one frequency band
#[derive(Debug, Clone)]
pub struct BandCompressor {
    band: usize,
    params: CompressorParams,
    detector: EnvelopeDetector,
    smoother: GainSmoother,
    sample_rate: f64,
}

impl BandCompressor {
    /// Create a compressor for band `band` with default parameters
    pub fn new(band: usize) -> Self {
        Self::with_params(band, CompressorParams::for_band(band))
    }

    /// Create a compressor reading the given shared parameters
    pub fn with_params(band: usize, params: CompressorParams) -> Self {
        Self {
            band,
            params,
            detector: EnvelopeDetector::new(),
            smoother: GainSmoother::new(),
            sample_rate: 48000.0,
        }
    }

    pub fn band(&self) -> usize {
        self.band
    }

    /// Shared parameter handles
    pub fn params(&self) -> &CompressorParams {
        &self.params
    }

    /// Smoothed gain change applied to the most recent sample, in dB (<= 0
    /// while compressing, makeup excluded)
    pub fn gain_reduction_db(&self) -> f32 {
        self.smoother.last_gain_db()
    }

    /// Current attack and release coefficients
    pub fn coefficients(&self) -> (f32, f32) {
        (self.smoother.alpha_attack(), self.smoother.alpha_release())
    }

    fn update_coefficients(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.smoother.set_times(
            self.params.attack_ms.get(),
            self.params.release_ms.get(),
            sample_rate,
        );
    }
}

impl Processor for BandCompressor {
    fn prepare(&mut self, sample_rate: f64, _max_block_size: usize) {
        self.update_coefficients(sample_rate);
    }

    fn process(&mut self, sample_rate: f64, buffer: &mut AudioBuffer) {
        self.update_coefficients(sample_rate);

        for n in 0..buffer.len() {
            // Each parameter is loaded once per sample; a concurrent write
            // lands on the next sample at the latest.
            let threshold_db = self.params.threshold_db.get();
            let curve = GainCurve::new(self.params.ratio.get(), self.params.knee_db.get());
            let makeup_db = self.params.makeup_db.get();

            let over = self
                .detector
                .level_over_threshold(&buffer.samples, n, threshold_db);
            let target_db = curve.gain_db(over);
            let smoothed_db = self.smoother.process(target_db);

            let gain = db_to_linear(makeup_db + smoothed_db);
            for channel in &mut buffer.samples {
                channel[n] *= gain;
            }
        }
    }

    fn reset(&mut self) {
        self.smoother.reset();
    }

    fn name(&self) -> &'static str {
        "Compressor"
    }

    fn parameters(&self) -> Vec<Arc<Parameter>> {
        self.params.iter().cloned().collect()
    }
}
