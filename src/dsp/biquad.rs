//! Second-order IIR sections
//!
//! Coefficients follow the bilinear-transform low/high-pass designs from the
//! Audio EQ Cookbook. With Q = 1/sqrt(2) each section is a 2nd-order
//! Butterworth filter.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

use crate::params::MIN_CUTOFF_HZ;

/// Butterworth Q for a single second-order section
pub const BUTTERWORTH_Q: f64 = FRAC_1_SQRT_2;

/// Fraction of Nyquist the cutoff may approach before being clamped
pub const NYQUIST_SAFETY: f64 = 0.98;

/// Response shape of a section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    LowPass,
    HighPass,
}

/// Biquad filter coefficients
/// Transfer function: H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoeffs {
    /// Unity pass-through
    pub const IDENTITY: BiquadCoeffs = BiquadCoeffs {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    /// Design a low- or high-pass section
    ///
    /// The frequency is clamped to `[MIN_CUTOFF_HZ, NYQUIST_SAFETY * fs/2]`.
    pub fn calculate(filter_type: FilterType, sample_rate: f64, frequency: f64, q: f64) -> Self {
        let nyquist_limit = sample_rate * 0.5 * NYQUIST_SAFETY;
        let freq = frequency.clamp(MIN_CUTOFF_HZ as f64, nyquist_limit.max(MIN_CUTOFF_HZ as f64));

        let w0 = 2.0 * PI * freq / sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q);

        let (b0, b1, b2) = match filter_type {
            FilterType::LowPass => ((1.0 - cos_w0) / 2.0, 1.0 - cos_w0, (1.0 - cos_w0) / 2.0),
            FilterType::HighPass => ((1.0 + cos_w0) / 2.0, -(1.0 + cos_w0), (1.0 + cos_w0) / 2.0),
        };
        let a0 = 1.0 + alpha;

        BiquadCoeffs {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: (-2.0 * cos_w0) / a0,
            a2: (1.0 - alpha) / a0,
        }
    }

    pub fn butterworth_lowpass(sample_rate: f64, frequency: f64) -> Self {
        Self::calculate(FilterType::LowPass, sample_rate, frequency, BUTTERWORTH_Q)
    }

    pub fn butterworth_highpass(sample_rate: f64, frequency: f64) -> Self {
        Self::calculate(FilterType::HighPass, sample_rate, frequency, BUTTERWORTH_Q)
    }

    /// Magnitude response at `frequency`
    pub fn magnitude(&self, sample_rate: f64, frequency: f64) -> f64 {
        let w = 2.0 * PI * frequency / sample_rate;
        let (c1, s1) = (w.cos(), w.sin());
        let (c2, s2) = ((2.0 * w).cos(), (2.0 * w).sin());
        let num_re = self.b0 + self.b1 * c1 + self.b2 * c2;
        let num_im = -(self.b1 * s1 + self.b2 * s2);
        let den_re = 1.0 + self.a1 * c1 + self.a2 * c2;
        let den_im = -(self.a1 * s1 + self.a2 * s2);
        (num_re.hypot(num_im)) / (den_re.hypot(den_im))
    }
}

impl Default for BiquadCoeffs {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Delay-line memory for one channel of one section
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BiquadState {
    x1: f64, // x[n-1]
    x2: f64, // x[n-2]
    y1: f64, // y[n-1]
    y2: f64, // y[n-2]
}

impl BiquadState {
    /// Process a single sample (Direct Form I)
    #[inline]
    pub fn process(&mut self, input: f64, coeffs: &BiquadCoeffs) -> f64 {
        let output = coeffs.b0 * input + coeffs.b1 * self.x1 + coeffs.b2 * self.x2
            - coeffs.a1 * self.y1
            - coeffs.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_cleared(&self) -> bool {
        *self == Self::default()
    }
}

/// One biquad section with independent state for each stereo channel
#[derive(Debug, Clone, Default)]
pub struct StereoBiquad {
    coeffs: BiquadCoeffs,
    states: [BiquadState; 2],
}

impl StereoBiquad {
    pub fn new(coeffs: BiquadCoeffs) -> Self {
        Self {
            coeffs,
            states: [BiquadState::default(); 2],
        }
    }

    /// Replace coefficients; delay lines are kept
    pub fn set_coeffs(&mut self, coeffs: BiquadCoeffs) {
        self.coeffs = coeffs;
    }

    pub fn coeffs(&self) -> &BiquadCoeffs {
        &self.coeffs
    }

    /// Filter a channel slice in place using the state of `channel`
    #[inline]
    pub fn process_slice(&mut self, channel: usize, samples: &mut [f32]) {
        let state = &mut self.states[channel];
        for s in samples.iter_mut() {
            *s = state.process(*s as f64, &self.coeffs) as f32;
        }
    }

    pub fn reset(&mut self) {
        for state in &mut self.states {
            state.reset();
        }
    }

    pub fn is_cleared(&self) -> bool {
        self.states.iter().all(BiquadState::is_cleared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const SR: f64 = 48000.0;

    #[test]
    fn test_lowpass_response() {
        let c = BiquadCoeffs::butterworth_lowpass(SR, 1000.0);
        assert_abs_diff_eq!(c.magnitude(SR, 1.0), 1.0, epsilon = 1e-4);
        // -3 dB at cutoff for Q = 1/sqrt(2)
        assert_abs_diff_eq!(c.magnitude(SR, 1000.0), FRAC_1_SQRT_2, epsilon = 1e-3);
        // Roughly 12 dB/octave well above cutoff
        assert!(c.magnitude(SR, 8000.0) < 0.02);
    }

    #[test]
    fn test_highpass_response() {
        let c = BiquadCoeffs::butterworth_highpass(SR, 1000.0);
        assert_abs_diff_eq!(c.magnitude(SR, 20000.0), 1.0, epsilon = 1e-2);
        assert_abs_diff_eq!(c.magnitude(SR, 1000.0), FRAC_1_SQRT_2, epsilon = 1e-3);
        assert!(c.magnitude(SR, 125.0) < 0.02);
    }

    #[test]
    fn test_cutoff_clamped_below_nyquist() {
        let clamped = BiquadCoeffs::butterworth_lowpass(32000.0, 20000.0);
        let limit = BiquadCoeffs::butterworth_lowpass(32000.0, 16000.0 * NYQUIST_SAFETY);
        assert_eq!(clamped, limit);
        assert!(clamped.b0.is_finite() && clamped.a2.abs() < 1.0);
    }

    #[test]
    fn test_dc_passes_lowpass() {
        let mut section = StereoBiquad::new(BiquadCoeffs::butterworth_lowpass(SR, 500.0));
        let mut samples = vec![1.0f32; 4800];
        section.process_slice(0, &mut samples);
        assert_abs_diff_eq!(*samples.last().unwrap(), 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_coefficient_update_keeps_state() {
        let mut section = StereoBiquad::new(BiquadCoeffs::butterworth_lowpass(SR, 500.0));
        let mut samples = vec![0.5f32; 64];
        section.process_slice(1, &mut samples);
        assert!(!section.is_cleared());

        section.set_coeffs(BiquadCoeffs::butterworth_lowpass(SR, 5000.0));
        assert!(!section.is_cleared());

        section.reset();
        assert!(section.is_cleared());
    }

    #[test]
    fn test_channels_are_independent() {
        let mut section = StereoBiquad::new(BiquadCoeffs::butterworth_highpass(SR, 200.0));
        let mut left = vec![1.0f32; 16];
        section.process_slice(0, &mut left);
        let mut right = vec![1.0f32; 16];
        section.process_slice(1, &mut right);
        assert_eq!(left, right);
    }
}
