//! Asymmetric one-pole gain smoothing
//!
//! Gain reduction engages at the attack rate and recovers at the release
//! rate. The smoothed gain (dB) is the only history a compressor carries.

/// One-pole coefficient for a time constant in milliseconds
///
/// After `time_ms` the smoother has covered 1 - 1/e of a step.
#[inline]
pub fn time_constant_coeff(time_ms: f32, sample_rate: f64) -> f32 {
    let samples = time_ms as f64 * 0.001 * sample_rate;
    if samples > 0.0 {
        (-1.0 / samples).exp() as f32
    } else {
        0.0
    }
}

/// Attack/release smoother operating on gain in dB
#[derive(Debug, Clone)]
pub struct GainSmoother {
    alpha_attack: f32,
    alpha_release: f32,
    last_gain_db: f32,
}

impl GainSmoother {
    pub fn new() -> Self {
        Self {
            alpha_attack: 0.0,
            alpha_release: 0.0,
            last_gain_db: 0.0,
        }
    }

    /// Recompute both coefficients; history is untouched
    pub fn set_times(&mut self, attack_ms: f32, release_ms: f32, sample_rate: f64) {
        self.alpha_attack = time_constant_coeff(attack_ms, sample_rate);
        self.alpha_release = time_constant_coeff(release_ms, sample_rate);
    }

    /// Advance one sample towards `target_db` and return the smoothed gain
    #[inline]
    pub fn process(&mut self, target_db: f32) -> f32 {
        let alpha = if target_db < self.last_gain_db {
            self.alpha_attack
        } else {
            self.alpha_release
        };
        let smoothed = alpha * self.last_gain_db + (1.0 - alpha) * target_db;
        self.last_gain_db = smoothed;
        smoothed
    }

    pub fn last_gain_db(&self) -> f32 {
        self.last_gain_db
    }

    pub fn alpha_attack(&self) -> f32 {
        self.alpha_attack
    }

    pub fn alpha_release(&self) -> f32 {
        self.alpha_release
    }

    pub fn reset(&mut self) {
        self.last_gain_db = 0.0;
    }
}

impl Default for GainSmoother {
    fn default() -> Self {
        Self::new()
    }
}
