//! Shared, lock-free processing parameters
//!
//! Every tunable value lives in a [`Parameter`] cell that the real-time path
//! reads with a single atomic load and the control side writes with a single
//! atomic store. Values are clamped on write, so readers never see anything
//! outside the declared range.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{MultibandError, Result};

/// Lowest crossover frequency in Hz
pub const MIN_CUTOFF_HZ: f32 = 40.0;

/// Highest crossover frequency in Hz
pub const MAX_CUTOFF_HZ: f32 = 20000.0;

/// Range of the crossover cutoff parameter
pub const CUTOFF_RANGE: ParamRange = ParamRange::new(MIN_CUTOFF_HZ, MAX_CUTOFF_HZ, 1000.0);

/// Bounds and default of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamRange {
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

impl ParamRange {
    pub const fn new(min: f32, max: f32, default: f32) -> Self {
        Self { min, max, default }
    }

    /// Clamp a value into the range. NaN maps to the default.
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            self.default
        } else {
            value.clamp(self.min, self.max)
        }
    }

    pub fn contains(&self, value: f32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

// ============================================================================
// Parameter identity
// ============================================================================

/// The six per-band compressor controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressorParam {
    Attack,
    Release,
    Makeup,
    Knee,
    Threshold,
    Ratio,
}

impl CompressorParam {
    /// All compressor parameters in host order
    pub const ALL: [CompressorParam; 6] = [
        CompressorParam::Attack,
        CompressorParam::Release,
        CompressorParam::Makeup,
        CompressorParam::Knee,
        CompressorParam::Threshold,
        CompressorParam::Ratio,
    ];

    /// Suffix used in string identifiers (`band_1_<suffix>`)
    pub fn suffix(&self) -> &'static str {
        match self {
            CompressorParam::Attack => "attack",
            CompressorParam::Release => "release",
            CompressorParam::Makeup => "makeup_gain",
            CompressorParam::Knee => "knee",
            CompressorParam::Threshold => "threshold",
            CompressorParam::Ratio => "ratio",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            CompressorParam::Attack => "Attack",
            CompressorParam::Release => "Release",
            CompressorParam::Makeup => "Makeup Gain",
            CompressorParam::Knee => "Knee",
            CompressorParam::Threshold => "Threshold",
            CompressorParam::Ratio => "Ratio",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            CompressorParam::Attack | CompressorParam::Release => "ms",
            CompressorParam::Makeup | CompressorParam::Knee | CompressorParam::Threshold => "dB",
            CompressorParam::Ratio => ":1",
        }
    }

    /// Declared bounds and default
    pub fn range(&self) -> ParamRange {
        match self {
            CompressorParam::Attack => ParamRange::new(1.0, 150.0, 10.0),
            CompressorParam::Release => ParamRange::new(10.0, 1000.0, 100.0),
            CompressorParam::Makeup => ParamRange::new(-32.0, 32.0, 0.0),
            CompressorParam::Knee => ParamRange::new(0.0, 18.0, 0.0),
            CompressorParam::Threshold => ParamRange::new(-66.6, 0.0, -6.0),
            CompressorParam::Ratio => ParamRange::new(1.0, 20.0, 2.0),
        }
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        CompressorParam::ALL
            .into_iter()
            .find(|p| p.suffix() == suffix)
    }
}

/// Typed identity of a parameter inside a network
///
/// Indices are zero-based; the string form is one-based to match host
/// conventions (`band_1_attack`, `cutoff_1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamId {
    Band { band: usize, kind: CompressorParam },
    Cutoff { crossover: usize },
}

impl ParamId {
    pub fn band(band: usize, kind: CompressorParam) -> Self {
        ParamId::Band { band, kind }
    }

    pub fn cutoff(crossover: usize) -> Self {
        ParamId::Cutoff { crossover }
    }

    /// Display name shown to users
    pub fn display_name(&self) -> String {
        match self {
            ParamId::Band { band, kind } => format!("Band {} {}", band + 1, kind.label()),
            ParamId::Cutoff { crossover } => format!("Crossover {} Frequency", crossover + 1),
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            ParamId::Band { kind, .. } => kind.unit(),
            ParamId::Cutoff { .. } => "Hz",
        }
    }
}

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamId::Band { band, kind } => write!(f, "band_{}_{}", band + 1, kind.suffix()),
            ParamId::Cutoff { crossover } => write!(f, "cutoff_{}", crossover + 1),
        }
    }
}

impl FromStr for ParamId {
    type Err = MultibandError;

    fn from_str(s: &str) -> Result<Self> {
        let unknown = || MultibandError::UnknownParameter { id: s.to_string() };
        let one_based = |n: &str| -> Result<usize> {
            match n.parse::<usize>() {
                Ok(n) if n >= 1 => Ok(n - 1),
                _ => Err(unknown()),
            }
        };

        if let Some(rest) = s.strip_prefix("cutoff_") {
            return Ok(ParamId::cutoff(one_based(rest)?));
        }

        let rest = s.strip_prefix("band_").ok_or_else(unknown)?;
        let (index, suffix) = rest.split_once('_').ok_or_else(unknown)?;
        let kind = CompressorParam::from_suffix(suffix).ok_or_else(unknown)?;
        Ok(ParamId::band(one_based(index)?, kind))
    }
}

// ============================================================================
// Parameter cell
// ============================================================================

/// A named, bounded f32 value safe to share between threads
///
/// The value is stored as its IEEE-754 bit pattern in an `AtomicU32`, so a
/// read can be stale but never torn.
#[derive(Debug)]
pub struct Parameter {
    id: ParamId,
    name: String,
    range: ParamRange,
    value: AtomicU32,
}

impl Parameter {
    /// Create a parameter holding its default value
    pub fn new(id: ParamId, range: ParamRange) -> Self {
        Self {
            id,
            name: id.display_name(),
            value: AtomicU32::new(range.default.to_bits()),
            range,
        }
    }

    /// Create a parameter with an initial value other than the default
    pub fn with_value(id: ParamId, range: ParamRange, value: f32) -> Self {
        let param = Self::new(id, range);
        param.set(value);
        param
    }

    /// Convenience constructor for a shared compressor parameter
    pub fn shared_band(band: usize, kind: CompressorParam) -> Arc<Self> {
        Arc::new(Self::new(ParamId::band(band, kind), kind.range()))
    }

    pub fn id(&self) -> ParamId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn range(&self) -> ParamRange {
        self.range
    }

    /// Current value
    #[inline]
    pub fn get(&self) -> f32 {
        f32::from_bits(self.value.load(Ordering::Relaxed))
    }

    /// Store a new value, clamped to the declared range
    #[inline]
    pub fn set(&self, value: f32) {
        self.value
            .store(self.range.clamp(value).to_bits(), Ordering::Relaxed);
    }

    pub fn reset_to_default(&self) {
        self.set(self.range.default);
    }

    /// Current value mapped linearly onto 0..1
    pub fn normalized(&self) -> f32 {
        let span = self.range.max - self.range.min;
        if span <= 0.0 {
            return 0.0;
        }
        (self.get() - self.range.min) / span
    }

    /// Set from a 0..1 control value
    pub fn set_normalized(&self, normalized: f32) {
        let n = normalized.clamp(0.0, 1.0);
        self.set(self.range.min + n * (self.range.max - self.range.min));
    }
}

/// Logarithmically spaced default cutoffs for `band_count` bands
///
/// Crossover `i` sits at `40 * (20000 / 40)^((i + 1) / band_count)` Hz, which
/// splits 40 Hz to 20 kHz into bands of equal width in log-frequency.
pub fn default_cutoffs(band_count: usize) -> Vec<f32> {
    let span = (MAX_CUTOFF_HZ / MIN_CUTOFF_HZ) as f64;
    (0..band_count.saturating_sub(1))
        .map(|i| {
            let exponent = (i + 1) as f64 / band_count as f64;
            (MIN_CUTOFF_HZ as f64 * span.powf(exponent)) as f32
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use test_case::test_case;

    #[test]
    fn test_default_ranges() {
        let attack = CompressorParam::Attack.range();
        assert_eq!((attack.min, attack.max, attack.default), (1.0, 150.0, 10.0));
        let release = CompressorParam::Release.range();
        assert_eq!((release.min, release.max, release.default), (10.0, 1000.0, 100.0));
        let ratio = CompressorParam::Ratio.range();
        assert_eq!((ratio.min, ratio.max, ratio.default), (1.0, 20.0, 2.0));
        let knee = CompressorParam::Knee.range();
        assert_eq!((knee.min, knee.max, knee.default), (0.0, 18.0, 0.0));
        let threshold = CompressorParam::Threshold.range();
        assert_eq!(
            (threshold.min, threshold.max, threshold.default),
            (-66.6, 0.0, -6.0)
        );
        let makeup = CompressorParam::Makeup.range();
        assert_eq!((makeup.min, makeup.max, makeup.default), (-32.0, 32.0, 0.0));
    }

    #[test]
    fn test_set_clamps_to_range() {
        let p = Parameter::new(ParamId::band(0, CompressorParam::Ratio), CompressorParam::Ratio.range());
        assert_eq!(p.get(), 2.0);
        p.set(50.0);
        assert_eq!(p.get(), 20.0);
        p.set(0.1);
        assert_eq!(p.get(), 1.0);
        p.set(f32::NAN);
        assert_eq!(p.get(), 2.0);
        p.set(4.0);
        p.reset_to_default();
        assert_eq!(p.get(), 2.0);
    }

    #[test]
    fn test_normalized_roundtrip() {
        let p = Parameter::new(ParamId::cutoff(0), CUTOFF_RANGE);
        p.set_normalized(0.0);
        assert_eq!(p.get(), MIN_CUTOFF_HZ);
        p.set_normalized(1.0);
        assert_eq!(p.get(), MAX_CUTOFF_HZ);
        p.set(10020.0);
        assert_relative_eq!(p.normalized(), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_param_id_string_form() {
        let id = ParamId::band(0, CompressorParam::Attack);
        assert_eq!(id.to_string(), "band_1_attack");
        assert_eq!(id.display_name(), "Band 1 Attack");
        assert_eq!(ParamId::cutoff(2).to_string(), "cutoff_3");
        assert_eq!(ParamId::cutoff(2).display_name(), "Crossover 3 Frequency");

        for kind in CompressorParam::ALL {
            let id = ParamId::band(4, kind);
            assert_eq!(id.to_string().parse::<ParamId>().unwrap(), id);
        }
        assert_eq!("cutoff_1".parse::<ParamId>().unwrap(), ParamId::cutoff(0));
    }

    #[test_case("" ; "empty")]
    #[test_case("band_0_attack" ; "zero band")]
    #[test_case("band_1_loudness" ; "unknown kind")]
    #[test_case("band_1_relase" ; "misspelled release")]
    #[test_case("cutoff_0" ; "zero crossover")]
    #[test_case("cutoff_x" ; "non numeric crossover")]
    #[test_case("band_1" ; "missing kind")]
    fn test_param_id_rejects_garbage(bad: &str) {
        assert!(matches!(
            bad.parse::<ParamId>(),
            Err(MultibandError::UnknownParameter { .. })
        ));
    }

    #[test]
    fn test_default_cutoffs_log_spaced() {
        assert!(default_cutoffs(1).is_empty());

        let two = default_cutoffs(2);
        assert_eq!(two.len(), 1);
        // Geometric mean of 40 and 20000
        assert_relative_eq!(two[0], (40.0f32 * 20000.0).sqrt(), max_relative = 1e-4);

        let five = default_cutoffs(5);
        assert_eq!(five.len(), 4);
        let ratios: Vec<f32> = five.windows(2).map(|w| w[1] / w[0]).collect();
        for r in &ratios {
            assert_relative_eq!(*r, ratios[0], max_relative = 1e-4);
        }
        assert!(five.iter().all(|&f| CUTOFF_RANGE.contains(f)));
    }

    #[test]
    fn test_parameter_shared_across_threads() {
        let p = Parameter::shared_band(0, CompressorParam::Threshold);
        let writer = Arc::clone(&p);
        std::thread::spawn(move || writer.set(-30.0))
            .join()
            .unwrap();
        assert_eq!(p.get(), -30.0);
    }
}
