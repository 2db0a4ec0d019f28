//! Soft-knee static gain curve
//!
//! Maps level-over-threshold (dB) to a target gain change (dB, <= 0).

/// Ratio and knee width of a compressor's static curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainCurve {
    pub ratio: f32,
    pub knee_db: f32,
}

impl GainCurve {
    pub fn new(ratio: f32, knee_db: f32) -> Self {
        Self { ratio, knee_db }
    }

    /// Target gain in dB for a level `over` dB above threshold
    ///
    /// - above the knee: linear, `over * (1/ratio - 1)`
    /// - inside the knee: quadratic, matching value and slope at both edges
    /// - below the knee: 0
    ///
    /// With `knee_db == 0` the middle branch is unreachable (`over >= 0` is
    /// taken by the first branch), so the quadratic never divides by zero.
    #[inline]
    pub fn gain_db(&self, over: f32) -> f32 {
        let slope = 1.0 / self.ratio - 1.0;
        let half_knee = self.knee_db * 0.5;

        if over >= half_knee {
            over * slope
        } else if over >= -half_knee {
            let x = over + half_knee;
            slope * x * x / (2.0 * self.knee_db)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_no_reduction_below_knee() {
        let curve = GainCurve::new(4.0, 6.0);
        for over in [-3.01, -10.0, -60.0] {
            assert_eq!(curve.gain_db(over), 0.0);
        }
    }

    #[test]
    fn test_linear_above_knee() {
        let curve = GainCurve::new(4.0, 6.0);
        for over in [3.0, 6.0, 20.0] {
            assert_eq!(curve.gain_db(over), over * (1.0 / 4.0 - 1.0));
        }
    }

    #[test]
    fn test_continuity_at_knee_edges() {
        for knee in [0.5, 6.0, 18.0] {
            for ratio in [1.5, 4.0, 20.0] {
                let curve = GainCurve::new(ratio, knee);
                let half = knee / 2.0;
                let slope = 1.0 / ratio - 1.0;
                // Knee formula evaluated exactly at each edge
                let x_top = half + half;
                let knee_top = slope * x_top * x_top / (2.0 * knee);
                assert_abs_diff_eq!(knee_top, half * slope, epsilon = 1e-5);
                let x_bottom = -half + half;
                let knee_bottom = slope * x_bottom * x_bottom / (2.0 * knee);
                assert_abs_diff_eq!(knee_bottom, 0.0, epsilon = 1e-6);

                // And approached from either side
                let eps = 1e-3;
                assert_abs_diff_eq!(
                    curve.gain_db(half - eps),
                    curve.gain_db(half + eps),
                    epsilon = 1e-2
                );
                assert_abs_diff_eq!(
                    curve.gain_db(-half - eps),
                    curve.gain_db(-half + eps),
                    epsilon = 1e-2
                );
            }
        }
    }

    #[test]
    fn test_hard_knee_has_no_division() {
        let curve = GainCurve::new(4.0, 0.0);
        assert_eq!(curve.gain_db(-0.001), 0.0);
        assert_eq!(curve.gain_db(0.0), 0.0);
        assert_eq!(curve.gain_db(6.0), -4.5);
        assert!(curve.gain_db(-0.0).is_finite());
    }

    #[test]
    fn test_unity_ratio_is_bypass() {
        let curve = GainCurve::new(1.0, 12.0);
        for over in [-20.0, -1.0, 0.0, 3.0, 40.0] {
            assert_eq!(curve.gain_db(over), 0.0);
        }
    }

    #[test]
    fn test_knee_is_monotonic() {
        let curve = GainCurve::new(8.0, 12.0);
        let mut last = curve.gain_db(-10.0);
        let mut over = -10.0;
        while over < 10.0 {
            over += 0.25;
            let g = curve.gain_db(over);
            assert!(g <= last + 1e-6);
            last = g;
        }
    }
}
