//! Robust value range and area-linear scale factor
//!
//! Radii are derived so that squared radius (and therefore circle area) is
//! linear in the value. The "normal" range is taken from the 5th/95th
//! percentiles; when the top tail sits far above p95 it is compressed into a
//! reserved slice of the radius budget instead of stretching the whole scale.

use serde::{Deserialize, Serialize};

use crate::core::config::{RadiusBounds, ScalingPolicy};

/// How the value range of a scale was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalingMethod {
    /// Values map linearly onto the full squared-radius budget
    Linear,
    /// p5..p95 uses part of the budget, the tail above p95 gets a bonus
    AdaptiveOutlier,
    /// No spread (or no finite values); every symbol gets the minimum radius
    Degenerate,
}

impl std::fmt::Display for ScalingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalingMethod::Linear => write!(f, "linear"),
            ScalingMethod::AdaptiveOutlier => write!(f, "adaptive-outlier"),
            ScalingMethod::Degenerate => write!(f, "degenerate"),
        }
    }
}

/// Scale derived once per data update
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleParameters {
    pub min_value: f64,
    pub max_value: f64,
    /// Squared-radius pixels per value unit, never negative
    pub scale_factor: f64,
    pub method: ScalingMethod,
    /// Bonus share used for values above `max_value`
    pub outlier_bonus_share: f64,
}

impl ScaleParameters {
    /// Scale used when there is nothing to measure
    pub fn degenerate(value: f64, policy: &ScalingPolicy) -> Self {
        Self {
            min_value: value,
            max_value: value,
            scale_factor: 1.0,
            method: ScalingMethod::Degenerate,
            outlier_bonus_share: policy.outlier_bonus_share,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.max_value == self.min_value
    }
}

/// Order statistics of the finite values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueSummary {
    pub count: usize,
    pub actual_min: f64,
    pub actual_max: f64,
    pub lower: f64,
    pub upper: f64,
}

impl ValueSummary {
    /// Summarizes already sorted, finite values; `None` when empty
    pub fn from_sorted(sorted: &[f64], policy: &ScalingPolicy) -> Option<Self> {
        let n = sorted.len();
        let last = n.checked_sub(1)?;
        let index = |p: f64| ((n as f64 * p).floor() as usize).min(last);

        Some(Self {
            count: n,
            actual_min: sorted[0],
            actual_max: sorted[last],
            lower: sorted[index(policy.lower_percentile)],
            upper: sorted[index(policy.upper_percentile)],
        })
    }

    pub fn percentile_range(&self) -> f64 {
        self.upper - self.lower
    }

    /// Tail length above the upper percentile relative to the percentile span
    pub fn outlier_gap_ratio(&self) -> f64 {
        let range = self.percentile_range();
        if range == 0.0 {
            0.0
        } else {
            (self.actual_max - self.upper) / range
        }
    }
}

/// Finite values in ascending order
pub fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    finite.sort_by(f64::total_cmp);
    finite
}

/// Computes the scale for `values` with the default policy
pub fn calculate_scale(values: &[f64], bounds: &RadiusBounds) -> ScaleParameters {
    calculate_scale_with_policy(values, bounds, &ScalingPolicy::default())
}

/// Computes the scale for `values`; non-finite values are ignored
pub fn calculate_scale_with_policy(
    values: &[f64],
    bounds: &RadiusBounds,
    policy: &ScalingPolicy,
) -> ScaleParameters {
    let sorted = sorted_finite(values);
    let Some(summary) = ValueSummary::from_sorted(&sorted, policy) else {
        log::debug!("no finite magnitudes, using degenerate scale");
        return ScaleParameters::degenerate(0.0, policy);
    };

    let range = summary.percentile_range();
    let gap_ratio = summary.outlier_gap_ratio();
    let adaptive = gap_ratio > policy.outlier_gap_ratio && range > policy.degenerate_spread;

    let (min_value, max_value) = if adaptive || range >= policy.degenerate_spread {
        (summary.lower, summary.upper)
    } else {
        (summary.actual_min, summary.actual_max)
    };

    let min_sq = bounds.min_radius_squared();
    let max_sq = bounds.max_radius_squared();

    let params = if max_value == min_value {
        ScaleParameters::degenerate(min_value, policy)
    } else if adaptive {
        let effective_max_sq = min_sq + policy.percentile_budget_share * (max_sq - min_sq);
        ScaleParameters {
            min_value,
            max_value,
            scale_factor: (effective_max_sq - min_sq) / (max_value - min_value),
            method: ScalingMethod::AdaptiveOutlier,
            outlier_bonus_share: policy.outlier_bonus_share,
        }
    } else {
        ScaleParameters {
            min_value,
            max_value,
            scale_factor: (max_sq - min_sq) / (max_value - min_value),
            method: ScalingMethod::Linear,
            outlier_bonus_share: policy.outlier_bonus_share,
        }
    };

    log::debug!(
        "scale over {} values: {} [{}, {}] factor {:.6} (gap ratio {:.3})",
        summary.count,
        params.method,
        params.min_value,
        params.max_value,
        params.scale_factor,
        gap_ratio
    );

    params
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> RadiusBounds {
        RadiusBounds::new(5.0, 30.0)
    }

    #[test]
    fn test_empty_and_non_finite_input() {
        for values in [vec![], vec![f64::NAN, f64::INFINITY, f64::NEG_INFINITY]] {
            let params = calculate_scale(&values, &bounds());
            assert_eq!(params.min_value, 0.0);
            assert_eq!(params.max_value, 0.0);
            assert_eq!(params.scale_factor, 1.0);
            assert_eq!(params.method, ScalingMethod::Degenerate);
        }
    }

    #[test]
    fn test_linear_scale_factor() {
        let params = calculate_scale(&[100.0, 400.0, 900.0], &bounds());
        assert_eq!(params.method, ScalingMethod::Linear);
        assert_eq!(params.min_value, 100.0);
        assert_eq!(params.max_value, 900.0);
        assert!((params.scale_factor - 875.0 / 800.0).abs() < 1e-12);
    }

    #[test]
    fn test_identical_values_are_degenerate() {
        let params = calculate_scale(&[100.0, 100.0, 100.0], &bounds());
        assert_eq!(params.min_value, 100.0);
        assert_eq!(params.max_value, 100.0);
        assert_eq!(params.scale_factor, 1.0);
        assert!(params.is_degenerate());
    }

    #[test]
    fn test_near_degenerate_spread_uses_actual_extremes() {
        // 40 values with p5 == p95 but a real spread at the ends
        let mut values = vec![10.0; 40];
        values[0] = 9.0;
        values[39] = 12.0;
        let params = calculate_scale(&values, &bounds());
        assert_eq!(params.method, ScalingMethod::Linear);
        assert_eq!(params.min_value, 9.0);
        assert_eq!(params.max_value, 12.0);
    }

    #[test]
    fn test_small_sets_cannot_trigger_adaptive_mode() {
        // with n <= 20 the p95 index is the last element, so the gap is zero
        let params = calculate_scale(&[1.0, 2.0, 3.0, 4.0, 100.0], &bounds());
        assert_eq!(params.method, ScalingMethod::Linear);
        assert_eq!(params.max_value, 100.0);
    }

    #[test]
    fn test_adaptive_mode_with_outlier_tail() {
        let mut values: Vec<f64> = (1..=40).map(f64::from).collect();
        values.push(1000.0);
        values.push(5000.0);
        let params = calculate_scale(&values, &bounds());

        assert_eq!(params.method, ScalingMethod::AdaptiveOutlier);
        // n = 42: p5 index 2, p95 index 39
        assert_eq!(params.min_value, 3.0);
        assert_eq!(params.max_value, 40.0);

        let effective = 25.0 + 0.8 * (900.0 - 25.0);
        assert!((params.scale_factor - (effective - 25.0) / 37.0).abs() < 1e-12);
    }

    #[test]
    fn test_percentile_clipping_in_linear_mode() {
        // gap ratio below threshold: p5/p95 still bound the scale
        let values: Vec<f64> = (0..100).map(f64::from).collect();
        let params = calculate_scale(&values, &bounds());
        assert_eq!(params.method, ScalingMethod::Linear);
        assert_eq!(params.min_value, 5.0);
        assert_eq!(params.max_value, 95.0);
    }

    #[test]
    fn test_invariants_over_varied_inputs() {
        let inputs: Vec<Vec<f64>> = vec![
            vec![-5.0, 0.0, 5.0],
            vec![0.5],
            vec![1e-9, 2e-9, 3e-9],
            (0..250).map(|i| (i as f64).powi(3)).collect(),
            vec![f64::NAN, 7.0, 7.0, 8.0],
        ];
        for values in inputs {
            let params = calculate_scale(&values, &bounds());
            assert!(params.min_value <= params.max_value, "{:?}", params);
            assert!(params.scale_factor >= 0.0, "{:?}", params);
        }
    }

    #[test]
    fn test_method_display() {
        assert_eq!(ScalingMethod::Linear.to_string(), "linear");
        assert_eq!(ScalingMethod::AdaptiveOutlier.to_string(), "adaptive-outlier");
    }
}
