//! Value to radius mapping and nearest achievable value lookup

use crate::{
    core::config::RadiusBounds,
    scaling::calculator::{ScaleParameters, ScalingMethod},
};

/// What the applier needs to know about the full value set to treat values
/// above the scale's range as outliers rather than clamping them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlierContext {
    pub actual_max: f64,
}

impl OutlierContext {
    /// Context from the full value set; `None` if it holds no finite value
    pub fn from_values(values: &[f64]) -> Option<Self> {
        values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .reduce(f64::max)
            .map(|actual_max| Self { actual_max })
    }
}

/// Radius of the value at the top of the scale's range. A linear scale
/// spends the whole budget, so its top is exactly `max_radius`.
pub fn radius_at_max(params: &ScaleParameters, bounds: &RadiusBounds) -> f64 {
    match params.method {
        ScalingMethod::Linear => bounds.max_radius,
        ScalingMethod::Degenerate => bounds.min_radius,
        ScalingMethod::AdaptiveOutlier => (bounds.min_radius_squared()
            + (params.max_value - params.min_value) * params.scale_factor)
            .sqrt(),
    }
}

/// Maps one value to a circle radius.
///
/// Values inside the scale's range are area-linear between the radius
/// bounds. Values above the range get a sub-linear bonus on top of the
/// range-top radius when `outliers` shows the data really extends there;
/// otherwise they clamp like every other out-of-range value. Non-finite
/// values get the minimum radius.
pub fn apply_scaling(
    value: f64,
    params: &ScaleParameters,
    bounds: &RadiusBounds,
    outliers: Option<&OutlierContext>,
) -> f64 {
    if !value.is_finite() || params.is_degenerate() {
        return bounds.min_radius;
    }

    if let Some(context) = outliers {
        if value > params.max_value && context.actual_max > params.max_value {
            let position = ((value - params.max_value) / (context.actual_max - params.max_value))
                .clamp(0.0, 1.0);
            let top_radius = radius_at_max(params, bounds);
            let remaining = bounds.max_radius - top_radius;
            let bonus = remaining * params.outlier_bonus_share * position;
            return (top_radius + bonus).min(bounds.max_radius);
        }
    }

    let clamped = value.clamp(params.min_value, params.max_value);
    if clamped == params.max_value {
        return radius_at_max(params, bounds);
    }
    (bounds.min_radius_squared() + (clamped - params.min_value) * params.scale_factor).sqrt()
}

/// Value of `sorted_values` nearest to `target`; ties keep the earlier one.
/// `None` only for an empty slice.
pub fn find_closest_value(sorted_values: &[f64], target: f64) -> Option<f64> {
    let mut best: Option<(f64, f64)> = None;
    for &value in sorted_values {
        let distance = (value - target).abs();
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((value, distance)),
        }
    }
    best.map(|(value, _)| value)
}
