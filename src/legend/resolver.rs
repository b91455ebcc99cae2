//! Representative small/medium/large legend values
//!
//! Legend entries are always values the data actually contains, and their
//! radii come from the same scaling call the map uses, so a legend circle is
//! exactly as large as the matching symbol on the map.

use serde::{Deserialize, Serialize};

use crate::{
    core::{
        config::RadiusBounds,
        constants::{LEGEND_MEDIUM_FRACTION, LEGEND_SMALL_FRACTION},
    },
    legend::format::format_legend_value,
    scaling::{
        applier::{apply_scaling, find_closest_value, OutlierContext},
        calculator::{sorted_finite, ScaleParameters},
    },
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub value: f64,
    pub radius: f64,
    pub label: String,
}

impl LegendEntry {
    fn new(value: f64, radius: f64) -> Self {
        Self {
            value,
            radius,
            label: format_legend_value(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendValues {
    pub small: LegendEntry,
    pub medium: LegendEntry,
    pub large: LegendEntry,
}

impl LegendValues {
    /// Entries from smallest to largest
    pub fn entries(&self) -> [&LegendEntry; 3] {
        [&self.small, &self.medium, &self.large]
    }
}

/// Inverts the in-range area formula; a flat scale maps everything to its minimum
fn value_for_radius(radius: f64, params: &ScaleParameters, bounds: &RadiusBounds) -> f64 {
    if params.scale_factor <= 0.0 || params.is_degenerate() {
        return params.min_value;
    }
    params.min_value + (radius * radius - bounds.min_radius_squared()) / params.scale_factor
}

/// Picks legend values for `values` under `params`.
/// Returns `None` when there is no finite value to show.
pub fn resolve_legend_values(
    values: &[f64],
    params: &ScaleParameters,
    bounds: &RadiusBounds,
) -> Option<LegendValues> {
    let sorted = sorted_finite(values);
    let actual_max = *sorted.last()?;
    let outliers = OutlierContext::from_values(&sorted);
    let radius_of = |value: f64| apply_scaling(value, params, bounds, outliers.as_ref());

    let large_value = if actual_max > params.max_value {
        actual_max
    } else {
        params.max_value
    };
    let large_radius = radius_of(large_value);

    let snapped = |fraction: f64| {
        let target = value_for_radius(large_radius * fraction, params, bounds)
            .clamp(params.min_value, params.max_value);
        find_closest_value(&sorted, target).unwrap_or(target)
    };
    let medium_value = snapped(LEGEND_MEDIUM_FRACTION);
    let small_value = snapped(LEGEND_SMALL_FRACTION);

    Some(LegendValues {
        small: LegendEntry::new(small_value, radius_of(small_value)),
        medium: LegendEntry::new(medium_value, radius_of(medium_value)),
        large: LegendEntry::new(large_value, large_radius),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scaling::calculator::calculate_scale;

    fn bounds() -> RadiusBounds {
        RadiusBounds::new(5.0, 30.0)
    }

    #[test]
    fn test_entries_are_data_values() {
        let values: Vec<f64> = (1..=30).map(|i| f64::from(i) * 10.0).collect();
        let params = calculate_scale(&values, &bounds());
        let legend = resolve_legend_values(&values, &params, &bounds()).unwrap();

        for entry in legend.entries() {
            assert!(values.contains(&entry.value), "{} is not a data value", entry.value);
            let context = OutlierContext::from_values(&values);
            let expected = apply_scaling(entry.value, &params, &bounds(), context.as_ref());
            assert_eq!(entry.radius, expected);
        }
        assert!(legend.small.value <= legend.medium.value);
        assert!(legend.medium.value <= legend.large.value);
        // p95 is 290, the largest value still gets the top entry
        assert_eq!(params.max_value, 290.0);
        assert_eq!(legend.large.value, 300.0);
    }

    #[test]
    fn test_large_entry_uses_outlier() {
        let mut values: Vec<f64> = (1..=40).map(f64::from).collect();
        values.push(1000.0);
        let params = calculate_scale(&values, &bounds());
        let legend = resolve_legend_values(&values, &params, &bounds()).unwrap();

        assert_eq!(legend.large.value, 1000.0);
        assert_eq!(legend.large.label, "1K");
        assert!(legend.large.radius > legend.medium.radius);
        assert!(legend.medium.value <= params.max_value);
    }

    #[test]
    fn test_medium_targets_half_the_large_radius() {
        let values = [100.0, 400.0, 900.0];
        let params = calculate_scale(&values, &bounds());
        let legend = resolve_legend_values(&values, &params, &bounds()).unwrap();
        // 15px inverts to 100 + (225 - 25) * 800 / 875 = 282.9, nearest is 400
        assert_eq!(legend.medium.value, 400.0);
        // 7.5px inverts to 128.6, nearest is 100
        assert_eq!(legend.small.value, 100.0);
        assert_eq!(legend.small.radius, 5.0);
    }

    #[test]
    fn test_degenerate_and_empty() {
        let values = [7.0, 7.0];
        let params = calculate_scale(&values, &bounds());
        let legend = resolve_legend_values(&values, &params, &bounds()).unwrap();
        assert!(legend.entries().iter().all(|e| e.value == 7.0 && e.radius == 5.0));

        let empty = calculate_scale(&[], &bounds());
        assert!(resolve_legend_values(&[], &empty, &bounds()).is_none());
    }
}
