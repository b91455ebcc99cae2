//! Configuration for symbol scaling, styling and interaction
//!
//! Every policy number the scaling algorithm and the overlay use lives here
//! with defaults equal to the constants in [`crate::core::constants`], so
//! hosts can load a JSON configuration or pick a preset profile.

use serde::{Deserialize, Serialize};

use crate::{
    core::constants::*,
    input::events::KeyModifiers,
    rendering::style::Color,
    MapError, Result,
};

/// Smallest and largest circle radius in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadiusBounds {
    pub min_radius: f64,
    pub max_radius: f64,
}

impl RadiusBounds {
    pub fn new(min_radius: f64, max_radius: f64) -> Self {
        Self {
            min_radius,
            max_radius,
        }
    }

    pub fn min_radius_squared(&self) -> f64 {
        self.min_radius * self.min_radius
    }

    pub fn max_radius_squared(&self) -> f64 {
        self.max_radius * self.max_radius
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.min_radius.is_finite() && self.max_radius.is_finite()) {
            return Err(MapError::Config("radius bounds must be finite".to_string()).into());
        }
        if self.min_radius <= 0.0 {
            return Err(MapError::Config(format!(
                "min_radius must be positive, got {}",
                self.min_radius
            ))
            .into());
        }
        if self.min_radius > self.max_radius {
            return Err(MapError::Config(format!(
                "min_radius {} exceeds max_radius {}",
                self.min_radius, self.max_radius
            ))
            .into());
        }
        Ok(())
    }
}

impl Default for RadiusBounds {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_RADIUS, DEFAULT_MAX_RADIUS)
    }
}

/// Outlier and degeneracy policy for the scale calculation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalingPolicy {
    pub lower_percentile: f64,
    pub upper_percentile: f64,
    pub outlier_gap_ratio: f64,
    pub degenerate_spread: f64,
    pub percentile_budget_share: f64,
    pub outlier_bonus_share: f64,
}

impl ScalingPolicy {
    pub fn validate(&self) -> Result<()> {
        let unit = |name: &str, v: f64| -> Result<()> {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(MapError::Config(format!("{} must be within [0, 1], got {}", name, v)).into())
            }
        };

        unit("lower_percentile", self.lower_percentile)?;
        unit("upper_percentile", self.upper_percentile)?;
        unit("percentile_budget_share", self.percentile_budget_share)?;
        unit("outlier_bonus_share", self.outlier_bonus_share)?;

        if self.lower_percentile > self.upper_percentile {
            return Err(MapError::Config(format!(
                "lower_percentile {} exceeds upper_percentile {}",
                self.lower_percentile, self.upper_percentile
            ))
            .into());
        }
        if self.outlier_gap_ratio < 0.0 || self.degenerate_spread < 0.0 {
            return Err(MapError::Config(
                "outlier_gap_ratio and degenerate_spread must be non-negative".to_string(),
            )
            .into());
        }
        Ok(())
    }
}

impl Default for ScalingPolicy {
    fn default() -> Self {
        Self {
            lower_percentile: LOWER_PERCENTILE,
            upper_percentile: UPPER_PERCENTILE,
            outlier_gap_ratio: OUTLIER_GAP_RATIO,
            degenerate_spread: DEGENERATE_SPREAD,
            percentile_budget_share: PERCENTILE_BUDGET_SHARE,
            outlier_bonus_share: OUTLIER_BONUS_SHARE,
        }
    }
}

/// Visual style shared by every symbol of a layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolStyle {
    pub fill_color: Color,
    pub stroke_color: Color,
    /// Fill of the circle drawn for the second magnitude series
    pub secondary_fill_color: Color,
    pub fill_opacity: f32,
    pub stroke_opacity: f32,
    pub stroke_width: f32,
    pub z_index: i32,
    /// Opacity multiplier applied to symbols left out of a selection
    pub dimmed_opacity_factor: f32,
}

impl SymbolStyle {
    pub fn validate(&self) -> Result<()> {
        for (name, v) in [
            ("fill_opacity", self.fill_opacity),
            ("stroke_opacity", self.stroke_opacity),
            ("dimmed_opacity_factor", self.dimmed_opacity_factor),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(
                    MapError::Config(format!("{} must be within [0, 1], got {}", name, v)).into(),
                );
            }
        }
        if self.stroke_width < 0.0 {
            return Err(MapError::Config("stroke_width must be non-negative".to_string()).into());
        }
        Ok(())
    }
}

impl Default for SymbolStyle {
    fn default() -> Self {
        Self {
            fill_color: Color::rgb(0x11, 0x8d, 0xff),
            stroke_color: Color::WHITE,
            secondary_fill_color: Color::rgb(0xe6, 0x6c, 0x37),
            fill_opacity: 0.85,
            stroke_opacity: 1.0,
            stroke_width: 1.0,
            z_index: 10,
            dimmed_opacity_factor: DIMMED_OPACITY_FACTOR as f32,
        }
    }
}

/// Pointer behavior of the interaction overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    pub min_hit_radius: f64,
    pub wheel_zoom_step: f64,
    pub wheel_zoom_duration_ms: u64,
    pub tooltips_enabled: bool,
}

impl InteractionConfig {
    /// Ctrl (or Cmd on macOS) extends the current selection
    pub fn is_additive(&self, modifiers: &KeyModifiers) -> bool {
        modifiers.ctrl || modifiers.meta
    }
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            min_hit_radius: MIN_HIT_RADIUS,
            wheel_zoom_step: WHEEL_ZOOM_STEP,
            wheel_zoom_duration_ms: WHEEL_ZOOM_DURATION_MS,
            tooltips_enabled: true,
        }
    }
}

/// Complete configuration of a proportional symbol layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolMapConfig {
    pub radius: RadiusBounds,
    pub scaling: ScalingPolicy,
    pub style: SymbolStyle,
    pub interaction: InteractionConfig,
    /// Keep the current view when new data arrives instead of fitting to it
    pub lock_extent: bool,
}

impl SymbolMapConfig {
    /// Parses a (possibly partial) JSON configuration and validates it
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SymbolMapConfig = serde_json::from_str(json).map_err(MapError::from)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.radius.validate()?;
        self.scaling.validate()?;
        self.style.validate()?;
        if self.interaction.min_hit_radius < 0.0 {
            return Err(MapError::Config("min_hit_radius must be non-negative".to_string()).into());
        }
        Ok(())
    }
}

impl Default for SymbolMapConfig {
    fn default() -> Self {
        SymbolMapProfile::default().resolve()
    }
}

/// Preset configurations
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SymbolMapProfile {
    #[default]
    Balanced,
    /// Small symbols for dense point sets
    Compact,
    /// Large symbols for a handful of locations
    Prominent,
    Custom(Box<SymbolMapConfig>),
}

impl SymbolMapProfile {
    pub fn resolve(&self) -> SymbolMapConfig {
        let base = |radius: RadiusBounds, stroke_width: f32| SymbolMapConfig {
            radius,
            scaling: ScalingPolicy::default(),
            style: SymbolStyle {
                stroke_width,
                ..SymbolStyle::default()
            },
            interaction: InteractionConfig::default(),
            lock_extent: false,
        };

        match self {
            Self::Balanced => base(RadiusBounds::default(), 1.0),
            Self::Compact => base(RadiusBounds::new(2.0, 14.0), 0.5),
            Self::Prominent => base(RadiusBounds::new(8.0, 48.0), 2.0),
            Self::Custom(config) => config.as_ref().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_policy_constants() {
        let config = SymbolMapConfig::default();
        assert_eq!(config.radius.min_radius, 5.0);
        assert_eq!(config.radius.max_radius, 30.0);
        assert_eq!(config.scaling.outlier_gap_ratio, 0.2);
        assert_eq!(config.scaling.percentile_budget_share, 0.8);
        assert_eq!(config.scaling.degenerate_spread, 0.001);
        assert_eq!(config.interaction.min_hit_radius, 8.0);
        assert_eq!(config.interaction.wheel_zoom_step, 0.5);
        assert!(!config.lock_extent);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_profiles() {
        let compact = SymbolMapProfile::Compact.resolve();
        let prominent = SymbolMapProfile::Prominent.resolve();
        assert!(compact.radius.max_radius < prominent.radius.max_radius);
        assert!(compact.validate().is_ok());
        assert!(prominent.validate().is_ok());

        let custom = SymbolMapProfile::Custom(Box::new(compact.clone())).resolve();
        assert_eq!(custom, compact);
    }

    #[test]
    fn test_partial_json() {
        let config = SymbolMapConfig::from_json(
            r##"{
                "radius": { "min_radius": 3.0, "max_radius": 20.0 },
                "style": { "fill_color": "#336699" },
                "lock_extent": true
            }"##,
        )
        .unwrap();

        assert_eq!(config.radius, RadiusBounds::new(3.0, 20.0));
        assert_eq!(config.style.fill_color, Color::rgb(0x33, 0x66, 0x99));
        assert_eq!(config.style.stroke_width, SymbolStyle::default().stroke_width);
        assert!(config.lock_extent);
    }

    #[test]
    fn test_invalid_json_config() {
        assert!(SymbolMapConfig::from_json(
            r#"{ "radius": { "min_radius": 40.0, "max_radius": 20.0 } }"#
        )
        .is_err());
        assert!(SymbolMapConfig::from_json(r#"{ "style": { "fill_opacity": 1.5 } }"#).is_err());
        assert!(SymbolMapConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_additive_modifiers() {
        let config = InteractionConfig::default();
        assert!(config.is_additive(&KeyModifiers {
            ctrl: true,
            ..Default::default()
        }));
        assert!(config.is_additive(&KeyModifiers {
            meta: true,
            ..Default::default()
        }));
        assert!(!config.is_additive(&KeyModifiers {
            shift: true,
            ..Default::default()
        }));
    }
}
