//! Scaling and interaction policy constants.
//! Empirically tuned values kept in one place; `ScalingPolicy` and
//! `InteractionConfig` default to them.

/// Lower percentile of the "normal" value range.
pub const LOWER_PERCENTILE: f64 = 0.05;

/// Upper percentile of the "normal" value range.
pub const UPPER_PERCENTILE: f64 = 0.95;

/// Outlier gap (max - p95) relative to the p5..p95 span above which the top
/// tail is compressed instead of scaled linearly.
pub const OUTLIER_GAP_RATIO: f64 = 0.2;

/// Spreads narrower than this are treated as degenerate.
pub const DEGENERATE_SPREAD: f64 = 0.001;

/// Share of the squared-radius budget given to the p5..p95 span in adaptive mode.
pub const PERCENTILE_BUDGET_SHARE: f64 = 0.8;

/// Share of the remaining radius an outlier can claim at the data maximum.
pub const OUTLIER_BONUS_SHARE: f64 = 0.8;

/// Default smallest circle radius in pixels.
pub const DEFAULT_MIN_RADIUS: f64 = 5.0;

/// Default largest circle radius in pixels.
pub const DEFAULT_MAX_RADIUS: f64 = 30.0;

/// Opacity multiplier for symbols outside an active selection.
pub const DIMMED_OPACITY_FACTOR: f64 = 0.2;

/// Smallest usable pointer target in pixels.
pub const MIN_HIT_RADIUS: f64 = 8.0;

/// Zoom levels stepped per wheel notch.
pub const WHEEL_ZOOM_STEP: f64 = 0.5;

/// Duration of the animated wheel zoom.
pub const WHEEL_ZOOM_DURATION_MS: u64 = 250;

/// Legend radii as fractions of the large entry's radius.
pub const LEGEND_MEDIUM_FRACTION: f64 = 0.5;
pub const LEGEND_SMALL_FRACTION: f64 = 0.25;

/// Web Mercator tile edge in pixels at zoom 0.
pub const TILE_SIZE: f64 = 256.0;

/// Padding used when fitting the view to the symbol extent.
pub const FIT_PADDING: f64 = 20.0;
