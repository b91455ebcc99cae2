//! # maplet-bubbles
//!
//! Proportional circle symbols for interactive maps.
//!
//! The crate has two halves. The scaling half turns arbitrary magnitudes into
//! circle radii with an outlier-robust, area-linear policy and resolves legend
//! values that the data can actually produce. The layer half draws one circle
//! per data point on a batch render surface and keeps an invisible,
//! pointer-enabled overlay at exactly the same screen pixels so that clicks,
//! tooltips and wheel gestures land on the right symbol as the map moves.

pub mod animation;
pub mod core;
pub mod data;
pub mod input;
pub mod layers;
pub mod legend;
pub mod prelude;
pub mod rendering;
pub mod scaling;
pub mod traits;
pub use crate::core::constants;

// Re-export public API
pub use core::{
    bounds::Bounds,
    config::{RadiusBounds, ScalingPolicy, SymbolMapConfig},
    geo::{LatLng, LatLngBounds, Point},
    viewport::MapViewport,
};

pub use data::point::{DataPoint, SelectionKey, TooltipItem};

pub use layers::{
    manager::SymbolLayerHost,
    overlay::{InteractionOverlay, OverlayEntry},
    selection::SelectionSynchronizer,
    symbol::{RenderedSymbol, SymbolLayer},
};

pub use legend::resolver::{LegendEntry, LegendValues};

pub use scaling::{
    applier::{apply_scaling, find_closest_value, OutlierContext},
    calculator::{calculate_scale, ScaleParameters, ScalingMethod},
};

pub use traits::{
    MapView, SelectionId, SelectionIdentity, SelectionManager, TooltipService,
    ViewChangeListener, WarningSink,
};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Missing required role: {0}")]
    MissingRole(String),

    #[error("Map view unavailable: {0}")]
    ViewUnavailable(String),

    #[error("Selection error: {0}")]
    Selection(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Layer error: {0}")]
    Layer(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error type alias for convenience
pub type Error = MapError;
