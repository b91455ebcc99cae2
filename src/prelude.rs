//! Prelude module for common maplet-bubbles types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use maplet_bubbles::prelude::*;`

pub use crate::core::{
    bounds::Bounds,
    config::{
        InteractionConfig, RadiusBounds, ScalingPolicy, SymbolMapConfig, SymbolMapProfile,
        SymbolStyle,
    },
    geo::{LatLng, LatLngBounds, Point},
    viewport::MapViewport,
};

pub use crate::data::{
    dataset::SymbolDatasetBuilder,
    point::{DataPoint, SelectionKey, TooltipItem},
};

pub use crate::layers::{
    manager::{PointerOutcome, SymbolLayerHost},
    overlay::{InteractionOverlay, OverlayEntry, OverlayResponse, OverlayServices, OverlayTarget},
    selection::{PendingSelection, ResolvedSelection, SelectionSynchronizer, SelectionTicket},
    symbol::{RenderedSymbol, SymbolLayer, SymbolLayerOptions},
};

pub use crate::legend::{
    format::format_legend_value,
    resolver::{resolve_legend_values, LegendEntry, LegendValues},
};

pub use crate::scaling::{
    applier::{apply_scaling, find_closest_value, OutlierContext},
    calculator::{calculate_scale, calculate_scale_with_policy, ScaleParameters, ScalingMethod},
};

pub use crate::input::events::{EventHandled, KeyModifiers, MouseButton, PointerEvent};

pub use crate::rendering::{
    context::{DrawCommand, RenderContext},
    style::{CircleRenderStyle, Color},
};

pub use crate::traits::{
    ListenerId, MapView, SelectionId, SelectionIdentity, SelectionManager, TooltipService,
    ViewChangeListener, WarningSink,
};

pub use crate::{Error as MapError, Result};

pub use std::{
    sync::{Arc, Mutex, Weak},
    time::Duration,
};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};

pub use futures::future::BoxFuture;
