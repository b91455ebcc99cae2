//! Collaborator seams
//!
//! The symbol layer does not own a map, a selection model or a tooltip
//! renderer. It consumes them through the traits below so hosts can plug in
//! their own implementations (and tests can plug in recording doubles).

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    core::{
        bounds::Bounds,
        geo::{LatLng, Point},
    },
    data::point::TooltipItem,
    layers::overlay::{OverlayId, OverlayTarget},
    Result,
};

/// Opaque identity of a selectable data point.
///
/// Two identities are the same selection target exactly when their keys are
/// equal; nothing else about the value is inspected.
pub trait SelectionIdentity: Send + Sync + fmt::Debug {
    fn key(&self) -> &str;
}

/// Shared handle to a selection identity
pub type SelectionId = Arc<dyn SelectionIdentity>;

/// Key equality, the only comparison defined for identities
pub fn same_identity(a: &dyn SelectionIdentity, b: &dyn SelectionIdentity) -> bool {
    a.key() == b.key()
}

/// Host selection model
#[async_trait]
pub trait SelectionManager: Send + Sync {
    /// Select `identity` (adding to the current selection when `additive`)
    /// and return every identity selected afterwards.
    async fn select(&self, identity: SelectionId, additive: bool) -> Result<Vec<SelectionId>>;
}

/// Lazily produces the tooltip rows for one overlay entry
pub type TooltipProvider = Arc<dyn Fn() -> Vec<TooltipItem> + Send + Sync>;

/// Lazily produces the selection identity for one overlay entry
pub type IdentityProvider = Arc<dyn Fn() -> Option<SelectionId> + Send + Sync>;

/// Host tooltip renderer
pub trait TooltipService: Send + Sync {
    fn add_tooltip(
        &self,
        target: OverlayTarget,
        tooltip: TooltipProvider,
        identity: IdentityProvider,
        enabled: bool,
    );

    /// Drop every tooltip registered under an overlay root
    fn remove_tooltips(&self, _root: OverlayId) {}
}

/// Handle returned when registering a view-change listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Post-render callback registered with a map view
pub trait ViewChangeListener: Send + Sync {
    fn on_view_change(&self, view: &dyn MapView);
}

/// Map view capability consumed by the symbol layer.
///
/// Projected positions live in the map's planar working projection and do
/// not change with pan or zoom; screen pixels do.
pub trait MapView: Send + Sync {
    /// Geographic coordinate to projected position
    fn project(&self, lat_lng: &LatLng) -> Point;

    /// Projected position to current screen pixel, `None` while the view has
    /// not been laid out yet
    fn pixel_from_projected(&self, projected: &Point) -> Option<Point>;

    fn zoom(&self) -> f64;

    fn animate_zoom(&self, zoom: f64, duration_ms: u64);

    fn on_view_change(&self, listener: Arc<dyn ViewChangeListener>) -> ListenerId;

    fn remove_view_change_listener(&self, id: ListenerId) -> Result<()>;

    /// Fit the view around a projected extent
    fn fit_extent(&self, _extent: &Bounds, _padding: f64) {}
}

/// Host channel for user-facing warnings
pub trait WarningSink: Send + Sync {
    fn display_warning(&self, title: &str, message: &str);
}

/// Warning sink that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct LogWarningSink;

impl WarningSink for LogWarningSink {
    fn display_warning(&self, title: &str, message: &str) {
        log::warn!("{}: {}", title, message);
    }
}

/// Linear interpolation
pub trait Lerp {
    fn lerp(&self, other: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        self + (other - self) * t
    }
}

impl Lerp for Point {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        Point::new(self.x.lerp(&other.x, t), self.y.lerp(&other.y, t))
    }
}
