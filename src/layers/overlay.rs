//! Invisible, pointer-enabled twin of a symbol layer
//!
//! The batch render surface cannot be hit tested, so every symbol gets an
//! overlay entry at the same projected position. After each map render the
//! entries are re-projected to screen pixels; hit testing, tooltips and
//! selection requests all go through the entries.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use futures::future::BoxFuture;

use crate::{
    core::{config::InteractionConfig, geo::Point, lock},
    data::point::DataPoint,
    input::events::{EventHandled, MouseButton, PointerEvent},
    layers::symbol::RenderedSymbol,
    rendering::style::CircleRenderStyle,
    traits::{
        IdentityProvider, ListenerId, MapView, SelectionId, SelectionManager, TooltipProvider,
        TooltipService, ViewChangeListener,
    },
    Result,
};

static NEXT_OVERLAY_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one overlay root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayId(pub u64);

/// One entry of one overlay, the unit tooltips are registered against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayTarget {
    pub overlay: OverlayId,
    pub index: usize,
}

/// Pointer-enabled stand-in for one rendered symbol
#[derive(Debug, Clone)]
pub struct OverlayEntry {
    pub target: OverlayTarget,
    pub projected: Point,
    /// Never smaller than the configured minimum hit radius
    pub hit_radius: f64,
    /// Current screen pixel, `None` until the first successful sync
    pub screen_position: Option<Point>,
    data: Weak<DataPoint>,
}

impl OverlayEntry {
    /// The data point behind this entry, if the layer still holds it
    pub fn data(&self) -> Option<Arc<DataPoint>> {
        self.data.upgrade()
    }

    /// Fully transparent hit shape for hosts that draw the overlay
    pub fn style(&self) -> CircleRenderStyle {
        CircleRenderStyle::invisible(self.hit_radius)
    }

    pub fn contains(&self, pixel: &Point) -> bool {
        self.screen_position
            .map_or(false, |center| center.distance_to(pixel) <= self.hit_radius)
    }
}

/// Host services the overlay talks to
#[derive(Clone)]
pub struct OverlayServices {
    pub selection: Arc<dyn SelectionManager>,
    pub tooltips: Arc<dyn TooltipService>,
}

/// What the overlay did with a pointer event
#[derive(Debug, Clone)]
pub enum OverlayResponse {
    /// Not over the overlay; the map handles the event
    Ignored,
    /// Pointer rests over an entry
    Hover(OverlayTarget),
    /// Wheel zoom was started toward `zoom`
    Zoomed { zoom: f64 },
    /// A click on an entry asks the host to select its data point
    Select {
        target: OverlayTarget,
        identity: SelectionId,
        additive: bool,
    },
}

impl OverlayResponse {
    pub fn handled(&self) -> EventHandled {
        match self {
            OverlayResponse::Ignored | OverlayResponse::Hover(_) => EventHandled::NotHandled,
            OverlayResponse::Zoomed { .. } | OverlayResponse::Select { .. } => {
                EventHandled::Handled
            }
        }
    }
}

struct OverlayFrame {
    entries: Vec<OverlayEntry>,
    attached: bool,
    sync_count: u64,
}

impl OverlayFrame {
    /// Re-projects every entry; does nothing while the view is unavailable
    fn synchronize(&mut self, view: &dyn MapView) -> bool {
        if !self.attached {
            return false;
        }

        // availability is a property of the view, not of single positions
        for entry in self.entries.iter_mut() {
            let Some(pixel) = view.pixel_from_projected(&entry.projected) else {
                return false;
            };
            // entries without a finite position cannot be hit
            entry.screen_position = Some(pixel).filter(Point::is_finite);
        }
        self.sync_count += 1;
        true
    }
}

/// Registered with the map; keeps the shared frame in step with the view
struct OverlaySync {
    frame: Arc<Mutex<OverlayFrame>>,
}

impl ViewChangeListener for OverlaySync {
    fn on_view_change(&self, view: &dyn MapView) {
        lock(&self.frame).synchronize(view);
    }
}

pub struct InteractionOverlay {
    id: OverlayId,
    frame: Arc<Mutex<OverlayFrame>>,
    map: Arc<dyn MapView>,
    services: OverlayServices,
    config: InteractionConfig,
    listener: Option<ListenerId>,
}

impl InteractionOverlay {
    /// Builds one entry per symbol, registers tooltips and the post-render
    /// listener, then synchronizes once against the current view.
    pub fn attach(
        symbols: &[RenderedSymbol],
        data: &[Arc<DataPoint>],
        map: Arc<dyn MapView>,
        services: OverlayServices,
        config: InteractionConfig,
    ) -> Self {
        let id = OverlayId(NEXT_OVERLAY_ID.fetch_add(1, Ordering::Relaxed));

        let entries: Vec<OverlayEntry> = symbols
            .iter()
            .zip(data)
            .enumerate()
            .map(|(index, (symbol, point))| OverlayEntry {
                target: OverlayTarget { overlay: id, index },
                projected: symbol.projected,
                hit_radius: symbol.outer_radius().max(config.min_hit_radius),
                screen_position: None,
                data: Arc::downgrade(point),
            })
            .collect();

        for entry in &entries {
            let tooltip_data = entry.data.clone();
            let tooltip: TooltipProvider = Arc::new(move || {
                tooltip_data
                    .upgrade()
                    .map(|point| point.tooltip.clone())
                    .unwrap_or_default()
            });
            let identity_data = entry.data.clone();
            let identity: IdentityProvider = Arc::new(move || {
                identity_data
                    .upgrade()
                    .map(|point| Arc::clone(&point.identity))
            });
            services
                .tooltips
                .add_tooltip(entry.target, tooltip, identity, config.tooltips_enabled);
        }

        let frame = Arc::new(Mutex::new(OverlayFrame {
            entries,
            attached: true,
            sync_count: 0,
        }));
        let listener = map.on_view_change(Arc::new(OverlaySync {
            frame: Arc::clone(&frame),
        }));

        let overlay = Self {
            id,
            frame,
            map,
            services,
            config,
            listener: Some(listener),
        };
        let synced = overlay.synchronize();
        log::debug!(
            "overlay {:?} attached with {} entries (synced: {})",
            overlay.id,
            overlay.len(),
            synced
        );
        overlay
    }

    pub fn id(&self) -> OverlayId {
        self.id
    }

    pub fn len(&self) -> usize {
        lock(&self.frame).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_attached(&self) -> bool {
        lock(&self.frame).attached
    }

    /// Number of completed synchronization passes
    pub fn sync_count(&self) -> u64 {
        lock(&self.frame).sync_count
    }

    /// Snapshot of the entries
    pub fn entries(&self) -> Vec<OverlayEntry> {
        lock(&self.frame).entries.clone()
    }

    pub fn screen_position(&self, index: usize) -> Option<Point> {
        lock(&self.frame)
            .entries
            .get(index)
            .and_then(|entry| entry.screen_position)
    }

    /// Re-projects every entry against the map's current view
    pub fn synchronize(&self) -> bool {
        lock(&self.frame).synchronize(self.map.as_ref())
    }

    /// Topmost entry under `pixel`; later entries sit above earlier ones
    pub fn hit_test(&self, pixel: &Point) -> Option<OverlayEntry> {
        lock(&self.frame)
            .entries
            .iter()
            .rev()
            .find(|entry| entry.contains(pixel))
            .cloned()
    }

    /// Handles one pointer event.
    ///
    /// The frame lock is never held while calling into the map, since a map
    /// may notify listeners synchronously.
    pub fn handle_event(&self, event: &PointerEvent) -> OverlayResponse {
        if !self.is_attached() {
            return OverlayResponse::Ignored;
        }

        match event {
            PointerEvent::Click {
                position,
                button: MouseButton::Left,
                modifiers,
            } => {
                let Some(entry) = self.hit_test(position) else {
                    return OverlayResponse::Ignored;
                };
                match entry.data() {
                    Some(point) => OverlayResponse::Select {
                        target: entry.target,
                        identity: Arc::clone(&point.identity),
                        additive: self.config.is_additive(modifiers),
                    },
                    None => OverlayResponse::Ignored,
                }
            }
            PointerEvent::Click { .. } => OverlayResponse::Ignored,
            // the root covers the whole map, so the wheel always lands on it
            PointerEvent::Wheel { delta_y, .. } => self.wheel_zoom(*delta_y),
            PointerEvent::Move { position } => match self.hit_test(position) {
                Some(entry) => OverlayResponse::Hover(entry.target),
                None => OverlayResponse::Ignored,
            },
        }
    }

    fn wheel_zoom(&self, delta_y: f64) -> OverlayResponse {
        let zoom = self.map.zoom();
        let target = if delta_y < 0.0 {
            zoom + self.config.wheel_zoom_step
        } else if delta_y > 0.0 {
            zoom - self.config.wheel_zoom_step
        } else {
            zoom
        };

        if target != zoom {
            self.map
                .animate_zoom(target, self.config.wheel_zoom_duration_ms);
        }
        OverlayResponse::Zoomed { zoom: target }
    }

    /// Starts a selection request with the host's selection manager
    pub fn request_selection(
        &self,
        identity: SelectionId,
        additive: bool,
    ) -> BoxFuture<'static, Result<Vec<SelectionId>>> {
        let manager = Arc::clone(&self.services.selection);
        Box::pin(async move { manager.select(identity, additive).await })
    }

    /// Removes the listener, the entries and their tooltips. Safe to call
    /// repeatedly; a map that already dropped the listener is not an error.
    pub fn detach(&mut self) {
        if let Some(listener) = self.listener.take() {
            if let Err(e) = self.map.remove_view_change_listener(listener) {
                log::debug!("overlay {:?} listener already removed: {}", self.id, e);
            }
        }

        let was_attached = {
            let mut frame = lock(&self.frame);
            frame.entries.clear();
            std::mem::replace(&mut frame.attached, false)
        };
        if was_attached {
            self.services.tooltips.remove_tooltips(self.id);
            log::debug!("overlay {:?} detached", self.id);
        }
    }
}

impl Drop for InteractionOverlay {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{geo::LatLng, viewport::MapViewport},
        data::point::{SelectionKey, TooltipItem},
        input::events::KeyModifiers,
        traits::TooltipService,
    };
    use async_trait::async_trait;

    #[derive(Default)]
    struct Tooltips {
        registered: Mutex<Vec<(OverlayTarget, TooltipProvider, IdentityProvider, bool)>>,
        removed: Mutex<Vec<OverlayId>>,
    }

    impl TooltipService for Tooltips {
        fn add_tooltip(
            &self,
            target: OverlayTarget,
            tooltip: TooltipProvider,
            identity: IdentityProvider,
            enabled: bool,
        ) {
            lock(&self.registered).push((target, tooltip, identity, enabled));
        }

        fn remove_tooltips(&self, root: OverlayId) {
            lock(&self.removed).push(root);
        }
    }

    struct EchoSelection;

    #[async_trait]
    impl SelectionManager for EchoSelection {
        async fn select(&self, identity: SelectionId, _additive: bool) -> Result<Vec<SelectionId>> {
            Ok(vec![identity])
        }
    }

    struct Fixture {
        map: Arc<MapViewport>,
        tooltips: Arc<Tooltips>,
        data: Vec<Arc<DataPoint>>,
        overlay: InteractionOverlay,
    }

    fn fixture(positions: &[(f64, f64, f64)], size: Option<Point>) -> Fixture {
        let map = Arc::new(MapViewport::new(LatLng::new(0.0, 0.0), 4.0, size));
        let tooltips = Arc::new(Tooltips::default());
        let data: Vec<Arc<DataPoint>> = positions
            .iter()
            .enumerate()
            .map(|(i, (lat, lng, _))| {
                Arc::new(
                    DataPoint::new(LatLng::new(*lat, *lng), 1.0, SelectionKey::shared(format!("k{}", i)))
                        .with_tooltip(vec![TooltipItem::new("Row", i.to_string())]),
                )
            })
            .collect();
        let symbols: Vec<RenderedSymbol> = positions
            .iter()
            .map(|(lat, lng, radius)| RenderedSymbol {
                projected: map.project(&LatLng::new(*lat, *lng)),
                radius: *radius,
                secondary_radius: None,
                selected: true,
            })
            .collect();

        let overlay = InteractionOverlay::attach(
            &symbols,
            &data,
            map.clone(),
            OverlayServices {
                selection: Arc::new(EchoSelection),
                tooltips: tooltips.clone(),
            },
            InteractionConfig::default(),
        );
        Fixture {
            map,
            tooltips,
            data,
            overlay,
        }
    }

    #[test]
    fn test_initial_sync_and_hit_radius_floor() {
        let f = fixture(&[(0.0, 0.0, 3.0), (10.0, 10.0, 20.0)], Some(Point::new(800.0, 600.0)));
        let entries = f.overlay.entries();
        assert_eq!(entries[0].hit_radius, 8.0);
        assert_eq!(entries[1].hit_radius, 20.0);
        assert_eq!(entries[0].style().radius, 8.0);
        assert_eq!(entries[0].style().fill_opacity, 0.0);
        assert_eq!(f.overlay.sync_count(), 1);

        let center = f.overlay.screen_position(0).unwrap();
        assert!((center.x - 400.0).abs() < 1e-6 && (center.y - 300.0).abs() < 1e-6);
    }

    #[test]
    fn test_non_finite_position_is_never_hit() {
        let f = fixture(&[(f64::NAN, 0.0, 10.0), (0.0, 0.0, 10.0)], Some(Point::new(800.0, 600.0)));
        assert_eq!(f.overlay.sync_count(), 1);
        assert!(f.overlay.screen_position(0).is_none());
        let center = f.overlay.screen_position(1).unwrap();
        assert_eq!(f.overlay.hit_test(&center).map(|entry| entry.target.index), Some(1));
    }

    #[test]
    fn test_sync_waits_for_view() {
        let f = fixture(&[(0.0, 0.0, 5.0)], None);
        assert_eq!(f.overlay.sync_count(), 0);
        assert!(f.overlay.screen_position(0).is_none());

        f.map.set_size(Point::new(400.0, 400.0));
        assert_eq!(f.overlay.sync_count(), 1);
        assert!(f.overlay.screen_position(0).is_some());
    }

    #[test]
    fn test_follows_pan() {
        let f = fixture(&[(0.0, 0.0, 5.0)], Some(Point::new(800.0, 600.0)));
        f.map.pan(Point::new(25.0, -10.0));
        let moved = f.overlay.screen_position(0).unwrap();
        assert!((moved.x - 425.0).abs() < 1e-6);
        assert!((moved.y - 290.0).abs() < 1e-6);
    }

    #[test]
    fn test_click_selects_with_modifiers() {
        let f = fixture(&[(0.0, 0.0, 10.0)], Some(Point::new(800.0, 600.0)));
        let center = f.overlay.screen_position(0).unwrap();

        let response = f.overlay.handle_event(&PointerEvent::Click {
            position: Point::new(center.x + 4.0, center.y),
            button: MouseButton::Left,
            modifiers: KeyModifiers {
                ctrl: true,
                ..KeyModifiers::default()
            },
        });
        assert_eq!(response.handled(), EventHandled::Handled);
        match response {
            OverlayResponse::Select {
                identity, additive, ..
            } => {
                assert_eq!(identity.key(), "k0");
                assert!(additive);
            }
            other => panic!("unexpected response {:?}", other),
        }

        let miss = f.overlay.handle_event(&PointerEvent::click(Point::new(0.0, 0.0)));
        assert_eq!(miss.handled(), EventHandled::NotHandled);
    }

    #[test]
    fn test_topmost_entry_wins() {
        let f = fixture(&[(0.0, 0.0, 10.0), (0.0, 0.0, 10.0)], Some(Point::new(800.0, 600.0)));
        let hit = f.overlay.hit_test(&Point::new(400.0, 300.0)).unwrap();
        assert_eq!(hit.target.index, 1);
    }

    #[test]
    fn test_wheel_zooms_by_step() {
        let f = fixture(&[(0.0, 0.0, 10.0)], Some(Point::new(800.0, 600.0)));
        let response = f.overlay.handle_event(&PointerEvent::wheel(Point::new(5.0, 5.0), -120.0));
        assert!(matches!(response, OverlayResponse::Zoomed { zoom } if zoom == 4.5));
        assert!(f.map.is_animating());

        f.map.advance_animation(std::time::Duration::from_millis(250));
        assert_eq!(f.map.zoom(), 4.5);

        f.overlay.handle_event(&PointerEvent::wheel(Point::new(5.0, 5.0), 120.0));
        f.map.advance_animation(std::time::Duration::from_millis(250));
        assert_eq!(f.map.zoom(), 4.0);
    }

    #[test]
    fn test_tooltips_registered_with_live_providers() {
        let f = fixture(&[(0.0, 0.0, 10.0), (1.0, 1.0, 10.0)], Some(Point::new(800.0, 600.0)));
        let registered = lock(&f.tooltips.registered);
        assert_eq!(registered.len(), 2);

        let (target, tooltip, identity, enabled) = &registered[1];
        assert_eq!(target.index, 1);
        assert!(*enabled);
        assert_eq!(tooltip()[0].value, "1");
        assert_eq!(identity().unwrap().key(), "k1");
        assert_eq!(f.data.len(), 2);
    }

    #[test]
    fn test_detach_is_idempotent() {
        let mut f = fixture(&[(0.0, 0.0, 10.0)], Some(Point::new(800.0, 600.0)));
        assert_eq!(f.map.listener_count(), 1);

        f.overlay.detach();
        f.overlay.detach();
        assert_eq!(f.map.listener_count(), 0);
        assert!(f.overlay.is_empty());
        assert_eq!(lock(&f.tooltips.removed).len(), 1);

        f.map.set_zoom(6.0);
        assert_eq!(f.overlay.sync_count(), 1);
        let response = f.overlay.handle_event(&PointerEvent::wheel(Point::new(0.0, 0.0), 1.0));
        assert!(matches!(response, OverlayResponse::Ignored));
    }

    #[tokio::test]
    async fn test_request_selection_resolves() {
        let f = fixture(&[(0.0, 0.0, 10.0)], Some(Point::new(800.0, 600.0)));
        let selected = f
            .overlay
            .request_selection(SelectionKey::shared("k0"), false)
            .await
            .unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].key(), "k0");
    }
}
