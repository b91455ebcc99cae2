use std::f64::consts::PI;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    animation::easing::ZoomAnimation,
    core::{
        bounds::Bounds,
        constants::TILE_SIZE,
        geo::{LatLng, Point, EARTH_RADIUS},
        lock,
    },
    traits::{ListenerId, MapView, ViewChangeListener},
    MapError, Result,
};

/// Snapshot of what the map is looking at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    /// The center of the map view in geographical coordinates
    pub center: LatLng,
    /// The current zoom level
    pub zoom: f64,
    /// The size of the viewport in pixels, `None` until the map is laid out
    pub size: Option<Point>,
    /// The minimum allowed zoom level
    pub min_zoom: f64,
    /// The maximum allowed zoom level
    pub max_zoom: f64,
}

impl ViewState {
    /// Projected metres per screen pixel at the current zoom
    pub fn resolution(&self) -> f64 {
        2.0 * PI * EARTH_RADIUS / (TILE_SIZE * 2_f64.powf(self.zoom))
    }

    /// Projected (EPSG:3857) position of the view center
    pub fn center_projected(&self) -> Point {
        self.center.to_mercator()
    }

    /// Converts a projected position to container pixels
    pub fn pixel_from_projected(&self, projected: &Point) -> Option<Point> {
        let size = self.size?;
        let center = self.center_projected();
        let resolution = self.resolution();
        Some(Point::new(
            (projected.x - center.x) / resolution + size.x / 2.0,
            (center.y - projected.y) / resolution + size.y / 2.0,
        ))
    }

    /// Converts container pixels back to a projected position
    pub fn projected_from_pixel(&self, pixel: &Point) -> Option<Point> {
        let size = self.size?;
        let center = self.center_projected();
        let resolution = self.resolution();
        Some(Point::new(
            center.x + (pixel.x - size.x / 2.0) * resolution,
            center.y - (pixel.y - size.y / 2.0) * resolution,
        ))
    }

    fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }
}

/// Headless Web Mercator map view.
///
/// Holds center, zoom and size, fires post-render notifications to
/// registered listeners after every view change, and runs wheel-zoom
/// animations when advanced by the host's frame clock.
pub struct MapViewport {
    state: Mutex<ViewState>,
    animation: Mutex<Option<ZoomAnimation>>,
    listeners: Mutex<Vec<(ListenerId, Arc<dyn ViewChangeListener>)>>,
    next_listener_id: AtomicU64,
    last_tick: Mutex<Option<instant::Instant>>,
}

impl MapViewport {
    /// Creates a new viewport; pass `None` for `size` while the map is not laid out
    pub fn new(center: LatLng, zoom: f64, size: Option<Point>) -> Self {
        Self {
            state: Mutex::new(ViewState {
                center,
                zoom: zoom.clamp(0.0, 20.0),
                size,
                min_zoom: 0.0,
                max_zoom: 20.0,
            }),
            animation: Mutex::new(None),
            listeners: Mutex::new(Vec::new()),
            next_listener_id: AtomicU64::new(1),
            last_tick: Mutex::new(None),
        }
    }

    /// Copy of the current view state
    pub fn state(&self) -> ViewState {
        lock(&self.state).clone()
    }

    pub fn center(&self) -> LatLng {
        lock(&self.state).center
    }

    pub fn set_center(&self, center: LatLng) {
        {
            let mut state = lock(&self.state);
            state.center = LatLng::new(LatLng::clamp_lat(center.lat), center.lng);
        }
        self.render_frame();
    }

    /// Sets the zoom level, clamping to valid range
    pub fn set_zoom(&self, zoom: f64) {
        {
            let mut state = lock(&self.state);
            state.zoom = state.clamp_zoom(zoom);
        }
        self.render_frame();
    }

    /// Sets the viewport size
    pub fn set_size(&self, size: Point) {
        lock(&self.state).size = Some(size);
        self.render_frame();
    }

    /// Sets the zoom limits
    pub fn set_zoom_limits(&self, min_zoom: f64, max_zoom: f64) {
        {
            let mut state = lock(&self.state);
            state.min_zoom = min_zoom;
            state.max_zoom = max_zoom;
            state.zoom = state.clamp_zoom(state.zoom);
        }
        self.render_frame();
    }

    /// Pans the view by a pixel offset (content moves with the pointer)
    pub fn pan(&self, delta: Point) {
        {
            let mut state = lock(&self.state);
            let resolution = state.resolution();
            let center = state.center_projected();
            let moved = Point::new(
                center.x - delta.x * resolution,
                center.y + delta.y * resolution,
            );
            let next = LatLng::from_mercator(moved);
            state.center = LatLng::new(LatLng::clamp_lat(next.lat), next.lng);
        }
        self.render_frame();
    }

    /// Fires the post-render notification to every listener
    pub fn render_frame(&self) {
        let listeners: Vec<Arc<dyn ViewChangeListener>> = lock(&self.listeners)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener.on_view_change(self);
        }
    }

    pub fn is_animating(&self) -> bool {
        lock(&self.animation).is_some()
    }

    /// Advances the running zoom animation; returns whether one is still running
    pub fn advance_animation(&self, dt: Duration) -> bool {
        let step = {
            let mut animation = lock(&self.animation);
            match animation.as_mut() {
                Some(running) => {
                    let zoom = running.advance(dt);
                    let finished = running.is_finished();
                    if finished {
                        *animation = None;
                    }
                    Some((zoom, finished))
                }
                None => None,
            }
        };

        match step {
            Some((zoom, finished)) => {
                {
                    let mut state = lock(&self.state);
                    state.zoom = state.clamp_zoom(zoom);
                }
                self.render_frame();
                !finished
            }
            None => false,
        }
    }

    /// Advances the animation by wall-clock time since the previous tick
    pub fn tick(&self) -> bool {
        let now = instant::Instant::now();
        let dt = {
            let mut last = lock(&self.last_tick);
            let dt = last.map(|t| now.duration_since(t)).unwrap_or(Duration::ZERO);
            *last = Some(now);
            dt
        };
        self.advance_animation(dt)
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.listeners).len()
    }
}

impl MapView for MapViewport {
    fn project(&self, lat_lng: &LatLng) -> Point {
        lat_lng.to_mercator()
    }

    fn pixel_from_projected(&self, projected: &Point) -> Option<Point> {
        lock(&self.state).pixel_from_projected(projected)
    }

    fn zoom(&self) -> f64 {
        lock(&self.state).zoom
    }

    fn animate_zoom(&self, zoom: f64, duration_ms: u64) {
        let (from, target) = {
            let state = lock(&self.state);
            (state.zoom, state.clamp_zoom(zoom))
        };

        if duration_ms == 0 {
            *lock(&self.animation) = None;
            self.set_zoom(target);
            return;
        }

        log::debug!("animating zoom {:.2} -> {:.2} over {}ms", from, target, duration_ms);
        *lock(&self.animation) = Some(ZoomAnimation::new(
            from,
            target,
            Duration::from_millis(duration_ms),
        ));
    }

    fn on_view_change(&self, listener: Arc<dyn ViewChangeListener>) -> ListenerId {
        let id = ListenerId(self.next_listener_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.listeners).push((id, listener));
        id
    }

    fn remove_view_change_listener(&self, id: ListenerId) -> Result<()> {
        let mut listeners = lock(&self.listeners);
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        if listeners.len() == before {
            return Err(MapError::Layer(format!("no view-change listener {:?}", id)).into());
        }
        Ok(())
    }

    fn fit_extent(&self, extent: &Bounds, padding: f64) {
        {
            let mut state = lock(&self.state);
            state.center = LatLng::from_mercator(extent.center());

            if let Some(size) = state.size {
                let usable = Point::new(
                    (size.x - 2.0 * padding).max(1.0),
                    (size.y - 2.0 * padding).max(1.0),
                );
                let resolution = (extent.width() / usable.x).max(extent.height() / usable.y);
                // a single point has no span to fit; keep the zoom
                if resolution > 0.0 {
                    let zoom = (2.0 * PI * EARTH_RADIUS / (TILE_SIZE * resolution)).log2();
                    state.zoom = state.clamp_zoom(zoom);
                }
            }
        }
        self.render_frame();
    }
}

impl Default for MapViewport {
    fn default() -> Self {
        Self::new(LatLng::new(0.0, 0.0), 2.0, Some(Point::new(800.0, 600.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct CountingListener(AtomicUsize);

    impl ViewChangeListener for CountingListener {
        fn on_view_change(&self, _view: &dyn MapView) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_center_projects_to_middle_of_screen() {
        let viewport = MapViewport::new(
            LatLng::new(40.7128, -74.0060),
            10.0,
            Some(Point::new(800.0, 600.0)),
        );
        let projected = viewport.project(&LatLng::new(40.7128, -74.0060));
        let pixel = viewport.pixel_from_projected(&projected).unwrap();
        assert!((pixel.x - 400.0).abs() < 1e-6);
        assert!((pixel.y - 300.0).abs() < 1e-6);
    }

    #[test]
    fn test_north_is_up() {
        let viewport = MapViewport::default();
        let north = viewport.project(&LatLng::new(10.0, 0.0));
        let east = viewport.project(&LatLng::new(0.0, 10.0));
        let north_px = viewport.pixel_from_projected(&north).unwrap();
        let east_px = viewport.pixel_from_projected(&east).unwrap();
        assert!(north_px.y < 300.0);
        assert!(east_px.x > 400.0);
    }

    #[test]
    fn test_pixel_round_trip() {
        let state = MapViewport::default().state();
        let pixel = Point::new(123.0, 456.0);
        let projected = state.projected_from_pixel(&pixel).unwrap();
        let back = state.pixel_from_projected(&projected).unwrap();
        assert!((back.x - pixel.x).abs() < 1e-6);
        assert!((back.y - pixel.y).abs() < 1e-6);
    }

    #[test]
    fn test_unsized_view_is_unavailable() {
        let viewport = MapViewport::new(LatLng::default(), 3.0, None);
        assert!(viewport.pixel_from_projected(&Point::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn test_listeners_fire_on_view_change() {
        let viewport = MapViewport::default();
        let listener = Arc::new(CountingListener(AtomicUsize::new(0)));
        let id = viewport.on_view_change(listener.clone());

        viewport.pan(Point::new(10.0, 0.0));
        viewport.set_zoom(5.0);
        assert_eq!(listener.0.load(Ordering::SeqCst), 2);

        viewport.remove_view_change_listener(id).unwrap();
        viewport.set_zoom(6.0);
        assert_eq!(listener.0.load(Ordering::SeqCst), 2);
        assert!(viewport.remove_view_change_listener(id).is_err());
    }

    #[test]
    fn test_animate_zoom() {
        let viewport = MapViewport::default();
        viewport.animate_zoom(3.0, 100);
        assert!(viewport.is_animating());
        assert_eq!(viewport.zoom(), 2.0);

        assert!(viewport.advance_animation(Duration::from_millis(50)));
        let mid = viewport.zoom();
        assert!(mid > 2.0 && mid < 3.0);

        assert!(!viewport.advance_animation(Duration::from_millis(50)));
        assert_eq!(viewport.zoom(), 3.0);
        assert!(!viewport.is_animating());
    }

    #[test]
    fn test_zoom_limits() {
        let viewport = MapViewport::default();
        viewport.set_zoom_limits(2.0, 15.0);
        viewport.set_zoom(1.0);
        assert_eq!(viewport.zoom(), 2.0);
        viewport.animate_zoom(30.0, 0);
        assert_eq!(viewport.zoom(), 15.0);
    }

    #[test]
    fn test_fit_extent_contains_corners() {
        let viewport = MapViewport::default();
        let a = viewport.project(&LatLng::new(40.0, -75.0));
        let b = viewport.project(&LatLng::new(42.0, -71.0));
        let extent = Bounds::from_corners(a, b);
        viewport.fit_extent(&extent, 20.0);

        for corner in [extent.min, extent.max] {
            let px = viewport.pixel_from_projected(&corner).unwrap();
            assert!(px.x >= 19.0 && px.x <= 781.0, "x = {}", px.x);
            assert!(px.y >= 19.0 && px.y <= 581.0, "y = {}", px.y);
        }
    }
}
