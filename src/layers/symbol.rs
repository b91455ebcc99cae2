use std::sync::Arc;

use crate::{
    core::{
        bounds::Bounds,
        config::{InteractionConfig, RadiusBounds, SymbolStyle},
        geo::{LatLngBounds, Point},
    },
    data::point::DataPoint,
    input::events::PointerEvent,
    layers::overlay::{InteractionOverlay, OverlayResponse, OverlayServices},
    rendering::{context::RenderContext, style::CircleRenderStyle},
    scaling::{
        applier::{apply_scaling, OutlierContext},
        calculator::ScaleParameters,
    },
    traits::MapView,
};

/// Batch-rendered primitive of one data point
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSymbol {
    /// Position in the map's working projection
    pub projected: Point,
    /// Precomputed primary radius in pixels
    pub radius: f64,
    /// Precomputed radius of the second magnitude, if the point has one
    pub secondary_radius: Option<f64>,
    pub selected: bool,
}

impl RenderedSymbol {
    /// Largest radius drawn for this symbol
    pub fn outer_radius(&self) -> f64 {
        self.secondary_radius
            .map_or(self.radius, |secondary| secondary.max(self.radius))
    }
}

/// Everything a symbol layer is built from
pub struct SymbolLayerOptions {
    pub id: String,
    /// Data points paired with their already projected positions
    pub points: Vec<(Arc<DataPoint>, Point)>,
    pub scale: ScaleParameters,
    pub bounds: RadiusBounds,
    pub style: SymbolStyle,
}

/// Proportional circles drawn through the batch render path.
///
/// Radii are computed once here and stored; drawing and style evaluation only
/// read stored attributes. The only attribute that changes afterwards is
/// each symbol's `selected` flag.
pub struct SymbolLayer {
    id: String,
    data: Vec<Arc<DataPoint>>,
    symbols: Vec<RenderedSymbol>,
    scale: ScaleParameters,
    bounds: RadiusBounds,
    style: SymbolStyle,
    visible: bool,
    style_revision: u64,
    overlay: Option<InteractionOverlay>,
    map: Option<Arc<dyn MapView>>,
}

impl SymbolLayer {
    pub fn new(options: SymbolLayerOptions) -> Self {
        let SymbolLayerOptions {
            id,
            points,
            scale,
            bounds,
            style,
        } = options;

        let all_values: Vec<f64> = points
            .iter()
            .flat_map(|(point, _)| point.magnitudes())
            .collect();
        let outliers = OutlierContext::from_values(&all_values);

        let (data, symbols): (Vec<_>, Vec<_>) = points
            .into_iter()
            .map(|(point, projected)| {
                let symbol = RenderedSymbol {
                    projected,
                    radius: apply_scaling(point.value, &scale, &bounds, outliers.as_ref()),
                    secondary_radius: point
                        .secondary_value
                        .map(|v| apply_scaling(v, &scale, &bounds, outliers.as_ref())),
                    selected: true,
                };
                (point, symbol)
            })
            .unzip();

        log::debug!(
            "symbol layer '{}' built with {} symbols ({} scale)",
            id,
            symbols.len(),
            scale.method
        );

        Self {
            id,
            data,
            symbols,
            scale,
            bounds,
            style,
            visible: true,
            style_revision: 0,
            overlay: None,
            map: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbols(&self) -> &[RenderedSymbol] {
        &self.symbols
    }

    pub fn data(&self) -> &[Arc<DataPoint>] {
        &self.data
    }

    pub fn scale(&self) -> &ScaleParameters {
        &self.scale
    }

    pub fn radius_bounds(&self) -> &RadiusBounds {
        &self.bounds
    }

    pub fn style(&self) -> &SymbolStyle {
        &self.style
    }

    pub fn z_index(&self) -> i32 {
        self.style.z_index
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Bumped whenever stored attributes that styles read change
    pub fn style_revision(&self) -> u64 {
        self.style_revision
    }

    /// Every magnitude of every point, primary and secondary
    pub fn all_values(&self) -> Vec<f64> {
        self.data.iter().flat_map(|point| point.magnitudes()).collect()
    }

    /// Rewrites every symbol's selected flag and re-evaluates styles
    pub fn update_selection<F>(&mut self, is_selected: F)
    where
        F: Fn(&str) -> bool,
    {
        for (symbol, point) in self.symbols.iter_mut().zip(&self.data) {
            symbol.selected = is_selected(point.key());
        }
        self.style_revision += 1;
    }

    /// Opacity multiplier for a symbol: dimmed when left out of a selection
    pub fn opacity_factor(&self, symbol: &RenderedSymbol) -> f32 {
        if symbol.selected {
            1.0
        } else {
            self.style.dimmed_opacity_factor
        }
    }

    /// Fill opacity the renderer uses for a symbol
    pub fn effective_opacity(&self, symbol: &RenderedSymbol) -> f32 {
        self.style.fill_opacity * self.opacity_factor(symbol)
    }

    /// Evaluates the circle styles of one symbol, primary first
    pub fn circle_styles(
        &self,
        symbol: &RenderedSymbol,
    ) -> (CircleRenderStyle, Option<CircleRenderStyle>) {
        let factor = self.opacity_factor(symbol);
        let circle = |fill_color, radius| CircleRenderStyle {
            fill_color,
            stroke_color: self.style.stroke_color,
            stroke_width: self.style.stroke_width,
            radius,
            fill_opacity: self.style.fill_opacity * factor,
            stroke_opacity: self.style.stroke_opacity * factor,
        };

        (
            circle(self.style.fill_color, symbol.radius),
            symbol
                .secondary_radius
                .map(|radius| circle(self.style.secondary_fill_color, radius)),
        )
    }

    /// Queues every symbol; returns the number of circles queued.
    /// Draws nothing while the view cannot map projected positions to pixels.
    /// Symbols without a finite position are skipped.
    pub fn render(&self, context: &mut RenderContext, view: &dyn MapView) -> usize {
        if !self.visible {
            return 0;
        }

        let mut queued = 0;
        for symbol in &self.symbols {
            let Some(center) = view.pixel_from_projected(&symbol.projected) else {
                return queued;
            };
            if !center.is_finite() {
                continue;
            }

            let (primary, secondary) = self.circle_styles(symbol);
            // larger circle underneath so both stay visible
            let circles = match secondary {
                Some(secondary) if secondary.radius > primary.radius => vec![secondary, primary],
                Some(secondary) => vec![primary, secondary],
                None => vec![primary],
            };
            for style in &circles {
                if context.render_circle(center, style, self.style.z_index) {
                    queued += 1;
                }
            }
        }
        queued
    }

    /// Projected extent of all finite positions, `None` if there is none
    pub fn features_extent(&self, view: &dyn MapView) -> Option<Bounds> {
        let geographic = LatLngBounds::from_points(self.data.iter().map(|point| &point.position))?;
        Some(Bounds::from_corners(
            view.project(&geographic.south_west),
            view.project(&geographic.north_east),
        ))
    }

    /// Attaches to a map and builds the interaction overlay.
    /// A previously attached overlay is released first.
    pub fn attach(
        &mut self,
        map: Arc<dyn MapView>,
        services: OverlayServices,
        config: InteractionConfig,
    ) {
        self.release_overlay();
        let overlay =
            InteractionOverlay::attach(&self.symbols, &self.data, Arc::clone(&map), services, config);
        self.overlay = Some(overlay);
        self.map = Some(map);
    }

    pub fn is_attached(&self) -> bool {
        self.map.is_some()
    }

    pub fn overlay(&self) -> Option<&InteractionOverlay> {
        self.overlay.as_ref()
    }

    /// Routes a pointer event through the overlay
    pub fn handle_pointer(&self, event: &PointerEvent) -> OverlayResponse {
        match &self.overlay {
            Some(overlay) if self.visible => overlay.handle_event(event),
            _ => OverlayResponse::Ignored,
        }
    }

    fn release_overlay(&mut self) {
        if let Some(mut overlay) = self.overlay.take() {
            overlay.detach();
        }
    }

    /// Releases the overlay and detaches from the map. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        if self.overlay.is_none() && self.map.is_none() {
            return;
        }
        self.release_overlay();
        self.map = None;
        log::debug!("symbol layer '{}' disposed", self.id);
    }
}

impl Drop for SymbolLayer {
    fn drop(&mut self) {
        self.dispose();
    }
}
