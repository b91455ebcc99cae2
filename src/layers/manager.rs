use std::sync::Arc;

use crate::{
    core::{bounds::Bounds, config::SymbolMapConfig, constants::FIT_PADDING, geo::Point},
    data::{dataset::SymbolDatasetBuilder, point::DataPoint},
    input::events::{EventHandled, PointerEvent},
    layers::{
        overlay::{OverlayResponse, OverlayServices, OverlayTarget},
        selection::{PendingSelection, ResolvedSelection, SelectionSynchronizer},
        symbol::{SymbolLayer, SymbolLayerOptions},
    },
    legend::resolver::{resolve_legend_values, LegendValues},
    rendering::context::RenderContext,
    scaling::calculator::calculate_scale_with_policy,
    traits::{MapView, SelectionId, WarningSink},
    MapError, Result,
};

const LAYER_ID: &str = "proportional-symbols";

/// What happened to a pointer event routed through the host
#[derive(Debug)]
pub enum PointerOutcome {
    Ignored,
    Hover(OverlayTarget),
    Zoomed { zoom: f64 },
    /// A selection request is in flight; resolve it and hand the result to
    /// [`SymbolLayerHost::apply_selection`]
    Selection(PendingSelection),
}

impl PointerOutcome {
    pub fn handled(&self) -> EventHandled {
        match self {
            PointerOutcome::Ignored | PointerOutcome::Hover(_) => EventHandled::NotHandled,
            PointerOutcome::Zoomed { .. } | PointerOutcome::Selection(_) => EventHandled::Handled,
        }
    }
}

/// Owns the active symbol layer and its overlay for one map.
///
/// Each data update replaces both wholesale. The selected key set and the
/// selection ticket counter outlive replacements.
pub struct SymbolLayerHost {
    map: Arc<dyn MapView>,
    services: OverlayServices,
    warnings: Arc<dyn WarningSink>,
    config: SymbolMapConfig,
    active: Option<SymbolLayer>,
    selection: SelectionSynchronizer,
}

impl SymbolLayerHost {
    pub fn new(
        map: Arc<dyn MapView>,
        services: OverlayServices,
        warnings: Arc<dyn WarningSink>,
        config: SymbolMapConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            map,
            services,
            warnings,
            config,
            active: None,
            selection: SelectionSynchronizer::new(),
        })
    }

    pub fn config(&self) -> &SymbolMapConfig {
        &self.config
    }

    /// Takes effect with the next data update
    pub fn set_config(&mut self, config: SymbolMapConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn map(&self) -> &Arc<dyn MapView> {
        &self.map
    }

    pub fn active(&self) -> Option<&SymbolLayer> {
        self.active.as_ref()
    }

    pub fn selection(&self) -> &SelectionSynchronizer {
        &self.selection
    }

    /// Replaces the active layer with one built from `points`.
    ///
    /// The old layer's overlay is released before the old layer itself, the
    /// new scale covers primary and secondary magnitudes together, and the
    /// last selection is re-applied to the new symbols by key.
    pub fn replace(&mut self, points: Vec<Arc<DataPoint>>) {
        self.clear();

        let values: Vec<f64> = points.iter().flat_map(|point| point.magnitudes()).collect();
        let scale = calculate_scale_with_policy(&values, &self.config.radius, &self.config.scaling);

        let points = points
            .into_iter()
            .map(|point| {
                let projected = self.map.project(&point.position);
                (point, projected)
            })
            .collect();

        let mut layer = SymbolLayer::new(SymbolLayerOptions {
            id: LAYER_ID.to_string(),
            points,
            scale,
            bounds: self.config.radius,
            style: self.config.style.clone(),
        });
        layer.attach(
            Arc::clone(&self.map),
            self.services.clone(),
            self.config.interaction.clone(),
        );
        if self.selection.has_selection() {
            self.selection.apply_to(&mut layer);
        }

        if !self.config.lock_extent {
            if let Some(extent) = layer.features_extent(self.map.as_ref()) {
                self.map.fit_extent(&extent, FIT_PADDING);
            }
        }

        log::info!(
            "replaced symbol layer: {} symbols, {} scale",
            layer.len(),
            layer.scale().method
        );
        self.active = Some(layer);
    }

    /// Builds points from columns and replaces the layer.
    /// Missing roles and ragged columns are reported to the user and leave
    /// the current layer untouched.
    pub fn update_from_columns(&mut self, columns: SymbolDatasetBuilder) -> Result<()> {
        match columns.build() {
            Ok(points) => {
                self.replace(points);
                Ok(())
            }
            Err(e) => {
                let title = match e.downcast_ref::<MapError>() {
                    Some(MapError::MissingRole(_)) => "Missing data role",
                    _ => "Invalid data",
                };
                self.warnings.display_warning(title, &e.to_string());
                Err(e)
            }
        }
    }

    /// Disposes the active layer; pending selection responses are dropped
    pub fn clear(&mut self) {
        self.selection.invalidate_pending();
        if let Some(mut layer) = self.active.take() {
            layer.dispose();
        }
    }

    /// Routes a pointer event through the active overlay
    pub fn handle_pointer(&mut self, event: &PointerEvent) -> PointerOutcome {
        let Some(layer) = self.active.as_ref() else {
            return PointerOutcome::Ignored;
        };

        match layer.handle_pointer(event) {
            OverlayResponse::Ignored => PointerOutcome::Ignored,
            OverlayResponse::Hover(target) => PointerOutcome::Hover(target),
            OverlayResponse::Zoomed { zoom } => PointerOutcome::Zoomed { zoom },
            OverlayResponse::Select {
                identity, additive, ..
            } => {
                let Some(overlay) = layer.overlay() else {
                    return PointerOutcome::Ignored;
                };
                let response = overlay.request_selection(identity, additive);
                let ticket = self.selection.issue_ticket();
                log::debug!("selection request {:?} (additive: {})", ticket, additive);
                PointerOutcome::Selection(PendingSelection::new(ticket, response))
            }
        }
    }

    /// Applies a selection response unless a newer request or a layer
    /// replacement superseded it. Returns whether it was applied.
    pub fn apply_selection(&mut self, resolved: ResolvedSelection) -> bool {
        if !self.selection.accepts(resolved.ticket) {
            log::debug!("dropping stale selection response {:?}", resolved.ticket);
            return false;
        }
        self.selection.complete(resolved.ticket);
        self.set_selected_ids(&resolved.ids);
        true
    }

    /// Selection pushed by the host (for example, another visual cleared it)
    pub fn set_selected_ids(&mut self, ids: &[SelectionId]) {
        match self.active.as_mut() {
            Some(layer) => self.selection.set_selected_ids(ids, layer),
            None => self.selection.remember(ids),
        }
    }

    /// Handles one event end to end, awaiting the selection model if needed
    pub async fn dispatch(&mut self, event: &PointerEvent) -> Result<EventHandled> {
        match self.handle_pointer(event) {
            PointerOutcome::Selection(pending) => {
                let resolved = pending.resolve().await.map_err(|e| {
                    log::warn!("selection request failed: {}", e);
                    e
                })?;
                self.apply_selection(resolved);
                Ok(EventHandled::Handled)
            }
            outcome => Ok(outcome.handled()),
        }
    }

    /// Queues the active layer's circles; returns how many were queued
    pub fn render(&self, context: &mut RenderContext) -> usize {
        self.active
            .as_ref()
            .map_or(0, |layer| layer.render(context, self.map.as_ref()))
    }

    /// Current pixel of the symbol at `index`
    pub fn screen_position(&self, index: usize) -> Result<Point> {
        let layer = self
            .active
            .as_ref()
            .ok_or_else(|| MapError::Layer("no active layer".to_string()))?;
        let symbol = layer
            .symbols()
            .get(index)
            .ok_or_else(|| MapError::Input(format!("no symbol at index {}", index)))?;
        let pixel = self
            .map
            .pixel_from_projected(&symbol.projected)
            .filter(Point::is_finite)
            .ok_or_else(|| {
                MapError::ViewUnavailable(format!("symbol {} has no screen position", index))
            })?;
        Ok(pixel)
    }

    pub fn features_extent(&self) -> Option<Bounds> {
        self.active
            .as_ref()
            .and_then(|layer| layer.features_extent(self.map.as_ref()))
    }

    /// Legend values for the active layer's scale
    pub fn legend(&self) -> Option<LegendValues> {
        let layer = self.active.as_ref()?;
        resolve_legend_values(&layer.all_values(), layer.scale(), layer.radius_bounds())
    }
}

impl Drop for SymbolLayerHost {
    fn drop(&mut self) {
        self.clear();
    }
}
