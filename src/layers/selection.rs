//! Selection state shared between the host's selection model and the layer
//!
//! Selection requests resolve asynchronously. Each request carries a ticket;
//! issuing a new ticket (or replacing the layer) invalidates every older
//! one, so a slow response can never overwrite a newer selection.

use std::fmt;

use futures::future::BoxFuture;
use fxhash::FxHashSet;

use crate::{layers::symbol::SymbolLayer, traits::SelectionId, Result};

/// Orders selection requests; only the latest one may apply its result
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SelectionTicket(pub u64);

/// A selection request still waiting on the host's selection model
pub struct PendingSelection {
    ticket: SelectionTicket,
    response: BoxFuture<'static, Result<Vec<SelectionId>>>,
}

impl PendingSelection {
    pub fn new(
        ticket: SelectionTicket,
        response: BoxFuture<'static, Result<Vec<SelectionId>>>,
    ) -> Self {
        Self { ticket, response }
    }

    pub fn ticket(&self) -> SelectionTicket {
        self.ticket
    }

    /// Waits for the selection model's answer
    pub async fn resolve(self) -> Result<ResolvedSelection> {
        let ids = self.response.await?;
        Ok(ResolvedSelection {
            ticket: self.ticket,
            ids,
        })
    }
}

impl fmt::Debug for PendingSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingSelection")
            .field("ticket", &self.ticket)
            .finish_non_exhaustive()
    }
}

/// Answer of the selection model for one ticket
#[derive(Debug, Clone)]
pub struct ResolvedSelection {
    pub ticket: SelectionTicket,
    pub ids: Vec<SelectionId>,
}

/// Keeps the selected key set and writes it onto symbol layers
#[derive(Debug, Default)]
pub struct SelectionSynchronizer {
    selected: FxHashSet<String>,
    next_ticket: u64,
    latest: Option<SelectionTicket>,
}

impl SelectionSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `ids` and rewrites every symbol's selected flag.
    /// An empty set means nothing is selected and every symbol is shown at
    /// full opacity.
    pub fn set_selected_ids(&mut self, ids: &[SelectionId], layer: &mut SymbolLayer) {
        self.selected = ids.iter().map(|id| id.key().to_string()).collect();
        self.apply_to(layer);
    }

    /// Writes the stored selection onto a (possibly new) layer
    pub fn apply_to(&self, layer: &mut SymbolLayer) {
        layer.update_selection(|key| self.is_selected(key));
        log::debug!(
            "applied selection of {} keys to layer '{}'",
            self.selected.len(),
            layer.id()
        );
    }

    /// Stores `ids` without a layer to write to
    pub fn remember(&mut self, ids: &[SelectionId]) {
        self.selected = ids.iter().map(|id| id.key().to_string()).collect();
    }

    pub fn is_selected(&self, key: &str) -> bool {
        self.selected.is_empty() || self.selected.contains(key)
    }

    pub fn has_selection(&self) -> bool {
        !self.selected.is_empty()
    }

    pub fn selected_keys(&self) -> &FxHashSet<String> {
        &self.selected
    }

    /// Issues a ticket that supersedes every earlier one
    pub fn issue_ticket(&mut self) -> SelectionTicket {
        self.next_ticket += 1;
        let ticket = SelectionTicket(self.next_ticket);
        self.latest = Some(ticket);
        ticket
    }

    /// Whether a response for `ticket` may still be applied
    pub fn accepts(&self, ticket: SelectionTicket) -> bool {
        self.latest == Some(ticket)
    }

    /// Drops every outstanding ticket
    pub fn invalidate_pending(&mut self) {
        self.latest = None;
    }

    /// Retires `ticket` once its response was applied
    pub fn complete(&mut self, ticket: SelectionTicket) {
        if self.accepts(ticket) {
            self.latest = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::{
        core::{
            config::{RadiusBounds, SymbolStyle},
            geo::{LatLng, Point},
        },
        data::point::{DataPoint, SelectionKey},
        layers::symbol::SymbolLayerOptions,
        scaling::calculator::calculate_scale,
    };

    fn layer(keys: &[&str]) -> SymbolLayer {
        let points = keys
            .iter()
            .enumerate()
            .map(|(i, key)| {
                (
                    Arc::new(DataPoint::new(LatLng::new(0.0, 0.0), i as f64, SelectionKey::shared(*key))),
                    Point::new(0.0, 0.0),
                )
            })
            .collect();
        let bounds = RadiusBounds::default();
        SymbolLayer::new(SymbolLayerOptions {
            id: "test".to_string(),
            points,
            scale: calculate_scale(&[0.0, 1.0, 2.0], &bounds),
            bounds,
            style: SymbolStyle::default(),
        })
    }

    fn flags(layer: &SymbolLayer) -> Vec<bool> {
        layer.symbols().iter().map(|s| s.selected).collect()
    }

    #[test]
    fn test_set_selected_ids() {
        let mut layer = layer(&["a", "b", "c"]);
        let mut sync = SelectionSynchronizer::new();

        sync.set_selected_ids(&[SelectionKey::shared("b")], &mut layer);
        assert_eq!(flags(&layer), vec![false, true, false]);
        assert!(sync.has_selection());

        sync.set_selected_ids(&[], &mut layer);
        assert_eq!(flags(&layer), vec![true, true, true]);
        assert!(!sync.has_selection());
    }

    #[test]
    fn test_set_selected_ids_is_idempotent() {
        let mut layer = layer(&["a", "b"]);
        let mut sync = SelectionSynchronizer::new();
        let ids = vec![SelectionKey::shared("a")];

        sync.set_selected_ids(&ids, &mut layer);
        let first = flags(&layer);
        sync.set_selected_ids(&ids, &mut layer);
        assert_eq!(flags(&layer), first);
    }

    #[test]
    fn test_unknown_ids_dim_everything() {
        let mut layer = layer(&["a", "b"]);
        let mut sync = SelectionSynchronizer::new();
        sync.set_selected_ids(&[SelectionKey::shared("zzz")], &mut layer);
        assert_eq!(flags(&layer), vec![false, false]);
    }

    #[test]
    fn test_remembered_selection_applies_to_new_layer() {
        let mut sync = SelectionSynchronizer::new();
        sync.remember(&[SelectionKey::shared("c")]);

        let mut next = layer(&["c", "d"]);
        sync.apply_to(&mut next);
        assert_eq!(flags(&next), vec![true, false]);
    }

    #[test]
    fn test_tickets() {
        let mut sync = SelectionSynchronizer::new();
        let first = sync.issue_ticket();
        let second = sync.issue_ticket();
        assert!(second > first);
        assert!(!sync.accepts(first));
        assert!(sync.accepts(second));

        sync.complete(second);
        assert!(!sync.accepts(second));

        let third = sync.issue_ticket();
        sync.invalidate_pending();
        assert!(!sync.accepts(third));
    }

    async fn respond() -> Result<Vec<SelectionId>> {
        Ok(vec![SelectionKey::shared("x")])
    }

    #[tokio::test]
    async fn test_pending_selection_resolves() {
        let pending = PendingSelection::new(SelectionTicket(7), Box::pin(respond()));
        assert_eq!(pending.ticket(), SelectionTicket(7));

        let resolved = pending.resolve().await.unwrap();
        assert_eq!(resolved.ticket, SelectionTicket(7));
        assert_eq!(resolved.ids[0].key(), "x");
    }
}
