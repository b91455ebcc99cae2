use serde::{Deserialize, Serialize};

use crate::{
    core::geo::LatLng,
    traits::{SelectionId, SelectionIdentity},
};

/// One row of a tooltip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TooltipItem {
    pub display_name: String,
    pub value: String,
}

impl TooltipItem {
    pub fn new(display_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            value: value.into(),
        }
    }
}

/// Selection identity backed by a plain string key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionKey(pub String);

impl SelectionKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Shared identity handle
    pub fn shared(key: impl Into<String>) -> SelectionId {
        std::sync::Arc::new(Self::new(key))
    }
}

impl SelectionIdentity for SelectionKey {
    fn key(&self) -> &str {
        &self.0
    }
}

/// Source record of one symbol, immutable for a data-update cycle
#[derive(Debug, Clone)]
pub struct DataPoint {
    pub position: LatLng,
    /// Magnitude of the primary circle
    pub value: f64,
    /// Magnitude of the optional second circle
    pub secondary_value: Option<f64>,
    pub tooltip: Vec<TooltipItem>,
    pub identity: SelectionId,
}

impl DataPoint {
    pub fn new(position: LatLng, value: f64, identity: SelectionId) -> Self {
        Self {
            position,
            value,
            secondary_value: None,
            tooltip: Vec::new(),
            identity,
        }
    }

    pub fn with_secondary(mut self, value: f64) -> Self {
        self.secondary_value = Some(value);
        self
    }

    pub fn with_tooltip(mut self, tooltip: Vec<TooltipItem>) -> Self {
        self.tooltip = tooltip;
        self
    }

    pub fn key(&self) -> &str {
        self.identity.key()
    }

    /// Every magnitude this point contributes to the scale
    pub fn magnitudes(&self) -> impl Iterator<Item = f64> + '_ {
        std::iter::once(self.value).chain(self.secondary_value)
    }
}
