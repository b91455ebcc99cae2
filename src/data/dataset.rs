//! Columnar input shaping
//!
//! Hosts usually hand over one array per data role. The builder checks that
//! the required roles are present and that every column has the same length
//! before any symbol is built; scaling and rendering assume validated input.

use std::sync::Arc;

use crate::{
    core::geo::LatLng,
    data::point::{DataPoint, SelectionKey, TooltipItem},
    traits::SelectionId,
    MapError, Result,
};

/// Role names, as shown to users in warnings
pub const LONGITUDE_ROLE: &str = "Longitude";
pub const LATITUDE_ROLE: &str = "Latitude";
pub const SIZE_ROLE: &str = "Size";

#[derive(Default)]
pub struct SymbolDatasetBuilder {
    longitudes: Option<Vec<f64>>,
    latitudes: Option<Vec<f64>>,
    sizes: Option<Vec<f64>>,
    secondary_sizes: Option<Vec<f64>>,
    tooltips: Option<Vec<Vec<TooltipItem>>>,
    identities: Option<Vec<SelectionId>>,
}

impl SymbolDatasetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn longitudes(mut self, values: Vec<f64>) -> Self {
        self.longitudes = Some(values);
        self
    }

    pub fn latitudes(mut self, values: Vec<f64>) -> Self {
        self.latitudes = Some(values);
        self
    }

    pub fn sizes(mut self, values: Vec<f64>) -> Self {
        self.sizes = Some(values);
        self
    }

    pub fn secondary_sizes(mut self, values: Vec<f64>) -> Self {
        self.secondary_sizes = Some(values);
        self
    }

    pub fn tooltips(mut self, rows: Vec<Vec<TooltipItem>>) -> Self {
        self.tooltips = Some(rows);
        self
    }

    pub fn identities(mut self, ids: Vec<SelectionId>) -> Self {
        self.identities = Some(ids);
        self
    }

    /// Validates the columns and builds one data point per row.
    /// Rows without an explicit identity are keyed by their index.
    pub fn build(self) -> Result<Vec<Arc<DataPoint>>> {
        let longitudes = self
            .longitudes
            .ok_or_else(|| MapError::MissingRole(LONGITUDE_ROLE.to_string()))?;
        let latitudes = self
            .latitudes
            .ok_or_else(|| MapError::MissingRole(LATITUDE_ROLE.to_string()))?;
        let sizes = self
            .sizes
            .ok_or_else(|| MapError::MissingRole(SIZE_ROLE.to_string()))?;

        let rows = longitudes.len();
        let check = |role: &str, len: usize| -> Result<()> {
            if len == rows {
                Ok(())
            } else {
                Err(MapError::Input(format!(
                    "{} has {} values but {} has {}",
                    role, len, LONGITUDE_ROLE, rows
                ))
                .into())
            }
        };

        check(LATITUDE_ROLE, latitudes.len())?;
        check(SIZE_ROLE, sizes.len())?;
        if let Some(secondary) = &self.secondary_sizes {
            check("Secondary size", secondary.len())?;
        }
        if let Some(tooltips) = &self.tooltips {
            check("Tooltips", tooltips.len())?;
        }
        if let Some(identities) = &self.identities {
            check("Identities", identities.len())?;
        }

        let mut tooltips = self.tooltips.map(Vec::into_iter);
        let mut identities = self.identities.map(Vec::into_iter);

        let points = (0..rows)
            .map(|i| {
                let identity = identities
                    .as_mut()
                    .and_then(Iterator::next)
                    .unwrap_or_else(|| SelectionKey::shared(i.to_string()));
                let mut point = DataPoint::new(
                    LatLng::from_lon_lat(longitudes[i], latitudes[i]),
                    sizes[i],
                    identity,
                );
                point.secondary_value = self.secondary_sizes.as_ref().map(|s| s[i]);
                point.tooltip = tooltips.as_mut().and_then(Iterator::next).unwrap_or_default();
                Arc::new(point)
            })
            .collect();

        Ok(points)
    }
}
