//! Neighbourhood service: the tile under a point plus its existing neighbours.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, warn};

use super::{NamingConvention, TileIndex};
use crate::models::GeoPoint;

/// Center tile and the existing tiles of its 3x3 block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Neighborhood {
    /// Tile containing the point, if any
    pub center: Option<String>,
    /// Catalog names of the center and its existing neighbours
    pub tiles: BTreeSet<String>,
}

impl Neighborhood {
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

/// Resolves 3x3 tile neighbourhoods against a tile index
pub struct NeighborhoodResolver {
    index: TileIndex,
    convention: NamingConvention,
}

impl NeighborhoodResolver {
    pub fn new(index: TileIndex, convention: NamingConvention) -> Self {
        Self { index, convention }
    }

    /// Build the neighbourhood around a point
    ///
    /// A point outside every tile yields an empty neighbourhood.
    pub fn resolve(&self, point: &GeoPoint) -> Neighborhood {
        let Some(center) = self.index.locate(point.lon, point.lat) else {
            debug!("No tile covers ({}, {})", point.lat, point.lon);
            return Neighborhood::default();
        };

        let candidates = match self.convention.neighbors(center) {
            Ok(names) => names,
            Err(e) => {
                warn!("Skipping center tile: {}", e);
                return Neighborhood {
                    center: Some(center.to_string()),
                    tiles: BTreeSet::new(),
                };
            }
        };

        let tiles: BTreeSet<String> = std::iter::once(center.to_string())
            .chain(candidates)
            .filter(|name| self.index.exists(name))
            .collect();

        debug!(
            "Tile {} at ({}, {}): {} tiles in neighbourhood",
            center,
            point.lat,
            point.lon,
            tiles.len()
        );

        Neighborhood {
            center: Some(center.to_string()),
            tiles,
        }
    }

    /// Get the tile index (for stats/debugging)
    pub fn index(&self) -> &TileIndex {
        &self.index
    }

    pub fn convention(&self) -> &NamingConvention {
        &self.convention
    }
}
