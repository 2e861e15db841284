//! Spatial index for tile lookups.

use geo::{Intersects, Point};
use hashbrown::HashMap;
use rstar::{RTree, RTreeObject, AABB};
use serde::Deserialize;
use tracing::{info, warn};

use super::NamingConvention;
use crate::error::CatalogError;
use crate::models::Tile;

/// What to do when two catalog tiles share a name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Keep the last geometry and log a warning
    #[default]
    Warn,
    /// Refuse to build the index
    Reject,
}

/// R-tree entry pointing back into the catalog by position
#[derive(Debug, Clone)]
struct IndexedTile {
    position: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedTile {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// In-memory tile catalog: name lookup plus point-in-polygon search
pub struct TileIndex {
    /// Tiles in catalog order
    tiles: Vec<Tile>,
    by_name: HashMap<String, usize>,
    tree: RTree<IndexedTile>,
    /// Names that do not follow the naming convention
    malformed: usize,
}

impl TileIndex {
    /// Build the index from catalog tiles
    pub fn build(
        catalog: Vec<Tile>,
        convention: &NamingConvention,
        policy: DuplicatePolicy,
    ) -> Result<Self, CatalogError> {
        info!("Building tile index for {} tiles...", catalog.len());

        let mut tiles: Vec<Tile> = Vec::with_capacity(catalog.len());
        let mut by_name = HashMap::with_capacity(catalog.len());

        for tile in catalog {
            let existing = by_name.get(&tile.name).copied();
            match existing {
                Some(position) => match policy {
                    DuplicatePolicy::Reject => {
                        return Err(CatalogError::DuplicateTile(tile.name));
                    }
                    DuplicatePolicy::Warn => {
                        warn!("Duplicate tile {:?}: keeping the last geometry", tile.name);
                        tiles[position] = tile;
                    }
                },
                None => {
                    by_name.insert(tile.name.clone(), tiles.len());
                    tiles.push(tile);
                }
            }
        }

        let mut malformed = 0;
        for tile in &tiles {
            if let Err(e) = convention.parse(&tile.name) {
                warn!("{}; its neighbours cannot be resolved", e);
                malformed += 1;
            }
        }

        let indexed: Vec<IndexedTile> = tiles
            .iter()
            .enumerate()
            .filter_map(|(position, tile)| {
                let (min_x, min_y, max_x, max_y) = tile.bbox()?;
                Some(IndexedTile {
                    position,
                    envelope: AABB::from_corners([min_x, min_y], [max_x, max_y]),
                })
            })
            .collect();

        let tree = RTree::bulk_load(indexed);

        info!(
            "Tile index built with {} entries ({} malformed names)",
            tree.size(),
            malformed
        );

        Ok(Self {
            tiles,
            by_name,
            tree,
            malformed,
        })
    }

    /// Name of the first tile (in catalog order) containing the point,
    /// boundary included
    pub fn locate(&self, lon: f64, lat: f64) -> Option<&str> {
        let point = Point::new(lon, lat);
        let query_envelope = AABB::from_point([lon, lat]);

        self.tree
            .locate_in_envelope_intersecting(&query_envelope)
            .filter(|it| self.tiles[it.position].geometry.intersects(&point))
            .map(|it| it.position)
            .min()
            .map(|position| self.tiles[position].name.as_str())
    }

    pub fn exists(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Tile> {
        self.by_name.get(name).map(|&position| &self.tiles[position])
    }

    /// Tile names in catalog order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tiles.iter().map(|t| t.name.as_str())
    }

    /// Number of catalog names that fail the naming convention
    pub fn malformed_count(&self) -> usize {
        self.malformed
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}
