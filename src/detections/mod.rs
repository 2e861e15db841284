//! Detection filtering by tile membership.

use std::collections::BTreeSet;

use geojson::{Feature, FeatureCollection};

/// Default property holding a detection's tile name
pub const DEFAULT_TILE_PROPERTY: &str = "tile";

/// Selects the detections tagged with one of a set of tile names
#[derive(Debug, Clone)]
pub struct DetectionFilter {
    tile_property: String,
}

impl Default for DetectionFilter {
    fn default() -> Self {
        Self::new(DEFAULT_TILE_PROPERTY)
    }
}

impl DetectionFilter {
    pub fn new(tile_property: impl Into<String>) -> Self {
        Self {
            tile_property: tile_property.into(),
        }
    }

    /// Tile name a detection is tagged with
    pub fn tile_of<'a>(&self, feature: &'a Feature) -> Option<&'a str> {
        feature
            .properties
            .as_ref()
            .and_then(|props| props.get(&self.tile_property))
            .and_then(|v| v.as_str())
    }

    /// Detections whose tile is in `tiles`, in input order
    pub fn filter(&self, tiles: &BTreeSet<String>, detections: &[Feature]) -> Vec<Feature> {
        if tiles.is_empty() {
            return Vec::new();
        }

        detections
            .iter()
            .filter(|f| self.tile_of(f).is_some_and(|t| tiles.contains(t)))
            .cloned()
            .collect()
    }

    /// Same as [`filter`](Self::filter), wrapped for rendering
    pub fn filter_collection(
        &self,
        tiles: &BTreeSet<String>,
        detections: &[Feature],
    ) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: self.filter(tiles, detections),
            foreign_members: None,
        }
    }
}
