//! Loaded datasets shared by every query.
//!
//! A [`Session`] is built once at startup and only read afterwards; each
//! query produces fresh [`AreaDetections`] without touching the datasets.

use anyhow::{Context, Result};
use geojson::{Feature, FeatureCollection};
use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::{extract_tiles, CatalogLoader};
use crate::config::Config;
use crate::detections::DetectionFilter;
use crate::error::CatalogError;
use crate::models::{GeoPoint, Tile};
use crate::tiles::{DuplicatePolicy, NamingConvention, Neighborhood, NeighborhoodResolver, TileIndex};

/// Detections around one queried point
#[derive(Debug, Serialize)]
pub struct AreaDetections {
    pub point: Option<GeoPoint>,
    pub center_tile: Option<String>,
    pub tiles: Vec<String>,
    pub detections: FeatureCollection,
}

impl AreaDetections {
    fn new(point: Option<GeoPoint>, neighborhood: Neighborhood, detections: Vec<Feature>) -> Self {
        Self {
            point,
            center_tile: neighborhood.center,
            tiles: neighborhood.tiles.into_iter().collect(),
            detections: FeatureCollection {
                bbox: None,
                features: detections,
                foreign_members: None,
            },
        }
    }
}

/// Tile index and detection dataset, read-only after construction
pub struct Session {
    resolver: NeighborhoodResolver,
    filter: DetectionFilter,
    detections: Vec<Feature>,
}

impl Session {
    pub fn new(
        tiles: Vec<Tile>,
        detections: Vec<Feature>,
        convention: NamingConvention,
        policy: DuplicatePolicy,
        filter: DetectionFilter,
    ) -> Result<Self, CatalogError> {
        let index = TileIndex::build(tiles, &convention, policy)?;
        let session = Self {
            resolver: NeighborhoodResolver::new(index, convention),
            filter,
            detections,
        };
        session.report_orphans();
        Ok(session)
    }

    /// Fetch both datasets and build the session
    ///
    /// Fetch and parse failures are fatal; unusable catalog tiles are
    /// skipped and reported.
    pub async fn load(config: &Config) -> Result<Self> {
        let catalog = &config.catalog;
        let loader = CatalogLoader::new(catalog.timeout())?;

        let tiles_source = catalog.tiles_source();
        let detections_source = catalog.detections_source();

        let (tile_features, detections) = tokio::try_join!(
            async {
                loader
                    .load_features(&tiles_source)
                    .await
                    .context("Failed to load tile catalog")
            },
            async {
                loader
                    .load_features(&detections_source)
                    .await
                    .context("Failed to load detections")
            },
        )?;

        let extracted = extract_tiles(tile_features, &catalog.name_property);

        let session = Self::new(
            extracted.tiles,
            detections,
            config.naming.convention()?,
            catalog.on_duplicate,
            DetectionFilter::new(catalog.tile_property.clone()),
        )?;

        info!(
            "Session ready: {} tiles ({} skipped, {} malformed names), {} detections",
            session.tile_count(),
            extracted.skipped,
            session.resolver.index().malformed_count(),
            session.detection_count()
        );
        Ok(session)
    }

    /// Detections in the 3x3 tile block around `point`
    ///
    /// `None` (address not geocoded) and points outside the catalog both
    /// yield an empty result.
    pub fn query(&self, point: Option<GeoPoint>) -> AreaDetections {
        let neighborhood = match point {
            Some(p) => self.resolver.resolve(&p),
            None => Neighborhood::default(),
        };

        let detections = self.filter.filter(&neighborhood.tiles, &self.detections);
        AreaDetections::new(point, neighborhood, detections)
    }

    pub fn resolver(&self) -> &NeighborhoodResolver {
        &self.resolver
    }

    pub fn tile(&self, name: &str) -> Option<&Tile> {
        self.resolver.index().get(name)
    }

    pub fn tile_count(&self) -> usize {
        self.resolver.index().len()
    }

    pub fn detection_count(&self) -> usize {
        self.detections.len()
    }

    /// Log detections whose tile tag does not name a catalog tile
    fn report_orphans(&self) {
        let index = self.resolver.index();
        let orphans = self
            .detections
            .iter()
            .filter(|f| !self.filter.tile_of(f).is_some_and(|t| index.exists(t)))
            .count();

        if orphans > 0 {
            warn!(
                "{} of {} detections reference no catalog tile and will never be shown",
                orphans,
                self.detections.len()
            );
        }
    }
}
