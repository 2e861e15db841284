//! Tile catalog and detection dataset loading.
//!
//! Both datasets are GeoJSON FeatureCollections fetched once at startup,
//! either over HTTP(S) or from a local file.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use geo::{Coord, LineString, MultiPolygon, Polygon};
use geojson::{Feature, GeoJson, Value};
use reqwest::Client;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::CatalogError;
use crate::models::Tile;

/// Where a dataset is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(Url),
    Path(PathBuf),
}

impl Source {
    /// `http://` and `https://` locations are URLs, anything else a file path
    pub fn parse(location: &str) -> Self {
        match Url::parse(location) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Source::Url(url),
            _ => Source::Path(PathBuf::from(location)),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Url(url) => write!(f, "{}", url),
            Source::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Fetches GeoJSON datasets
pub struct CatalogLoader {
    client: Client,
}

impl CatalogLoader {
    pub fn new(timeout: Duration) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .user_agent(concat!("PanoMapper/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| CatalogError::Fetch {
                source_name: "HTTP client".to_string(),
                message: e.to_string(),
            })?;

        Ok(Self { client })
    }

    /// Fetch a source and parse it as a FeatureCollection
    pub async fn load_features(&self, source: &Source) -> Result<Vec<Feature>, CatalogError> {
        info!("Loading {}", source);

        let text = self.fetch(source).await?;
        let features = parse_feature_collection(&text, &source.to_string())?;

        info!("Loaded {} features from {}", features.len(), source);
        Ok(features)
    }

    async fn fetch(&self, source: &Source) -> Result<String, CatalogError> {
        let fetch_error = |message: String| CatalogError::Fetch {
            source_name: source.to_string(),
            message,
        };

        match source {
            Source::Path(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|e| fetch_error(e.to_string())),
            Source::Url(url) => {
                let response = self
                    .client
                    .get(url.clone())
                    .send()
                    .await
                    .map_err(|e| fetch_error(e.to_string()))?;

                if !response.status().is_success() {
                    return Err(fetch_error(format!("HTTP status {}", response.status())));
                }

                let text = response
                    .text()
                    .await
                    .map_err(|e| fetch_error(e.to_string()))?;
                debug!("Fetched {} bytes from {}", text.len(), url);
                Ok(text)
            }
        }
    }
}

/// Parse a GeoJSON document that must be a FeatureCollection
pub fn parse_feature_collection(text: &str, source_name: &str) -> Result<Vec<Feature>, CatalogError> {
    let geojson: GeoJson = text.parse().map_err(|e: geojson::Error| CatalogError::Parse {
        source_name: source_name.to_string(),
        message: e.to_string(),
    })?;

    match geojson {
        GeoJson::FeatureCollection(collection) => Ok(collection.features),
        _ => Err(CatalogError::NotFeatureCollection(source_name.to_string())),
    }
}

/// Tiles extracted from a catalog, plus how many features were unusable
#[derive(Debug, Default)]
pub struct ExtractedTiles {
    pub tiles: Vec<Tile>,
    pub skipped: usize,
}

/// Extract named tiles from catalog features
///
/// Features without a string `name_property` or without a Polygon or
/// MultiPolygon geometry are logged and skipped.
pub fn extract_tiles(features: Vec<Feature>, name_property: &str) -> ExtractedTiles {
    let mut extracted = ExtractedTiles {
        tiles: Vec::with_capacity(features.len()),
        skipped: 0,
    };

    for (index, feature) in features.into_iter().enumerate() {
        match extract_tile(index, &feature, name_property) {
            Ok(tile) => extracted.tiles.push(tile),
            Err(e) => {
                warn!("Skipping catalog feature #{}: {}", index, e);
                extracted.skipped += 1;
            }
        }
    }

    if extracted.skipped > 0 {
        warn!(
            "Skipped {} unusable catalog features, kept {} tiles",
            extracted.skipped,
            extracted.tiles.len()
        );
    }

    extracted
}

fn extract_tile(index: usize, feature: &Feature, name_property: &str) -> Result<Tile, CatalogError> {
    let name = feature
        .properties
        .as_ref()
        .and_then(|props| props.get(name_property))
        .and_then(|v| v.as_str())
        .ok_or_else(|| CatalogError::MissingName {
            index,
            property: name_property.to_string(),
        })?;

    let geometry = feature
        .geometry
        .as_ref()
        .and_then(|g| to_multi_polygon(&g.value))
        .ok_or_else(|| CatalogError::UnsupportedGeometry {
            name: name.to_string(),
        })?;

    Ok(Tile::new(name, geometry))
}

fn to_multi_polygon(value: &Value) -> Option<MultiPolygon<f64>> {
    match value {
        Value::Polygon(rings) => Some(MultiPolygon::new(vec![to_polygon(rings)?])),
        Value::MultiPolygon(polygons) => {
            let polygons = polygons
                .iter()
                .map(|rings| to_polygon(rings))
                .collect::<Option<Vec<_>>>()?;
            Some(MultiPolygon::new(polygons))
        }
        _ => None,
    }
}

fn to_polygon(rings: &[Vec<Vec<f64>>]) -> Option<Polygon<f64>> {
    let (exterior, interiors) = rings.split_first()?;
    let interiors = interiors
        .iter()
        .map(|ring| to_line_string(ring))
        .collect::<Option<Vec<_>>>()?;
    Some(Polygon::new(to_line_string(exterior)?, interiors))
}

fn to_line_string(ring: &[Vec<f64>]) -> Option<LineString<f64>> {
    let coords = ring
        .iter()
        .map(|position| match position.as_slice() {
            [x, y, ..] => Some(Coord { x: *x, y: *y }),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;

    if coords.len() < 4 {
        return None;
    }
    Some(LineString::new(coords))
}
