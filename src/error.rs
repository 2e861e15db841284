//! Error types for tile catalogs, naming and geocoding.

use thiserror::Error;

/// Errors raised by the tile naming codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TileError {
    #[error("malformed tile name {name:?}: {reason}")]
    MalformedName { name: String, reason: String },

    #[error("invalid naming convention: {0}")]
    InvalidConvention(String),
}

impl TileError {
    pub(crate) fn malformed(name: &str, reason: impl Into<String>) -> Self {
        TileError::MalformedName {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while loading the tile catalog or detection dataset.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to fetch {source_name}: {message}")]
    Fetch {
        source_name: String,
        message: String,
    },

    #[error("failed to parse GeoJSON from {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    #[error("{0} is not a GeoJSON FeatureCollection")]
    NotFeatureCollection(String),

    #[error("tile feature #{index} has no string property {property:?}")]
    MissingName { index: usize, property: String },

    #[error("tile {name:?} has no polygon geometry")]
    UnsupportedGeometry { name: String },

    #[error("duplicate tile name {0:?} in catalog")]
    DuplicateTile(String),
}

/// Errors raised by the address geocoder.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoder request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid geocoder endpoint {0}")]
    InvalidEndpoint(String),

    #[error("geocoder returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("geocoder returned an unparsable coordinate {0:?}")]
    InvalidCoordinate(String),
}
