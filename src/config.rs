//! Service configuration, read from a TOML file.
//!
//! Every field has a default reproducing the Bordeaux deployment, so an
//! empty file (or no file at all) is a valid configuration.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::catalog::Source;
use crate::detections::DEFAULT_TILE_PROPERTY;
use crate::geocode::NOMINATIM_SEARCH_ENDPOINT;
use crate::tiles::{DuplicatePolicy, FieldSpan, NamingConvention};

const DEFAULT_TILES_URL: &str = "https://drive.google.com/uc?id=10JA-3LG6QMX_mC9Z2Ll1z8xT5Oc5La5Y";
const DEFAULT_DETECTIONS_URL: &str =
    "https://drive.google.com/uc?id=18GQ7-AlPia92Um6wTPyqXpMeVyVqcJkd";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub naming: NamingConfig,
    #[serde(default)]
    pub geocoder: GeocoderConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "ServerConfig::default_listen")]
    pub listen: String,
}

impl ServerConfig {
    fn default_listen() -> String {
        "0.0.0.0:3000".to_string()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: Self::default_listen(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    /// Tile catalog location (URL or path)
    #[serde(default = "CatalogConfig::default_tiles")]
    pub tiles: String,
    /// Detection dataset location (URL or path)
    #[serde(default = "CatalogConfig::default_detections")]
    pub detections: String,
    /// Tile feature property holding the tile name
    #[serde(default = "CatalogConfig::default_name_property")]
    pub name_property: String,
    /// Detection feature property holding the tile name
    #[serde(default = "CatalogConfig::default_tile_property")]
    pub tile_property: String,
    #[serde(default)]
    pub on_duplicate: DuplicatePolicy,
    #[serde(default = "CatalogConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl CatalogConfig {
    fn default_tiles() -> String {
        DEFAULT_TILES_URL.to_string()
    }

    fn default_detections() -> String {
        DEFAULT_DETECTIONS_URL.to_string()
    }

    fn default_name_property() -> String {
        "NOM".to_string()
    }

    fn default_tile_property() -> String {
        DEFAULT_TILE_PROPERTY.to_string()
    }

    const fn default_timeout_secs() -> u64 {
        120
    }

    pub fn tiles_source(&self) -> Source {
        Source::parse(&self.tiles)
    }

    pub fn detections_source(&self) -> Source {
        Source::parse(&self.detections)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            tiles: Self::default_tiles(),
            detections: Self::default_detections(),
            name_property: Self::default_name_property(),
            tile_property: Self::default_tile_property(),
            on_duplicate: DuplicatePolicy::default(),
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

/// Byte layout of tile names, see [`NamingConvention`]
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct NamingConfig {
    #[serde(default = "NamingConfig::default_line_offset")]
    pub line_offset: usize,
    #[serde(default = "NamingConfig::default_width")]
    pub line_width: usize,
    #[serde(default = "NamingConfig::default_row_offset")]
    pub row_offset: usize,
    #[serde(default = "NamingConfig::default_width")]
    pub row_width: usize,
    /// Line/row index distance between adjacent tiles
    #[serde(default = "NamingConfig::default_step")]
    pub step: i64,
}

impl NamingConfig {
    const fn default_line_offset() -> usize {
        8
    }

    const fn default_row_offset() -> usize {
        13
    }

    const fn default_width() -> usize {
        4
    }

    const fn default_step() -> i64 {
        5
    }

    pub fn convention(&self) -> Result<NamingConvention> {
        NamingConvention::new(
            FieldSpan::new(self.line_offset, self.line_width),
            FieldSpan::new(self.row_offset, self.row_width),
            self.step,
        )
        .context("Invalid [naming] section")
    }
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            line_offset: Self::default_line_offset(),
            line_width: Self::default_width(),
            row_offset: Self::default_row_offset(),
            row_width: Self::default_width(),
            step: Self::default_step(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct GeocoderConfig {
    #[serde(default = "GeocoderConfig::default_url")]
    pub url: String,
    /// Nominatim's usage policy requires an identifying user agent
    #[serde(default = "GeocoderConfig::default_user_agent")]
    pub user_agent: String,
    #[serde(default = "GeocoderConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl GeocoderConfig {
    fn default_url() -> String {
        NOMINATIM_SEARCH_ENDPOINT.to_string()
    }

    fn default_user_agent() -> String {
        concat!("PanoMapper/", env!("CARGO_PKG_VERSION")).to_string()
    }

    const fn default_timeout_secs() -> u64 {
        10
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            url: Self::default_url(),
            user_agent: Self::default_user_agent(),
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;
        config.naming.convention()?;
        Ok(config)
    }
}
