//! PanoMapper - object detections around an address
//!
//! Resolves an address to the 3x3 block of catalog tiles around it and
//! selects the pre-computed detections tagged with those tiles. Shared by
//! the `serve` binary and the integration tests.

pub mod catalog;
pub mod config;
pub mod detections;
pub mod error;
pub mod geocode;
pub mod models;
pub mod session;
pub mod tiles;

pub use models::{GeoPoint, Tile};
pub use session::{AreaDetections, Session};
