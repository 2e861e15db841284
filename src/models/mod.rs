//! Core data models shared by the tile index and the HTTP layer.

pub mod point;
pub mod tile;

pub use point::GeoPoint;
pub use tile::Tile;
