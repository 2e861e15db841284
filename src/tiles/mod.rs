//! Tile grid resolution.
//!
//! Locates the catalog tile under a point with an R-tree backed index and
//! expands it to its 3x3 neighbourhood using the catalog's positional
//! naming convention.

mod index;
mod naming;
mod neighborhood;

pub use index::{DuplicatePolicy, TileIndex};
pub use naming::{FieldSpan, NamingConvention};
pub use neighborhood::{Neighborhood, NeighborhoodResolver};
