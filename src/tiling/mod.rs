//! Quadtree tiling scheme: map coordinates <-> tile addresses

pub mod extent;
pub mod scheme;

pub use extent::Extent;
pub use scheme::{TilingScheme, TileXYZ, MAX_ZOOM};
