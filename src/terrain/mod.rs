//! Terrain geometry generation (flat, raster-DEM, external mesh)

pub mod geometry;
pub mod generator;
pub mod flat;
pub mod dem;
pub mod external;

pub use geometry::{TileGeometry, HeightfieldBuilder};
pub use generator::{TerrainGenerator, TerrainKind, tile_aabb, map_to_local};
pub use flat::FlatTerrain;
pub use dem::DemTerrain;
pub use external::{ExternalMeshTerrain, MeshSource};
