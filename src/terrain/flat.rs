//! Flat terrain: zero-elevation quads over a configured extent

use crate::core::types::Result;
use crate::tiling::{Extent, TileXYZ, TilingScheme};

use super::generator::{TerrainGenerator, TerrainKind};
use super::geometry::TileGeometry;

/// Flat terrain over an explicitly configured extent.
///
/// A flat terrain has no natural bound, so its extent is free configuration:
/// typically the full extent of the map layers, but it need not match any
/// data source.
pub struct FlatTerrain {
    scheme: TilingScheme,
}

impl FlatTerrain {
    pub fn new(extent: Extent, crs: impl Into<String>) -> Self {
        Self {
            scheme: TilingScheme::from_extent(&extent, crs),
        }
    }
}

impl TerrainGenerator for FlatTerrain {
    fn kind(&self) -> TerrainKind {
        TerrainKind::Flat
    }

    fn scheme(&self) -> &TilingScheme {
        &self.scheme
    }

    fn base_error(&self, tile: TileXYZ) -> Result<f32> {
        // No geometric error of its own; tile side keeps texture refinement
        // going at the same rate as the other variants.
        Ok(self.scheme.tile_side(tile.z)? as f32)
    }

    fn generate(&self, tile: TileXYZ) -> Result<TileGeometry> {
        let footprint = self.scheme.tile_to_extent(tile)?;
        Ok(TileGeometry::flat_quad(&footprint, self.scheme.map_origin))
    }
}
