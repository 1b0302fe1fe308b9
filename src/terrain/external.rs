//! Terrain meshes supplied by an external, tile-addressed source

use std::sync::Arc;

use crate::core::types::Result;
use crate::tiling::{Extent, TileXYZ, TilingScheme};

use super::generator::{TerrainGenerator, TerrainKind};
use super::geometry::TileGeometry;

/// Out-of-process or precomputed mesh source keyed by tile address.
///
/// Fetches run on background worker tasks; a failed fetch is transient and
/// handled by the LOD manager with fallback geometry.
pub trait MeshSource: Send + Sync {
    fn fetch(&self, tile: TileXYZ) -> Result<TileGeometry>;

    /// Vertical range of the source's meshes in scene units.
    fn height_span(&self) -> (f32, f32) {
        (0.0, 0.0)
    }
}

/// Terrain whose tile geometry comes from an external source. The quadtree
/// roots at the base tile that most tightly fits the source's data extent.
pub struct ExternalMeshTerrain {
    scheme: TilingScheme,
    source: Arc<dyn MeshSource>,
    base_tile: TileXYZ,
}

impl ExternalMeshTerrain {
    pub fn new(
        data_extent: Extent,
        crs: impl Into<String>,
        source: Arc<dyn MeshSource>,
    ) -> Result<Self> {
        let scheme = TilingScheme::from_extent(&data_extent, crs);
        let base_tile = scheme.extent_to_tile(&data_extent)?;
        Ok(Self { scheme, source, base_tile })
    }

    pub fn base_tile(&self) -> TileXYZ {
        self.base_tile
    }
}

impl TerrainGenerator for ExternalMeshTerrain {
    fn kind(&self) -> TerrainKind {
        TerrainKind::ExternalMesh
    }

    fn scheme(&self) -> &TilingScheme {
        &self.scheme
    }

    fn root_tile(&self) -> TileXYZ {
        self.base_tile
    }

    fn height_span(&self) -> (f32, f32) {
        self.source.height_span()
    }

    fn base_error(&self, tile: TileXYZ) -> Result<f32> {
        Ok(self.scheme.tile_side(tile.z)? as f32)
    }

    fn generate(&self, tile: TileXYZ) -> Result<TileGeometry> {
        self.source.fetch(tile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::Error;

    struct StubSource;

    impl MeshSource for StubSource {
        fn fetch(&self, tile: TileXYZ) -> Result<TileGeometry> {
            if tile.z > 2 {
                return Err(Error::Fetch(format!("tile {} not available", tile)));
            }
            Ok(TileGeometry::flat_quad(
                &Extent::new(0.0, 0.0, 1.0, 1.0),
                glam::DVec2::ZERO,
            ))
        }

        fn height_span(&self) -> (f32, f32) {
            (0.0, 250.0)
        }
    }

    #[test]
    fn test_root_is_base_tile_from_extent() {
        // extent matching tile (0,0,0) exactly roots at level 0
        let terrain = ExternalMeshTerrain::new(
            Extent::new(0.0, 0.0, 1024.0, 1024.0),
            "EPSG:4326",
            Arc::new(StubSource),
        )
        .unwrap();
        assert_eq!(terrain.root_tile(), TileXYZ::new(0, 0, 0));
        assert_eq!(terrain.height_span(), (0.0, 250.0));
    }

    #[test]
    fn test_fetch_failure_propagates_as_transient() {
        let terrain = ExternalMeshTerrain::new(
            Extent::new(0.0, 0.0, 100.0, 100.0),
            "EPSG:4326",
            Arc::new(StubSource),
        )
        .unwrap();
        assert!(terrain.generate(TileXYZ::new(0, 0, 0)).is_ok());
        assert!(matches!(
            terrain.generate(TileXYZ::new(0, 0, 5)),
            Err(Error::Fetch(_))
        ));
    }
}
