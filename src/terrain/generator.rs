//! Terrain generator abstraction shared by the LOD manager

use crate::core::types::{DVec2, Result, Vec3};
use crate::math::Aabb;
use crate::tiling::{TileXYZ, TilingScheme};

use super::geometry::TileGeometry;

/// Which terrain variant a generator implements. Dispatch happens once at
/// chunk creation; nothing else inspects this at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerrainKind {
    Flat,
    Dem,
    ExternalMesh,
}

/// Produces renderable geometry for tile addresses.
///
/// Implementations are queried from background worker tasks: they must not
/// mutate shared renderer state and hand results back as immutable
/// [`TileGeometry`] for the owning chunk to adopt.
pub trait TerrainGenerator: Send + Sync {
    fn kind(&self) -> TerrainKind;

    /// Tiling scheme of the terrain, in the terrain's own CRS.
    fn scheme(&self) -> &TilingScheme;

    /// Tile the quadtree is rooted at. Flat and DEM terrains root at the
    /// level-0 tile; an external source may root at the base tile computed
    /// from its data extent.
    fn root_tile(&self) -> TileXYZ {
        TileXYZ::new(0, 0, 0)
    }

    /// Vertical range (min, max) of generated geometry in scene units,
    /// exaggeration included. Bounds chunk AABBs before geometry arrives.
    fn height_span(&self) -> (f32, f32) {
        (0.0, 0.0)
    }

    /// Base geometric error of a tile in map units, the LOD manager's
    /// refinement metric. With a fixed sampling resolution this halves with
    /// each deeper level.
    fn base_error(&self, tile: TileXYZ) -> Result<f32>;

    /// Build the tile's geometry. Transient data failures (tile outside the
    /// raster, fetch failure) are errors here; the manager substitutes
    /// fallback geometry and keeps the chunk renderable.
    fn generate(&self, tile: TileXYZ) -> Result<TileGeometry>;
}

/// Map point to the local scene frame: x east, z south, origin at the
/// scheme's map origin.
pub fn map_to_local(pt: DVec2, map_origin: DVec2) -> (f32, f32) {
    (
        (pt.x - map_origin.x) as f32,
        -((pt.y - map_origin.y) as f32),
    )
}

/// Bounding box of a tile in the local scene frame, using the generator's
/// vertical span. Valid before any geometry has been loaded.
pub fn tile_aabb(generator: &dyn TerrainGenerator, tile: TileXYZ) -> Result<Aabb> {
    let scheme = generator.scheme();
    let extent = scheme.tile_to_extent(tile)?;
    let origin = scheme.map_origin;

    let (x0, z_from_ymin) = map_to_local(DVec2::new(extent.xmin, extent.ymin), origin);
    let (x1, z_from_ymax) = map_to_local(DVec2::new(extent.xmax, extent.ymax), origin);
    let (y0, y1) = generator.height_span();

    Ok(Aabb::new(
        Vec3::new(x0, y0.min(y1), z_from_ymax),
        Vec3::new(x1, y0.max(y1), z_from_ymin),
    ))
}
