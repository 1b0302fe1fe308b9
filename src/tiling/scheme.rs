//! Tiling scheme mapping continuous map space to quadtree tile addresses.
//!
//! Same addressing as WMTS / TMS / XYZ layers: tile (0,0) of each level sits
//! in the bottom-left corner, levels halve the tile side. The level-0 tile is
//! centered on the full extent and completely contains it, so any tile
//! address at any level maps back into scene bounds without extra clipping.

use std::fmt;

use crate::core::error::{contract_violation, Error};
use crate::core::types::{DVec2, Result};
use crate::tiling::extent::Extent;

/// Deepest zoom level the scheme will address. Tile coordinates are u32, and
/// at level 30 the tile side is already a 2^-30 fraction of the root tile.
pub const MAX_ZOOM: u8 = 30;

/// Quadtree tile address: (x, y) column/row at zoom level z.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileXYZ {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

impl TileXYZ {
    pub fn new(x: u32, y: u32, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Address of one of the four children at level z+1
    /// (bit 0 = east half, bit 1 = north half).
    pub fn child(&self, quadrant: u8) -> TileXYZ {
        debug_assert!(quadrant < 4);
        TileXYZ {
            x: self.x * 2 + (quadrant & 1) as u32,
            y: self.y * 2 + ((quadrant >> 1) & 1) as u32,
            z: self.z + 1,
        }
    }

    /// Whether x and y are within range for level z.
    pub fn in_range(&self) -> bool {
        self.z <= MAX_ZOOM && {
            let n = 1u64 << self.z;
            (self.x as u64) < n && (self.y as u64) < n
        }
    }
}

impl fmt::Display for TileXYZ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Tiling scheme for a quadtree addressed by (x, y, z).
///
/// Built from a full map extent: `map_origin` is the extent's center and
/// `base_tile_side` the smallest power of two that covers the extent's larger
/// side. Immutable once constructed. A scheme built from an invalid extent is
/// degenerate; every query on it returns [`Error::DegenerateScheme`].
#[derive(Clone, Debug)]
pub struct TilingScheme {
    /// Center of the level-0 tile, in map coordinates
    pub map_origin: DVec2,
    /// Tile side length at zoom level 0, in map units (0 when degenerate)
    pub base_tile_side: f64,
    /// CRS authority id of the map coordinates, opaque to the core
    pub crs: String,
}

impl TilingScheme {
    /// Create a tiling scheme whose level-0 tile is centered on `full_extent`
    /// and fully contains it. An invalid extent yields a degenerate scheme.
    pub fn from_extent(full_extent: &Extent, crs: impl Into<String>) -> Self {
        if !full_extent.is_valid() {
            return Self {
                map_origin: DVec2::ZERO,
                base_tile_side: 0.0,
                crs: crs.into(),
            };
        }
        let longest = full_extent.width().max(full_extent.height());
        // smallest power of two >= longest side; exact for exact powers
        let base_tile_side = longest.log2().ceil().exp2();
        Self {
            map_origin: full_extent.center(),
            base_tile_side,
            crs: crs.into(),
        }
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.base_tile_side > 0.0)
    }

    /// Tile side length at zoom level z, in map units.
    pub fn tile_side(&self, z: u8) -> Result<f64> {
        if self.is_degenerate() {
            return Err(Error::DegenerateScheme);
        }
        if z > MAX_ZOOM {
            return Err(contract_violation(format!("zoom level {} out of range", z)));
        }
        Ok(self.base_tile_side / (1u64 << z) as f64)
    }

    // Bottom-left corner of tile (0,0) at every level: the level-0 tile is
    // centered on the map origin.
    fn anchor(&self) -> DVec2 {
        self.map_origin - DVec2::splat(self.base_tile_side * 0.5)
    }

    /// Map coordinates of the lower-left corner of a tile.
    pub fn tile_to_map(&self, tile: TileXYZ) -> Result<DVec2> {
        let side = self.tile_side(tile.z)?;
        if !tile.in_range() {
            return Err(contract_violation(format!("tile {} out of level range", tile)));
        }
        Ok(self.anchor() + DVec2::new(tile.x as f64 * side, tile.y as f64 * side))
    }

    /// Fractional tile coordinates of a map point at zoom level z. Used for
    /// hit-testing which tile contains a point, not for address rounding.
    pub fn map_to_tile(&self, pt: DVec2, z: u8) -> Result<DVec2> {
        let side = self.tile_side(z)?;
        Ok((pt - self.anchor()) / side)
    }

    /// Map extent covered exactly by a tile.
    pub fn tile_to_extent(&self, tile: TileXYZ) -> Result<Extent> {
        let side = self.tile_side(tile.z)?;
        let corner = self.tile_to_map(tile)?;
        Ok(Extent::new(corner.x, corner.y, corner.x + side, corner.y + side))
    }

    /// Address of the tile that most tightly fits the given extent: the
    /// deepest zoom level at which a single tile still contains it. An extent
    /// exactly equal to a tile resolves to that tile's own level.
    pub fn extent_to_tile(&self, extent: &Extent) -> Result<TileXYZ> {
        if self.is_degenerate() {
            return Err(Error::DegenerateScheme);
        }
        if !extent.is_valid() {
            return Err(contract_violation("extent_to_tile on invalid extent"));
        }

        let mut best: Option<TileXYZ> = None;
        for z in 0..=MAX_ZOOM {
            let frac = self.map_to_tile(DVec2::new(extent.xmin, extent.ymin), z)?;
            let n = (1u64 << z) as f64;
            // nudge so a corner exactly on a tile boundary lands in the tile
            // whose extent starts there
            let eps = 1e-9;
            let fx = (frac.x + eps).floor();
            let fy = (frac.y + eps).floor();
            if fx < 0.0 || fy < 0.0 || fx >= n || fy >= n {
                break;
            }
            let candidate = TileXYZ::new(fx as u32, fy as u32, z);
            if !self.tile_to_extent(candidate)?.contains(extent) {
                break;
            }
            best = Some(candidate);
        }
        best.ok_or_else(|| contract_violation("extent outside the level-0 tile"))
    }
}
