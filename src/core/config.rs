//! Resolved project configuration consumed by the terrain core.
//!
//! The application shell persists its own project format; by the time values
//! reach this crate they are plain numbers and enums. This mirrors that
//! resolved surface so a driver can deserialize it from JSON directly.

use serde::{Deserialize, Serialize};

use crate::texture::settings::TextureSettings;

/// Which terrain generator variant to build.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TerrainSource {
    /// Flat terrain over an explicitly configured extent.
    Flat {
        xmin: f64,
        ymin: f64,
        xmax: f64,
        ymax: f64,
    },
    /// Heightfield sampled from an elevation raster on disk.
    Dem {
        path: String,
        /// Heights the raster's 0..max sample range maps onto, in map units.
        min_height: f32,
        max_height: f32,
    },
    /// Tile meshes fetched from an external source by tile address.
    External { endpoint: String },
}

/// Resolved scene configuration for the terrain core.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TerrainConfig {
    pub source: TerrainSource,
    /// CRS authority id of the terrain coordinates, opaque to the core.
    pub crs: String,
    /// Multiplier applied to elevations at geometry build time.
    #[serde(default = "default_exaggeration")]
    pub z_exaggeration: f32,
    /// Draw chunk bounding boxes as a debug overlay.
    #[serde(default)]
    pub show_bounding_boxes: bool,
    /// Stamp each tile texture with its address for alignment debugging.
    #[serde(default)]
    pub draw_tile_info: bool,
    pub texture: TextureSettings,
}

fn default_exaggeration() -> f32 {
    1.0
}
