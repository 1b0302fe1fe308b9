//! Map rendering configuration snapshot

use serde::{Deserialize, Serialize};

/// Immutable backing-map configuration supplied at generator construction:
/// which layers to draw, output pixel size, background fill, destination CRS.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TextureSettings {
    /// Output size of a tile texture, in pixels (tiles are square).
    #[serde(default = "default_tile_texture_size")]
    pub tile_texture_size: u32,
    /// Background fill color, RGBA.
    #[serde(default = "default_background")]
    pub background: [u8; 4],
    /// CRS authority id the map is rendered in.
    #[serde(default)]
    pub destination_crs: String,
    /// Names of the imagery layers to draw, bottom to top.
    #[serde(default)]
    pub layers: Vec<String>,
}

fn default_tile_texture_size() -> u32 {
    512
}

fn default_background() -> [u8; 4] {
    [128, 128, 128, 255]
}

impl Default for TextureSettings {
    fn default() -> Self {
        Self {
            tile_texture_size: default_tile_texture_size(),
            background: default_background(),
            destination_crs: String::new(),
            layers: Vec::new(),
        }
    }
}
