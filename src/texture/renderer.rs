//! Backing map renderer interface

use image::{Rgba, RgbaImage};

use crate::tiling::Extent;

use super::settings::TextureSettings;

/// The external map-rendering service: draws the configured imagery layers
/// for a map extent into a raster. Called from background worker tasks, so
/// implementations must be thread-safe and must not share mutable state.
pub trait MapRenderer: Send + Sync {
    fn render(&self, extent: &Extent, settings: &TextureSettings) -> RgbaImage;
}

/// Deterministic stand-in renderer for tests and demos: background fill plus
/// a grid pattern aligned to map coordinates, so adjacent tiles line up.
pub struct SolidRenderer {
    /// Map-unit spacing of the grid lines.
    pub grid_spacing: f64,
    pub grid_color: [u8; 4],
}

impl Default for SolidRenderer {
    fn default() -> Self {
        Self {
            grid_spacing: 100.0,
            grid_color: [40, 40, 40, 255],
        }
    }
}

impl MapRenderer for SolidRenderer {
    fn render(&self, extent: &Extent, settings: &TextureSettings) -> RgbaImage {
        let size = settings.tile_texture_size;
        let mut img = RgbaImage::from_pixel(size, size, Rgba(settings.background));

        let per_px = extent.width() / size as f64;
        for py in 0..size {
            // pixel row 0 sits at the extent's north edge
            let map_y = extent.ymax - (py as f64 + 0.5) * per_px;
            for px in 0..size {
                let map_x = extent.xmin + (px as f64 + 0.5) * per_px;
                let on_x = (map_x.rem_euclid(self.grid_spacing)) < per_px;
                let on_y = (map_y.rem_euclid(self.grid_spacing)) < per_px;
                if on_x || on_y {
                    img.put_pixel(px, py, Rgba(self.grid_color));
                }
            }
        }
        img
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_respects_settings() {
        let renderer = SolidRenderer::default();
        let settings = TextureSettings {
            tile_texture_size: 64,
            background: [10, 20, 30, 255],
            ..Default::default()
        };
        let img = renderer.render(&Extent::new(0.0, 0.0, 1000.0, 1000.0), &settings);
        assert_eq!(img.dimensions(), (64, 64));
        // some pixel away from grid lines keeps the background color
        assert_eq!(img.get_pixel(2, 2).0, [10, 20, 30, 255]);
    }

    #[test]
    fn test_render_is_deterministic() {
        let renderer = SolidRenderer::default();
        let settings = TextureSettings::default();
        let extent = Extent::new(0.0, 0.0, 500.0, 500.0);
        let a = renderer.render(&extent, &settings);
        let b = renderer.render(&extent, &settings);
        assert_eq!(a.as_raw(), b.as_raw());
    }
}
