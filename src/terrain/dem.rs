//! Raster-DEM terrain: heightfields sampled from an elevation raster

use std::path::Path;

use image::{DynamicImage, ImageBuffer, Luma};
use log::debug;

use crate::core::error::Error;
use crate::core::types::{DVec2, Result};
use crate::tiling::{Extent, TileXYZ, TilingScheme};

use super::generator::{TerrainGenerator, TerrainKind};
use super::geometry::{HeightfieldBuilder, TileGeometry};

type HeightRaster = ImageBuffer<Luma<u16>, Vec<u16>>;

/// Grid quads per tile side. Constant across levels, so geometric error
/// halves with every deeper level.
pub const DEFAULT_TILE_RESOLUTION: u32 = 16;

/// Terrain sampled from an elevation raster at a fixed grid resolution.
///
/// Raster samples are 16-bit grayscale mapped linearly onto
/// `[min_height, max_height]`. Samples outside the raster clamp to the edge;
/// a tile entirely outside the raster extent is a transient failure and the
/// manager falls back to flat geometry for it.
pub struct DemTerrain {
    scheme: TilingScheme,
    raster: HeightRaster,
    data_extent: Extent,
    min_height: f32,
    max_height: f32,
    z_exaggeration: f32,
    resolution: u32,
}

impl DemTerrain {
    pub fn from_image(
        img: DynamicImage,
        data_extent: Extent,
        crs: impl Into<String>,
        min_height: f32,
        max_height: f32,
        z_exaggeration: f32,
    ) -> Self {
        Self {
            scheme: TilingScheme::from_extent(&data_extent, crs),
            raster: img.into_luma16(),
            data_extent,
            min_height,
            max_height,
            z_exaggeration,
            resolution: DEFAULT_TILE_RESOLUTION,
        }
    }

    pub fn from_file(
        path: impl AsRef<Path>,
        data_extent: Extent,
        crs: impl Into<String>,
        min_height: f32,
        max_height: f32,
        z_exaggeration: f32,
    ) -> Result<Self> {
        let img = image::open(path.as_ref())
            .map_err(|e| Error::Raster(format!("{}: {}", path.as_ref().display(), e)))?;
        Ok(Self::from_image(img, data_extent, crs, min_height, max_height, z_exaggeration))
    }

    pub fn set_resolution(&mut self, resolution: u32) {
        assert!(resolution >= 1);
        self.resolution = resolution;
    }

    /// Bilinear height sample at a map point, clamped to the raster edge.
    fn sample_height(&self, pt: DVec2) -> f32 {
        let w = self.raster.width();
        let h = self.raster.height();

        // raster row 0 is the data extent's north edge
        let fx = (pt.x - self.data_extent.xmin) / self.data_extent.width() * (w - 1) as f64;
        let fy = (self.data_extent.ymax - pt.y) / self.data_extent.height() * (h - 1) as f64;
        let fx = fx.clamp(0.0, (w - 1) as f64);
        let fy = fy.clamp(0.0, (h - 1) as f64);

        let x0 = fx.floor() as u32;
        let y0 = fy.floor() as u32;
        let x1 = (x0 + 1).min(w - 1);
        let y1 = (y0 + 1).min(h - 1);
        let tx = (fx - x0 as f64) as f32;
        let ty = (fy - y0 as f64) as f32;

        let s = |x: u32, y: u32| self.raster.get_pixel(x, y).0[0] as f32 / u16::MAX as f32;
        let top = s(x0, y0) * (1.0 - tx) + s(x1, y0) * tx;
        let bottom = s(x0, y1) * (1.0 - tx) + s(x1, y1) * tx;
        let t = top * (1.0 - ty) + bottom * ty;

        (self.min_height + t * (self.max_height - self.min_height)) * self.z_exaggeration
    }
}

impl TerrainGenerator for DemTerrain {
    fn kind(&self) -> TerrainKind {
        TerrainKind::Dem
    }

    fn scheme(&self) -> &TilingScheme {
        &self.scheme
    }

    fn height_span(&self) -> (f32, f32) {
        (
            self.min_height * self.z_exaggeration,
            self.max_height * self.z_exaggeration,
        )
    }

    fn base_error(&self, tile: TileXYZ) -> Result<f32> {
        // error ~ one sample spacing at this level
        Ok((self.scheme.tile_side(tile.z)? / self.resolution as f64) as f32)
    }

    fn generate(&self, tile: TileXYZ) -> Result<TileGeometry> {
        let footprint = self.scheme.tile_to_extent(tile)?;

        let overlaps = footprint.xmin < self.data_extent.xmax
            && footprint.xmax > self.data_extent.xmin
            && footprint.ymin < self.data_extent.ymax
            && footprint.ymax > self.data_extent.ymin;
        if !overlaps {
            debug!("tile {} outside DEM extent", tile);
            return Err(Error::Raster(format!("tile {} outside raster extent", tile)));
        }

        let builder = HeightfieldBuilder::new(self.resolution);
        let side = builder.vertex_side() as usize;
        let mut heights = Vec::with_capacity(side * side);
        for j in 0..side {
            for i in 0..side {
                let pt = DVec2::new(
                    footprint.xmin + footprint.width() * i as f64 / self.resolution as f64,
                    footprint.ymin + footprint.height() * j as f64 / self.resolution as f64,
                );
                heights.push(self.sample_height(pt));
            }
        }

        Ok(builder.build(&footprint, self.scheme.map_origin, &heights))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GrayImage;

    fn ramp_terrain() -> DemTerrain {
        // 8x8 grayscale ramp, brighter to the east
        let img = GrayImage::from_fn(8, 8, |x, _y| image::Luma([(x * 32) as u8]));
        DemTerrain::from_image(
            DynamicImage::ImageLuma8(img),
            Extent::new(0.0, 0.0, 800.0, 800.0),
            "EPSG:32633",
            0.0,
            100.0,
            1.0,
        )
    }

    #[test]
    fn test_sample_rises_eastward() {
        let terrain = ramp_terrain();
        let west = terrain.sample_height(DVec2::new(50.0, 400.0));
        let east = terrain.sample_height(DVec2::new(750.0, 400.0));
        assert!(east > west);
        assert!(west >= 0.0 && east <= 100.0);
    }

    #[test]
    fn test_sample_clamps_outside_raster() {
        let terrain = ramp_terrain();
        let at_edge = terrain.sample_height(DVec2::new(0.0, 400.0));
        let beyond = terrain.sample_height(DVec2::new(-500.0, 400.0));
        assert_eq!(at_edge, beyond);
    }

    #[test]
    fn test_generate_heightfield_with_span() {
        let terrain = ramp_terrain();
        let geometry = terrain.generate(TileXYZ::new(0, 0, 0)).unwrap();

        let side = DEFAULT_TILE_RESOLUTION as usize + 1;
        assert_eq!(geometry.vertex_count(), side * side);
        assert!(geometry.aabb.max.y > geometry.aabb.min.y);
        assert!(geometry.aabb.max.y <= 100.0);
    }

    #[test]
    fn test_exaggeration_scales_heights() {
        let img = GrayImage::from_fn(4, 4, |_x, _y| image::Luma([255u8]));
        let terrain = DemTerrain::from_image(
            DynamicImage::ImageLuma8(img),
            Extent::new(0.0, 0.0, 400.0, 400.0),
            "EPSG:32633",
            0.0,
            100.0,
            3.0,
        );
        let h = terrain.sample_height(DVec2::new(200.0, 200.0));
        assert!((h - 300.0).abs() < 1e-3);
        assert_eq!(terrain.height_span(), (0.0, 300.0));
    }

    #[test]
    fn test_tile_outside_raster_is_transient_error() {
        let terrain = ramp_terrain();
        // deep tile in the far corner of the (square) root that the data
        // extent does not reach... data extent is square here, so use a tile
        // outside the data extent of a non-square dataset instead
        let img = GrayImage::from_fn(8, 4, |x, _y| image::Luma([(x * 16) as u8]));
        let narrow = DemTerrain::from_image(
            DynamicImage::ImageLuma8(img),
            Extent::new(0.0, 0.0, 800.0, 300.0),
            "EPSG:32633",
            0.0,
            50.0,
            1.0,
        );
        // root tile is 1024 wide, centered at (400, 150): its north strip is
        // well above the data extent at deeper levels
        let north_tile = TileXYZ::new(0, 3, 2);
        let result = narrow.generate(north_tile);
        assert!(matches!(result, Err(Error::Raster(_))));

        // square-extent terrain generates everywhere inside its root
        assert!(terrain.generate(TileXYZ::new(3, 3, 2)).is_ok());
    }

    #[test]
    fn test_from_file_reads_saved_raster() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dtm.png");
        let img = GrayImage::from_fn(8, 8, |x, _y| image::Luma([(x * 32) as u8]));
        img.save(&path).unwrap();

        let terrain = DemTerrain::from_file(
            &path,
            Extent::new(0.0, 0.0, 800.0, 800.0),
            "EPSG:32633",
            0.0,
            100.0,
            1.0,
        )
        .unwrap();
        let west = terrain.sample_height(DVec2::new(50.0, 400.0));
        let east = terrain.sample_height(DVec2::new(750.0, 400.0));
        assert!(east > west);
    }

    #[test]
    fn test_from_file_missing_path_errors() {
        let result = DemTerrain::from_file(
            "/nonexistent/dem.png",
            Extent::new(0.0, 0.0, 100.0, 100.0),
            "EPSG:32633",
            0.0,
            1.0,
            1.0,
        );
        assert!(matches!(result, Err(Error::Raster(_))));
    }
}
