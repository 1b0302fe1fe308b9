//! Headless chunked-terrain demo: flies a camera toward the terrain and logs
//! how the LOD quadtree refines.
//!
//! Takes an optional path to a JSON [`TerrainConfig`]; without one it runs a
//! flat terrain with the grid renderer.

use std::sync::Arc;
use std::time::Duration;

use log::info;

use terralod::chunked::{ChunkedEntity, LodConfig};
use terralod::core::camera::Camera;
use terralod::core::config::{TerrainConfig, TerrainSource};
use terralod::core::logging;
use terralod::core::scene::SceneState;
use terralod::core::types::{Result, Vec3};
use terralod::core::Error;
use terralod::terrain::{DemTerrain, FlatTerrain, TerrainGenerator};
use terralod::texture::{SolidRenderer, TextureSettings};
use terralod::tiling::Extent;

fn default_config() -> TerrainConfig {
    TerrainConfig {
        source: TerrainSource::Flat {
            xmin: 0.0,
            ymin: 0.0,
            xmax: 16384.0,
            ymax: 16384.0,
        },
        crs: "EPSG:3857".to_string(),
        z_exaggeration: 1.0,
        show_bounding_boxes: false,
        draw_tile_info: true,
        texture: TextureSettings::default(),
    }
}

fn load_config() -> Result<TerrainConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            let text = std::fs::read_to_string(&path)?;
            serde_json::from_str(&text).map_err(|e| Error::Config(format!("{}: {}", path, e)))
        }
        None => Ok(default_config()),
    }
}

fn build_generator(config: &TerrainConfig) -> Result<Arc<dyn TerrainGenerator>> {
    match &config.source {
        TerrainSource::Flat { xmin, ymin, xmax, ymax } => Ok(Arc::new(FlatTerrain::new(
            Extent::new(*xmin, *ymin, *xmax, *ymax),
            config.crs.clone(),
        ))),
        TerrainSource::Dem { path, min_height, max_height } => {
            // the demo treats the raster pixel grid as one map unit per pixel
            let img = image::open(path).map_err(|e| Error::Raster(format!("{}: {}", path, e)))?;
            let extent = Extent::new(0.0, 0.0, img.width() as f64, img.height() as f64);
            Ok(Arc::new(DemTerrain::from_image(
                img,
                extent,
                config.crs.clone(),
                *min_height,
                *max_height,
                config.z_exaggeration,
            )))
        }
        TerrainSource::External { endpoint } => Err(Error::Config(format!(
            "external source '{}' needs a mesh source; not wired in this demo",
            endpoint
        ))),
    }
}

fn main() -> Result<()> {
    logging::init();

    let config = load_config()?;
    let generator = build_generator(&config)?;
    let scheme = generator.scheme();
    info!(
        "terrain ready: origin ({:.1}, {:.1}), base tile side {:.1} [{}]",
        scheme.map_origin.x, scheme.map_origin.y, scheme.base_tile_side, scheme.crs
    );

    let lod = LodConfig {
        show_bounding_boxes: config.show_bounding_boxes,
        draw_tile_info: config.draw_tile_info,
        ..Default::default()
    };
    let mut entity = ChunkedEntity::new(
        generator,
        Arc::new(SolidRenderer::default()),
        config.texture.clone(),
        lod,
    )?;

    // fly the camera in from high above, letting the quadtree settle at each
    // step before moving on
    let viewport = (1280u32, 720u32);
    let mut height = 20_000.0f32;
    while height > 100.0 {
        let camera = Camera::look_at(Vec3::new(1.0, height, 1.0), Vec3::ZERO, Vec3::Y);
        let state = SceneState::capture(&camera, viewport.0, viewport.1);

        entity.update(&state);
        while entity.needs_update() {
            entity.drain_loads();
            entity.update(&state);
            std::thread::sleep(Duration::from_millis(5));
        }

        let renderable = entity.renderable_set();
        let max_level = renderable
            .iter()
            .filter_map(|id| entity.chunk(*id))
            .map(|c| c.tile.z)
            .max()
            .unwrap_or(0);
        info!(
            "camera height {:>8.0}: {} chunks alive, {} renderable, deepest level {}",
            height,
            entity.chunk_count(),
            renderable.len(),
            max_level
        );

        height *= 0.5;
    }

    Ok(())
}
