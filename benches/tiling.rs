use criterion::{criterion_group, criterion_main, Criterion, black_box};

use terralod::terrain::{DemTerrain, HeightfieldBuilder, TileGeometry};
use terralod::tiling::{Extent, TileXYZ, TilingScheme};

use glam::DVec2;
use image::{DynamicImage, GrayImage};

fn bench_extent_to_tile(c: &mut Criterion) {
    let scheme = TilingScheme::from_extent(&Extent::new(0.0, 0.0, 1000.0, 600.0), "EPSG:3857");
    let tile = TileXYZ::new(37, 21, 6);
    let extent = scheme.tile_to_extent(tile).unwrap();

    c.bench_function("extent_to_tile_level6", |b| {
        b.iter(|| scheme.extent_to_tile(black_box(&extent)).unwrap());
    });
}

fn bench_tile_to_extent(c: &mut Criterion) {
    let scheme = TilingScheme::from_extent(&Extent::new(0.0, 0.0, 1000.0, 600.0), "EPSG:3857");

    c.bench_function("tile_to_extent", |b| {
        b.iter(|| scheme.tile_to_extent(black_box(TileXYZ::new(37, 21, 6))).unwrap());
    });
}

fn bench_heightfield_build_16(c: &mut Criterion) {
    let builder = HeightfieldBuilder::new(16);
    let side = builder.vertex_side() as usize;
    let heights: Vec<f32> = (0..side * side).map(|i| (i as f32 * 0.1).sin() * 50.0).collect();
    let footprint = Extent::new(0.0, 0.0, 512.0, 512.0);

    c.bench_function("heightfield_build_16", |b| {
        b.iter(|| builder.build(black_box(&footprint), DVec2::new(256.0, 256.0), black_box(&heights)));
    });
}

fn bench_flat_quad(c: &mut Criterion) {
    let footprint = Extent::new(0.0, 0.0, 512.0, 512.0);

    c.bench_function("flat_quad", |b| {
        b.iter(|| TileGeometry::flat_quad(black_box(&footprint), DVec2::new(256.0, 256.0)));
    });
}

fn bench_dem_generate(c: &mut Criterion) {
    let img = GrayImage::from_fn(256, 256, |x, y| {
        image::Luma([((x ^ y) & 0xff) as u8])
    });
    let terrain = DemTerrain::from_image(
        DynamicImage::ImageLuma8(img),
        Extent::new(0.0, 0.0, 2048.0, 2048.0),
        "EPSG:32633",
        0.0,
        500.0,
        1.0,
    );

    c.bench_function("dem_generate_tile", |b| {
        b.iter(|| {
            use terralod::terrain::TerrainGenerator;
            terrain.generate(black_box(TileXYZ::new(1, 2, 2))).unwrap()
        });
    });
}

criterion_group!(
    benches,
    bench_extent_to_tile,
    bench_tile_to_extent,
    bench_heightfield_build_16,
    bench_flat_quad,
    bench_dem_generate,
);
criterion_main!(benches);
