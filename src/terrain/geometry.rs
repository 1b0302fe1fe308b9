//! CPU-side heightfield meshes handed to the display layer

use crate::core::types::{DVec2, Vec2, Vec3};
use crate::math::Aabb;
use crate::tiling::Extent;

/// Immutable renderable geometry for one tile, in local scene coordinates.
///
/// Built on a worker task and adopted by the owning chunk as-is; nothing here
/// touches renderer state.
#[derive(Clone, Debug)]
pub struct TileGeometry {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
    pub aabb: Aabb,
}

impl TileGeometry {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Flat quad at zero elevation covering a map footprint. Used by the flat
    /// terrain variant and as fallback geometry for failed tiles.
    pub fn flat_quad(footprint: &Extent, map_origin: DVec2) -> TileGeometry {
        HeightfieldBuilder::new(1).build(footprint, map_origin, &[0.0; 4])
    }
}

/// Builds a regular-grid heightfield mesh over a map footprint.
///
/// The local frame puts x east, z south and y up: `x = map_x - origin_x`,
/// `z = -(map_y - origin_y)`, matching the renderer's right-handed frame.
/// Heights are row-major from the south-west corner, `(resolution + 1)^2`
/// samples for `resolution` quads per side.
#[derive(Clone, Copy, Debug)]
pub struct HeightfieldBuilder {
    resolution: u32,
}

impl HeightfieldBuilder {
    pub fn new(resolution: u32) -> Self {
        assert!(resolution >= 1);
        Self { resolution }
    }

    pub fn vertex_side(&self) -> u32 {
        self.resolution + 1
    }

    pub fn build(&self, footprint: &Extent, map_origin: DVec2, heights: &[f32]) -> TileGeometry {
        let side = self.vertex_side() as usize;
        assert_eq!(heights.len(), side * side);

        let res = self.resolution as f64;
        let sx = footprint.width() / res;
        let sy = footprint.height() / res;

        let mut positions = Vec::with_capacity(side * side);
        let mut normals = Vec::with_capacity(side * side);
        let mut uvs = Vec::with_capacity(side * side);

        let h = |i: usize, j: usize| heights[j * side + i];

        for j in 0..side {
            for i in 0..side {
                let map_x = footprint.xmin + i as f64 * sx;
                let map_y = footprint.ymin + j as f64 * sy;
                let x = (map_x - map_origin.x) as f32;
                let z = -((map_y - map_origin.y) as f32);
                positions.push(Vec3::new(x, h(i, j), z));

                // central differences, clamped at the grid edge
                let il = i.saturating_sub(1);
                let ir = (i + 1).min(side - 1);
                let jl = j.saturating_sub(1);
                let jr = (j + 1).min(side - 1);
                let dhdx = (h(ir, j) - h(il, j)) / ((ir - il) as f32 * sx as f32);
                let dhdy = (h(i, jr) - h(i, jl)) / ((jr - jl) as f32 * sy as f32);
                // z runs opposite to map y
                normals.push(Vec3::new(-dhdx, 1.0, dhdy).normalize());

                let u = i as f32 / self.resolution as f32;
                // texture row 0 is the tile's north edge
                let v = 1.0 - j as f32 / self.resolution as f32;
                uvs.push(Vec2::new(u, v));
            }
        }

        let mut indices = Vec::with_capacity(self.resolution as usize * self.resolution as usize * 6);
        for j in 0..self.resolution {
            for i in 0..self.resolution {
                let v00 = j * side as u32 + i;
                let v10 = v00 + 1;
                let v01 = v00 + side as u32;
                let v11 = v01 + 1;
                indices.extend_from_slice(&[v00, v10, v01, v10, v11, v01]);
            }
        }

        let mut aabb = Aabb::new(positions[0], positions[0]);
        for p in &positions[1..] {
            aabb.min = aabb.min.min(*p);
            aabb.max = aabb.max.max(*p);
        }

        TileGeometry { positions, normals, uvs, indices, aabb }
    }
}
