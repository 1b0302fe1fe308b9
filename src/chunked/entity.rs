//! Chunked LOD manager: split/merge decisions driven by screen-space error.
//!
//! The entity owns the quadtree and is mutated only by its owning thread.
//! Geometry and texture work runs on background tasks whose completions are
//! adopted in [`ChunkedEntity::drain_loads`]; workers never touch chunk
//! records. Each camera change calls [`ChunkedEntity::update`] with an
//! immutable scene snapshot, and the caller re-runs update while
//! [`ChunkedEntity::needs_update`] reports in-flight work.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, warn};

use crate::core::error::Error;
use crate::core::scene::SceneState;
use crate::core::types::Result;
use crate::math::{Aabb, Frustum};
use crate::terrain::{tile_aabb, TerrainGenerator, TileGeometry};
use crate::texture::{JobId, MapRenderer, TextureSettings, TileTextureGenerator};

use super::chunk::{Chunk, ChunkArena, ChunkId, ChunkState};
use super::loader::{GeometryLoader, GeometryResult, Ticket};

/// LOD behavior configuration.
///
/// The split threshold must stay above the merge threshold: the gap is the
/// hysteresis band that keeps a chunk from oscillating when its error hovers
/// at the boundary. The default 3 px / 2 px pair follows the prototype this
/// core is derived from; the exact values are tunable, the ordering is not.
#[derive(Clone, Debug)]
pub struct LodConfig {
    /// Screen-space error above which a loaded leaf splits, in pixels
    pub split_error_px: f32,
    /// Screen-space error below which a split node merges, in pixels
    pub merge_error_px: f32,
    /// Chunks at this level never split regardless of error
    pub max_level: u8,
    /// Chunks farther than this from the camera unload, in scene units
    pub max_distance: f32,
    /// Concurrent background geometry generations
    pub max_concurrent_loads: usize,
    /// Collect chunk bounding boxes for a debug overlay
    pub show_bounding_boxes: bool,
    /// Stamp tile textures with their address
    pub draw_tile_info: bool,
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            split_error_px: 3.0,
            merge_error_px: 2.0,
            max_level: 7,
            max_distance: f32::INFINITY,
            max_concurrent_loads: 4,
            show_bounding_boxes: false,
            draw_tile_info: false,
        }
    }
}

impl LodConfig {
    fn validate(&self) -> Result<()> {
        if !(self.split_error_px > self.merge_error_px) {
            return Err(Error::Config(format!(
                "split threshold ({}) must exceed merge threshold ({})",
                self.split_error_px, self.merge_error_px
            )));
        }
        if self.max_concurrent_loads == 0 {
            return Err(Error::Config("max_concurrent_loads must be positive".into()));
        }
        Ok(())
    }
}

/// How large a chunk's geometric error appears on screen, in pixels.
///
/// Perspective projection of an error of `base_error` scene units at
/// `distance` from the camera onto a viewport of `screen_size_px`.
pub fn screen_space_error(base_error: f32, distance: f32, screen_size_px: u32, fov: f32) -> f32 {
    if distance <= 0.0 {
        return f32::INFINITY;
    }
    (base_error * screen_size_px as f32) / (2.0 * distance * (fov * 0.5).tan())
}

/// Chunked LOD terrain entity: the quadtree root, its chunk arena, and the
/// background loaders feeding it.
pub struct ChunkedEntity {
    generator: Arc<dyn TerrainGenerator>,
    arena: ChunkArena,
    root: ChunkId,
    loader: GeometryLoader,
    textures: TileTextureGenerator,
    geometry_by_ticket: HashMap<Ticket, ChunkId>,
    texture_by_job: HashMap<JobId, ChunkId>,
    config: LodConfig,
    needs_update: bool,
    enabled: bool,
}

impl ChunkedEntity {
    /// Build the entity and its root chunk.
    ///
    /// Fails on configuration errors: a degenerate tiling scheme or an
    /// inverted threshold pair. Per-chunk failures later never propagate
    /// here.
    pub fn new(
        generator: Arc<dyn TerrainGenerator>,
        renderer: Arc<dyn MapRenderer>,
        texture_settings: TextureSettings,
        config: LodConfig,
    ) -> Result<Self> {
        config.validate()?;
        if generator.scheme().is_degenerate() {
            return Err(Error::DegenerateScheme);
        }

        let root_tile = generator.root_tile();
        let root_aabb = tile_aabb(generator.as_ref(), root_tile)?;
        let root_error = generator.base_error(root_tile)?;

        let mut arena = ChunkArena::new();
        let root = arena.insert(Chunk::skeleton(root_tile, root_aabb, root_error));

        let loader = GeometryLoader::new(Arc::clone(&generator), config.max_concurrent_loads);
        let textures = TileTextureGenerator::new(renderer, texture_settings);

        Ok(Self {
            generator,
            arena,
            root,
            loader,
            textures,
            geometry_by_ticket: HashMap::new(),
            texture_by_job: HashMap::new(),
            config,
            needs_update: true,
            enabled: true,
        })
    }

    pub fn root(&self) -> ChunkId {
        self.root
    }

    pub fn chunk(&self, id: ChunkId) -> Option<&Chunk> {
        self.arena.get(id)
    }

    pub fn chunk_count(&self) -> usize {
        self.arena.len()
    }

    /// True while background loads are in flight or freshly adopted results
    /// may cascade into further split/merge decisions.
    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn pending_geometry_count(&self) -> usize {
        self.geometry_by_ticket.len()
    }

    pub fn pending_texture_count(&self) -> usize {
        self.texture_by_job.len()
    }

    /// Run one LOD evaluation pass against an immutable camera snapshot.
    pub fn update(&mut self, state: &SceneState) {
        let frustum = Frustum::from_view_projection(&state.view_projection);
        self.update_node(self.root, state, &frustum);
        self.needs_update =
            !self.geometry_by_ticket.is_empty() || !self.texture_by_job.is_empty();
    }

    fn update_node(&mut self, id: ChunkId, state: &SceneState, frustum: &Frustum) {
        let Some(chunk) = self.arena.get(id) else { return };
        let aabb = chunk.aabb;
        let tile = chunk.tile;
        let chunk_state = chunk.state;
        let base_error = chunk.base_error;

        let distance = aabb.distance_to_point(state.camera_pos);
        if !frustum.intersects_aabb(&aabb) || distance > self.config.max_distance {
            self.unload_subtree(id);
            return;
        }

        let error_px =
            screen_space_error(base_error, distance, state.screen_size_px, state.camera_fov);

        match chunk_state {
            ChunkState::Skeleton => {
                self.issue_loads(id);
            }
            ChunkState::Loading => {}
            ChunkState::Loaded => {
                if error_px > self.config.split_error_px && tile.z < self.config.max_level {
                    self.split(id);
                }
            }
            ChunkState::Split => {
                if error_px < self.config.merge_error_px {
                    self.merge(id);
                } else if let Some(children) = self.arena.get(id).and_then(|c| c.children) {
                    for child in children {
                        self.update_node(child, state, frustum);
                    }
                }
            }
        }
    }

    /// Allocate four Skeleton children covering exactly the parent footprint
    /// and request their data. The parent keeps rendering as a placeholder.
    fn split(&mut self, id: ChunkId) {
        let Some(chunk) = self.arena.get(id) else { return };
        let tile = chunk.tile;
        debug!("splitting chunk {}", tile);

        let mut children = [ChunkId(usize::MAX); 4];
        for quadrant in 0..4u8 {
            let child_tile = tile.child(quadrant);
            let (child_aabb, child_error) = match (
                tile_aabb(self.generator.as_ref(), child_tile),
                self.generator.base_error(child_tile),
            ) {
                (Ok(aabb), Ok(error)) => (aabb, error),
                (Err(e), _) | (_, Err(e)) => {
                    // addresses within max_level are always in range, so this
                    // only trips on a scheme gone degenerate mid-flight
                    warn!("cannot split {}: {}", tile, e);
                    for allocated in &children[..quadrant as usize] {
                        self.arena.remove(*allocated);
                    }
                    return;
                }
            };
            children[quadrant as usize] =
                self.arena
                    .insert(Chunk::skeleton(child_tile, child_aabb, child_error));
        }

        for child in children {
            self.issue_loads(child);
        }

        if let Some(chunk) = self.arena.get_mut(id) {
            chunk.children = Some(children);
            chunk.state = ChunkState::Split;
        }
    }

    /// Tear down the children and let the parent render again.
    fn merge(&mut self, id: ChunkId) {
        let Some(chunk) = self.arena.get_mut(id) else { return };
        let Some(children) = chunk.children.take() else { return };
        debug!("merging chunk {}", chunk.tile);
        chunk.state = ChunkState::Loaded;

        for child in children {
            self.unload_subtree(child);
            self.arena.remove(child);
        }
    }

    /// Release a chunk's resources and those of its whole subtree. The chunk
    /// record itself stays allocated (reset to Skeleton); descendants are
    /// destroyed.
    fn unload_subtree(&mut self, id: ChunkId) {
        let children = self.arena.get_mut(id).and_then(|c| c.children.take());
        if let Some(children) = children {
            for child in children {
                self.unload_subtree(child);
                self.arena.remove(child);
            }
        }

        self.cancel_jobs(id);
        if let Some(chunk) = self.arena.get_mut(id) {
            chunk.geometry = None;
            chunk.texture = None;
            chunk.fallback = false;
            chunk.state = ChunkState::Skeleton;
        }
    }

    fn cancel_jobs(&mut self, id: ChunkId) {
        let Some(chunk) = self.arena.get_mut(id) else { return };
        if let Some(ticket) = chunk.pending_geometry.take() {
            self.geometry_by_ticket.remove(&ticket);
            self.loader.cancel(ticket);
        }
        if let Some(job_id) = chunk.pending_texture.take() {
            self.texture_by_job.remove(&job_id);
            if let Err(e) = self.textures.cancel_job(job_id) {
                warn!("cancel of texture job {} failed: {}", job_id, e);
            }
        }
    }

    /// Request geometry and texture for a Skeleton chunk. A chunk never has
    /// two outstanding jobs of the same kind; issuing against a non-Skeleton
    /// chunk is skipped.
    fn issue_loads(&mut self, id: ChunkId) {
        let Some(chunk) = self.arena.get(id) else { return };
        if chunk.state != ChunkState::Skeleton {
            return;
        }
        debug_assert!(chunk.pending_geometry.is_none() && chunk.pending_texture.is_none());
        let tile = chunk.tile;

        let ticket = self.loader.request(tile);
        self.geometry_by_ticket.insert(ticket, id);

        let mut pending_texture = None;
        match self.generator.scheme().tile_to_extent(tile) {
            Ok(extent) => {
                let label = self.config.draw_tile_info.then(|| tile.to_string());
                match self.textures.render(extent, label) {
                    Ok(job_id) => {
                        self.texture_by_job.insert(job_id, id);
                        pending_texture = Some(job_id);
                    }
                    Err(e) => warn!("texture request for {} failed: {}", tile, e),
                }
            }
            Err(e) => warn!("no extent for tile {}: {}", tile, e),
        }

        if let Some(chunk) = self.arena.get_mut(id) {
            chunk.state = ChunkState::Loading;
            chunk.pending_geometry = Some(ticket);
            chunk.pending_texture = pending_texture;
        }
        self.needs_update = true;
    }

    /// Adopt completed background work on the owning thread. Returns the
    /// number of results applied; stale results for since-unloaded chunks are
    /// discarded.
    pub fn drain_loads(&mut self) -> usize {
        let mut adopted = 0;

        for result in self.loader.poll_results() {
            match result {
                GeometryResult::Ready { ticket, geometry, .. } => {
                    let Some(id) = self.geometry_by_ticket.remove(&ticket) else {
                        continue;
                    };
                    if let Some(chunk) = self.arena.get_mut(id) {
                        chunk.pending_geometry = None;
                        // tighten the bound to the actual geometry
                        chunk.aabb = geometry.aabb;
                        chunk.geometry = Some(Arc::new(geometry));
                        adopted += 1;
                    }
                    self.finish_if_complete(id);
                }
                GeometryResult::Failed { ticket, tile, message } => {
                    let Some(id) = self.geometry_by_ticket.remove(&ticket) else {
                        continue;
                    };
                    warn!("geometry for {} failed ({}), using flat fallback", tile, message);
                    let fallback = self
                        .generator
                        .scheme()
                        .tile_to_extent(tile)
                        .map(|footprint| {
                            TileGeometry::flat_quad(&footprint, self.generator.scheme().map_origin)
                        });
                    if let (Some(chunk), Ok(geometry)) = (self.arena.get_mut(id), fallback) {
                        chunk.pending_geometry = None;
                        chunk.geometry = Some(Arc::new(geometry));
                        chunk.fallback = true;
                        adopted += 1;
                    }
                    self.finish_if_complete(id);
                }
            }
        }

        for texture in self.textures.poll_completed() {
            let Some(id) = self.texture_by_job.remove(&texture.job_id) else {
                continue;
            };
            if let Some(chunk) = self.arena.get_mut(id) {
                chunk.pending_texture = None;
                chunk.texture = Some(texture.image);
                adopted += 1;
            }
            self.finish_if_complete(id);
        }

        if adopted > 0 {
            self.needs_update = true;
        }
        adopted
    }

    fn finish_if_complete(&mut self, id: ChunkId) {
        if let Some(chunk) = self.arena.get_mut(id) {
            if chunk.state == ChunkState::Loading
                && chunk.geometry.is_some()
                && (chunk.texture.is_some() || chunk.pending_texture.is_none())
            {
                chunk.state = ChunkState::Loaded;
                debug!("chunk {} loaded", chunk.tile);
            }
        }
    }

    /// The active cut of the quadtree to hand to the display layer. A split
    /// parent renders as a placeholder until all four children are satisfied,
    /// then disappears in favor of the children.
    pub fn renderable_set(&self) -> Vec<ChunkId> {
        let mut out = Vec::new();
        self.collect_renderable(self.root, &mut out);
        out
    }

    fn collect_renderable(&self, id: ChunkId, out: &mut Vec<ChunkId>) {
        let Some(chunk) = self.arena.get(id) else { return };
        match chunk.state {
            ChunkState::Loaded => out.push(id),
            ChunkState::Split => {
                if self.subtree_satisfied(id) {
                    if let Some(children) = chunk.children {
                        for child in children {
                            self.collect_renderable(child, out);
                        }
                    }
                } else if chunk.is_renderable() {
                    out.push(id);
                }
            }
            ChunkState::Skeleton | ChunkState::Loading => {}
        }
    }

    fn subtree_satisfied(&self, id: ChunkId) -> bool {
        let Some(chunk) = self.arena.get(id) else { return false };
        match chunk.state {
            ChunkState::Loaded => true,
            ChunkState::Split => chunk
                .children
                .map(|children| children.iter().all(|c| self.subtree_satisfied(*c)))
                .unwrap_or(false),
            _ => false,
        }
    }

    /// Bounding boxes of live chunks for the debug overlay. Empty unless
    /// enabled in the config; never part of LOD decisions.
    pub fn bounding_boxes(&self) -> Vec<Aabb> {
        if !self.config.show_bounding_boxes {
            return Vec::new();
        }
        self.arena.iter().map(|(_, chunk)| chunk.aabb).collect()
    }
}
