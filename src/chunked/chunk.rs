//! Quadtree chunk records stored in an arena.
//!
//! Parent->child ownership would make a web of references; instead chunks
//! live in an arena and refer to each other by [`ChunkId`]. A parent stores
//! its four child ids and children need no back-pointer. The `Removed` state
//! of the lifecycle is represented by removal from the arena.

use std::sync::Arc;

use image::RgbaImage;

use crate::math::Aabb;
use crate::terrain::TileGeometry;
use crate::texture::JobId;
use crate::tiling::TileXYZ;

use super::loader::Ticket;

/// Stable handle to a chunk in the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChunkId(pub(crate) usize);

/// Chunk lifecycle: Skeleton -> Loading -> Loaded -> Split, merging back to
/// Loaded when children are no longer needed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkState {
    /// Address allocated, nothing requested yet
    Skeleton,
    /// Geometry and texture requested, not all arrived
    Loading,
    /// Renderable
    Loaded,
    /// Four children allocated; renderable only as a placeholder until the
    /// children are satisfied
    Split,
}

/// One quadtree node: tile address, bounding volume, load state, and at most
/// one outstanding job of each kind.
pub struct Chunk {
    pub tile: TileXYZ,
    pub aabb: Aabb,
    pub state: ChunkState,
    pub children: Option<[ChunkId; 4]>,
    /// Base geometric error in map units, from the terrain generator
    pub base_error: f32,
    pub geometry: Option<Arc<TileGeometry>>,
    pub texture: Option<RgbaImage>,
    /// Geometry is a flat stand-in after a transient data failure
    pub fallback: bool,
    pub pending_geometry: Option<Ticket>,
    pub pending_texture: Option<JobId>,
}

impl Chunk {
    pub fn skeleton(tile: TileXYZ, aabb: Aabb, base_error: f32) -> Self {
        Self {
            tile,
            aabb,
            state: ChunkState::Skeleton,
            children: None,
            base_error,
            geometry: None,
            texture: None,
            fallback: false,
            pending_geometry: None,
            pending_texture: None,
        }
    }

    pub fn is_renderable(&self) -> bool {
        self.geometry.is_some() && self.texture.is_some()
    }
}

/// Slab-style arena of chunks with a free list.
#[derive(Default)]
pub struct ChunkArena {
    slots: Vec<Option<Chunk>>,
    free: Vec<usize>,
}

impl ChunkArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, chunk: Chunk) -> ChunkId {
        match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(chunk);
                ChunkId(index)
            }
            None => {
                self.slots.push(Some(chunk));
                ChunkId(self.slots.len() - 1)
            }
        }
    }

    pub fn remove(&mut self, id: ChunkId) -> Option<Chunk> {
        let chunk = self.slots.get_mut(id.0)?.take();
        if chunk.is_some() {
            self.free.push(id.0);
        }
        chunk
    }

    pub fn get(&self, id: ChunkId) -> Option<&Chunk> {
        self.slots.get(id.0)?.as_ref()
    }

    pub fn get_mut(&mut self, id: ChunkId) -> Option<&mut Chunk> {
        self.slots.get_mut(id.0)?.as_mut()
    }

    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChunkId, &Chunk)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|c| (ChunkId(i), c)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn test_chunk(z: u8) -> Chunk {
        Chunk::skeleton(
            TileXYZ::new(0, 0, z),
            Aabb::new(Vec3::ZERO, Vec3::ONE),
            1.0,
        )
    }

    #[test]
    fn test_insert_get_remove() {
        let mut arena = ChunkArena::new();
        let a = arena.insert(test_chunk(0));
        let b = arena.insert(test_chunk(1));
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(a).unwrap().tile.z, 0);
        assert_eq!(arena.get(b).unwrap().tile.z, 1);

        let removed = arena.remove(a).unwrap();
        assert_eq!(removed.tile.z, 0);
        assert!(arena.get(a).is_none());
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_slots_are_reused() {
        let mut arena = ChunkArena::new();
        let a = arena.insert(test_chunk(0));
        arena.remove(a);
        let b = arena.insert(test_chunk(5));
        // same slot index reused
        assert_eq!(a.0, b.0);
        assert_eq!(arena.get(b).unwrap().tile.z, 5);
    }

    #[test]
    fn test_double_remove_is_none() {
        let mut arena = ChunkArena::new();
        let a = arena.insert(test_chunk(0));
        assert!(arena.remove(a).is_some());
        assert!(arena.remove(a).is_none());
        assert_eq!(arena.len(), 0);
    }

    #[test]
    fn test_iter_skips_freed_slots() {
        let mut arena = ChunkArena::new();
        let a = arena.insert(test_chunk(0));
        let _b = arena.insert(test_chunk(1));
        arena.remove(a);
        let tiles: Vec<u8> = arena.iter().map(|(_, c)| c.tile.z).collect();
        assert_eq!(tiles, vec![1]);
    }
}
