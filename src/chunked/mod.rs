//! Chunked LOD quadtree: chunk arena, async geometry loading, LOD manager

pub mod chunk;
pub mod loader;
pub mod entity;

pub use chunk::{Chunk, ChunkArena, ChunkId, ChunkState};
pub use loader::{GeometryLoader, GeometryResult, Ticket};
pub use entity::{ChunkedEntity, LodConfig, screen_space_error};
