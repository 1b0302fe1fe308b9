//! Terralod - a chunked-LOD terrain streaming core

pub mod core;
pub mod math;
pub mod tiling;
pub mod terrain;
pub mod texture;
pub mod chunked;
