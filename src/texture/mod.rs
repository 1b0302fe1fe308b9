//! Asynchronous map tile texture rendering

pub mod settings;
pub mod renderer;
pub mod annotate;
pub mod generator;

pub use settings::TextureSettings;
pub use renderer::{MapRenderer, SolidRenderer};
pub use generator::{JobId, TileTexture, TileTextureGenerator};
