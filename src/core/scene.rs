//! Immutable camera-state snapshot used during LOD evaluation

use crate::core::camera::Camera;
use crate::core::types::{Mat4, Vec3};

/// Snapshot of the camera and viewport captured once per evaluation pass.
///
/// LOD decisions read only this value, never the live camera, so a camera
/// mutating mid-pass cannot produce an inconsistent split/merge decision.
#[derive(Clone, Copy, Debug)]
pub struct SceneState {
    /// Vertical field of view in radians
    pub camera_fov: f32,
    /// Camera position in local scene coordinates
    pub camera_pos: Vec3,
    /// Combined view-projection matrix
    pub view_projection: Mat4,
    /// Larger of the viewport dimensions, in device pixels
    pub screen_size_px: u32,
}

impl SceneState {
    /// Capture a snapshot from a camera and viewport size in device pixels.
    pub fn capture(camera: &Camera, viewport_width: u32, viewport_height: u32) -> Self {
        Self {
            camera_fov: camera.fov_y,
            camera_pos: camera.position,
            view_projection: camera.view_projection(),
            screen_size_px: viewport_width.max(viewport_height),
        }
    }
}
