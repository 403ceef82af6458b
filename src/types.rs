//! Identifiers and records shared by the codec and the store

use serde::{Deserialize, Serialize};

/// Unique identifier for cameras.
pub type CameraId = u32;

/// Unique identifier for images.
pub type ImageId = u32;

/// Scale assigned to every keypoint read from a two-column blob.
pub const DEFAULT_KEYPOINT_SIZE: f32 = 1.0;

/// A detected 2D feature location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    /// Keypoint scale; blobs only carry locations so this is always
    /// [`DEFAULT_KEYPOINT_SIZE`].
    pub size: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            size: DEFAULT_KEYPOINT_SIZE,
        }
    }
}

/// A row of the `images` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub image_id: ImageId,
    pub name: String,
    pub camera_id: CameraId,
}

impl std::fmt::Display for Keypoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.1})", self.x, self.y, self.size)
    }
}
