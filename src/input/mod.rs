//! Input module - pointer positions, display-to-buffer mapping and viewport zoom

mod coordinate_mapper;
mod viewport;

pub use coordinate_mapper::{to_buffer_space, BufferDims, CoordinateMapper, DisplayRect};
pub use viewport::{ScaleMode, ViewportState};

use serde::{Deserialize, Serialize};

/// Pointer position in display (client) space, as delivered by the host UI
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerPosition {
    pub client_x: f32,
    pub client_y: f32,
}

impl PointerPosition {
    pub fn new(client_x: f32, client_y: f32) -> Self {
        Self { client_x, client_y }
    }

    /// First touch point of a multi-touch event; extra fingers are ignored
    pub fn from_touches(touches: &[PointerPosition]) -> Option<Self> {
        touches.first().copied()
    }
}

/// A position in buffer (native pixel) space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasPoint {
    pub x: f32,
    pub y: f32,
}

impl CanvasPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Self) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}
