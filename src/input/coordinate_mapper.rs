use super::{CanvasPoint, PointerPosition};
use serde::{Deserialize, Serialize};

/// On-screen rectangle the buffer is currently drawn into
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl DisplayRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

/// Native pixel dimensions of the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferDims {
    pub width: u32,
    pub height: u32,
}

impl BufferDims {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Maps between display space and buffer space for one pointer event.
///
/// The display rectangle moves with zoom, fit and window resize, so a mapper
/// is built per event rather than kept around.
#[derive(Debug, Clone, Copy)]
pub struct CoordinateMapper {
    rect: DisplayRect,
    scale_x: f32,
    scale_y: f32,
}

impl CoordinateMapper {
    pub fn new(rect: DisplayRect, dims: BufferDims) -> Self {
        Self {
            rect,
            scale_x: Self::axis_scale(dims.width as f32, rect.width),
            scale_y: Self::axis_scale(dims.height as f32, rect.height),
        }
    }

    // A collapsed display axis maps everything onto 0
    fn axis_scale(buffer_len: f32, display_len: f32) -> f32 {
        if !display_len.is_finite() || display_len.abs() < f32::EPSILON {
            return 0.0;
        }
        buffer_len / display_len
    }

    /// Buffer pixels per display pixel on each axis
    pub fn scale(&self) -> (f32, f32) {
        (self.scale_x, self.scale_y)
    }

    /// Display position to buffer position. Not clamped to the buffer.
    pub fn map(&self, pointer: PointerPosition) -> CanvasPoint {
        CanvasPoint::new(
            (pointer.client_x - self.rect.left) * self.scale_x,
            (pointer.client_y - self.rect.top) * self.scale_y,
        )
    }

    /// Buffer position back to display space
    pub fn to_display_space(&self, point: CanvasPoint) -> PointerPosition {
        let inv_x = if self.scale_x > 0.0 { 1.0 / self.scale_x } else { 0.0 };
        let inv_y = if self.scale_y > 0.0 { 1.0 / self.scale_y } else { 0.0 };
        PointerPosition::new(
            self.rect.left + point.x * inv_x,
            self.rect.top + point.y * inv_y,
        )
    }

    /// On-screen diameter of a brush of `brush_size` buffer pixels
    pub fn cursor_diameter(&self, brush_size: u32) -> f32 {
        if self.scale_x > 0.0 {
            brush_size as f32 / self.scale_x
        } else {
            0.0
        }
    }
}

/// One-shot display-to-buffer mapping
pub fn to_buffer_space(
    pointer_x: f32,
    pointer_y: f32,
    rect: DisplayRect,
    dims: BufferDims,
) -> CanvasPoint {
    CoordinateMapper::new(rect, dims).map(PointerPosition::new(pointer_x, pointer_y))
}
