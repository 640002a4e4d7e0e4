//! Stroke interpolation - turns sparse pointer samples into dense stamp centres

use crate::input::CanvasPoint;

/// Tracks the previous stamp position of the stroke in progress
#[derive(Debug, Clone)]
pub struct StrokeInterpolator {
    spacing_ratio: f32,
    prev: Option<CanvasPoint>,
}

impl StrokeInterpolator {
    /// `spacing_ratio` is the step between stamps as a fraction of brush size
    pub fn new(spacing_ratio: f32) -> Self {
        Self {
            spacing_ratio,
            prev: None,
        }
    }

    /// Whether a stroke is currently in progress
    pub fn is_active(&self) -> bool {
        self.prev.is_some()
    }

    /// Start a stroke; the first stamp lands exactly on `point`
    pub fn begin(&mut self, point: CanvasPoint) -> Vec<CanvasPoint> {
        self.prev = Some(point);
        vec![point]
    }

    /// Continue the stroke to `point`, returning the stamp centres in order.
    ///
    /// Returns nothing when no stroke is active.
    pub fn extend(&mut self, point: CanvasPoint, brush_size: f32) -> Vec<CanvasPoint> {
        let Some(prev) = self.prev else {
            return Vec::new();
        };

        let step = brush_size * self.spacing_ratio;
        let mut stamps = if step > 0.0 && prev.distance_to(&point) > step {
            interpolate_linear(prev, point, step)
        } else {
            Vec::with_capacity(1)
        };
        stamps.push(point);

        self.prev = Some(point);
        stamps
    }

    /// Finish the stroke. Returns true if one was in progress.
    pub fn end(&mut self) -> bool {
        self.prev.take().is_some()
    }
}

/// Points from `from` toward `to` at multiples of `step`, starting at `from`
/// and stopping before reaching `to`.
pub fn interpolate_linear(from: CanvasPoint, to: CanvasPoint, step: f32) -> Vec<CanvasPoint> {
    let dist = from.distance_to(&to);
    if !step.is_finite() || step <= 0.0 || dist <= 0.0 {
        return vec![from];
    }

    let dir_x = (to.x - from.x) / dist;
    let dir_y = (to.y - from.y) / dist;
    let count = (dist / step).ceil() as usize;

    let mut result = Vec::with_capacity(count + 1);
    for i in 0..count {
        let offset = i as f32 * step;
        if offset >= dist {
            break;
        }
        result.push(CanvasPoint::new(from.x + dir_x * offset, from.y + dir_y * offset));
    }
    result
}
