//! Brush tip generator
//!
//! A tip is a square Gray8 coverage mask of side `size`. Hardness 100 gives a
//! binary disc; lower hardness keeps the inner disc (radius * hardness / 100)
//! fully opaque and decays coverage linearly to zero at the outer radius.
//! Sampling happens at pixel centres, so the result depends only on
//! `(size, hardness)`.

use image::{GrayImage, Luma};

/// Precomputed circular coverage mask
#[derive(Debug, Clone, PartialEq)]
pub struct BrushTip {
    size: u32,
    hardness: u32,
    mask: GrayImage,
}

impl BrushTip {
    /// Render a tip for the given diameter and hardness percentage
    pub fn generate(size: u32, hardness: u32) -> Self {
        let size = size.max(1);
        let hardness = hardness.min(100);

        let radius = size as f32 / 2.0;
        let inner_radius = radius * (hardness as f32 / 100.0);

        let mask = GrayImage::from_fn(size, size, |x, y| {
            let dx = x as f32 + 0.5 - radius;
            let dy = y as f32 + 0.5 - radius;
            let dist = (dx * dx + dy * dy).sqrt();
            Luma([coverage(dist, radius, inner_radius, hardness)])
        });

        Self {
            size,
            hardness,
            mask,
        }
    }

    /// Diameter in pixels
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn hardness(&self) -> u32 {
        self.hardness
    }

    pub fn radius(&self) -> f32 {
        self.size as f32 / 2.0
    }

    /// True when this tip was generated for exactly these parameters
    pub fn matches(&self, size: u32, hardness: u32) -> bool {
        self.size == size.max(1) && self.hardness == hardness.min(100)
    }

    /// Coverage at a tip-local pixel, 0 outside the mask
    pub fn alpha(&self, x: u32, y: u32) -> u8 {
        if x < self.size && y < self.size {
            self.mask.get_pixel(x, y).0[0]
        } else {
            0
        }
    }

    pub fn mask(&self) -> &GrayImage {
        &self.mask
    }

    /// Raw row-major coverage bytes
    pub fn as_bytes(&self) -> &[u8] {
        self.mask.as_raw()
    }
}

#[inline]
fn coverage(dist: f32, radius: f32, inner_radius: f32, hardness: u32) -> u8 {
    if hardness >= 100 {
        return if dist <= radius { 255 } else { 0 };
    }
    if dist <= inner_radius {
        255
    } else if dist >= radius {
        0
    } else {
        let falloff = 1.0 - (dist - inner_radius) / (radius - inner_radius);
        (falloff * 255.0).round().clamp(0.0, 255.0) as u8
    }
}
