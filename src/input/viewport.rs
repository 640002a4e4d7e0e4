//! Viewport zoom state
//!
//! `Fit` ignores the zoom level and contains the buffer inside the viewport
//! (never enlarging past 1:1). `Custom` draws the buffer at `zoom_level`.

use super::{BufferDims, DisplayRect};
use crate::config::EngineConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScaleMode {
    #[default]
    Fit,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    zoom_level: f32,
    scale_mode: ScaleMode,
    min_zoom: f32,
    max_zoom: f32,
    zoom_step: f32,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl ViewportState {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            zoom_level: 1.0,
            scale_mode: ScaleMode::Fit,
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
            zoom_step: config.zoom_step,
        }
    }

    pub fn zoom_level(&self) -> f32 {
        self.zoom_level
    }

    pub fn scale_mode(&self) -> ScaleMode {
        self.scale_mode
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom_level + self.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom_level - self.zoom_step);
    }

    /// Switch to custom scaling at `zoom`, clamped to the allowed range
    pub fn set_zoom(&mut self, zoom: f32) {
        self.scale_mode = ScaleMode::Custom;
        if zoom.is_finite() {
            self.zoom_level = zoom.clamp(self.min_zoom, self.max_zoom);
        }
    }

    /// Back to fit-to-viewport at zoom 1
    pub fn fit(&mut self) {
        self.scale_mode = ScaleMode::Fit;
        self.zoom_level = 1.0;
    }

    /// Display scale factor applied to the buffer
    pub fn display_scale(&self, dims: BufferDims, viewport: (f32, f32)) -> f32 {
        match self.scale_mode {
            ScaleMode::Custom => self.zoom_level,
            ScaleMode::Fit => {
                if dims.width == 0 || dims.height == 0 {
                    return 1.0;
                }
                let sx = viewport.0 / dims.width as f32;
                let sy = viewport.1 / dims.height as f32;
                sx.min(sy).min(1.0).max(0.0)
            }
        }
    }

    /// Size the buffer occupies on screen
    pub fn display_size(&self, dims: BufferDims, viewport: (f32, f32)) -> (f32, f32) {
        let scale = self.display_scale(dims, viewport);
        (dims.width as f32 * scale, dims.height as f32 * scale)
    }

    /// Display rectangle of the buffer centred in a viewport at `origin`
    pub fn display_rect(
        &self,
        dims: BufferDims,
        origin: (f32, f32),
        viewport: (f32, f32),
    ) -> DisplayRect {
        let (width, height) = self.display_size(dims, viewport);
        DisplayRect::new(
            origin.0 + (viewport.0 - width) / 2.0,
            origin.1 + (viewport.1 - height) / 2.0,
            width,
            height,
        )
    }

    /// Toolbar label, e.g. "Fit" or "125%"
    pub fn label(&self) -> String {
        match self.scale_mode {
            ScaleMode::Fit => "Fit".to_string(),
            ScaleMode::Custom => format!("{}%", (self.zoom_level * 100.0).round() as i32),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_steps_and_clamps() {
        let mut viewport = ViewportState::default();
        assert_eq!(viewport.scale_mode(), ScaleMode::Fit);

        viewport.zoom_in();
        assert_eq!(viewport.scale_mode(), ScaleMode::Custom);
        assert_eq!(viewport.zoom_level(), 1.25);

        for _ in 0..20 {
            viewport.zoom_in();
        }
        assert_eq!(viewport.zoom_level(), 3.0);

        for _ in 0..20 {
            viewport.zoom_out();
        }
        assert_eq!(viewport.zoom_level(), 0.25);
    }

    #[test]
    fn test_fit_resets_zoom() {
        let mut viewport = ViewportState::default();
        viewport.zoom_out();
        viewport.fit();
        assert_eq!(viewport.scale_mode(), ScaleMode::Fit);
        assert_eq!(viewport.zoom_level(), 1.0);
        assert_eq!(viewport.label(), "Fit");
    }

    #[test]
    fn test_fit_contains_without_upscaling() {
        let viewport = ViewportState::default();
        let large = BufferDims::new(1200, 600);
        assert_eq!(viewport.display_size(large, (600.0, 600.0)), (600.0, 300.0));

        let small = BufferDims::new(100, 50);
        assert_eq!(viewport.display_size(small, (600.0, 600.0)), (100.0, 50.0));
    }

    #[test]
    fn test_custom_ignores_viewport() {
        let mut viewport = ViewportState::default();
        viewport.set_zoom(1.5);
        let dims = BufferDims::new(200, 100);
        assert_eq!(viewport.display_size(dims, (10.0, 10.0)), (300.0, 150.0));
        assert_eq!(viewport.label(), "150%");
    }

    #[test]
    fn test_display_rect_is_centred() {
        let viewport = ViewportState::default();
        let rect = viewport.display_rect(BufferDims::new(1200, 600), (10.0, 20.0), (600.0, 600.0));
        assert_eq!(rect, DisplayRect::new(10.0, 170.0, 600.0, 300.0));
    }
}
