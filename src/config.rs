//! Engine tunables
//!
//! Defaults reproduce the interactive editor's behaviour. A host may override
//! them from JSON; every field is optional.

use crate::brush::BrushConfig;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Engine-wide configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Maximum number of snapshots kept by the history manager
    pub history_capacity: usize,
    /// Stamp spacing as a fraction of brush size
    pub spacing_ratio: f32,
    /// Lowest custom zoom level
    pub min_zoom: f32,
    /// Highest custom zoom level
    pub max_zoom: f32,
    /// Zoom increment for zoom in/out
    pub zoom_step: f32,
    /// RGB fill used to flatten transparency when exporting JPEG
    pub jpeg_background: [u8; 3],
    /// Brush state applied when a session opens
    pub brush: BrushConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_capacity: 20,
            spacing_ratio: 0.1,
            min_zoom: 0.25,
            max_zoom: 3.0,
            zoom_step: 0.25,
            jpeg_background: [255, 255, 255],
            brush: BrushConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a JSON document, then clamp it into a usable range
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        Ok(config.validate())
    }

    /// Read and parse a JSON config file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        tracing::debug!("Loading engine config from {:?}", path);
        Self::from_json_str(&json)
    }

    /// Clamp values that would break the engine's invariants
    pub fn validate(mut self) -> Self {
        let defaults = Self::default();

        if self.history_capacity == 0 {
            tracing::warn!("history_capacity must be at least 1, using default");
            self.history_capacity = defaults.history_capacity;
        }
        if !(self.spacing_ratio.is_finite() && self.spacing_ratio > 0.0) {
            tracing::warn!("spacing_ratio {} is invalid, using default", self.spacing_ratio);
            self.spacing_ratio = defaults.spacing_ratio;
        }
        if !(self.min_zoom.is_finite() && self.min_zoom > 0.0) {
            self.min_zoom = defaults.min_zoom;
        }
        if !(self.max_zoom.is_finite() && self.max_zoom >= self.min_zoom) {
            tracing::warn!(
                "zoom range {}..{} is invalid, using default",
                self.min_zoom,
                self.max_zoom
            );
            self.min_zoom = defaults.min_zoom;
            self.max_zoom = defaults.max_zoom;
        }
        if !(self.zoom_step.is_finite() && self.zoom_step > 0.0) {
            self.zoom_step = defaults.zoom_step;
        }
        self.brush = self.brush.clamped();

        self
    }
}
