//! Brush module - tip synthesis, stroke interpolation and stamp compositing

mod blend;
mod interpolation;
mod tip;

pub use blend::{stamp, BlendStrategy, EraseBlend, RestoreBlend};
pub use interpolation::{interpolate_linear, StrokeInterpolator};
pub use tip::BrushTip;

use serde::{Deserialize, Serialize};

/// Smallest brush diameter in pixels
pub const MIN_BRUSH_SIZE: u32 = 5;
/// Largest brush diameter in pixels
pub const MAX_BRUSH_SIZE: u32 = 100;
/// Lowest opacity percentage; zero would make every stamp a no-op
pub const MIN_OPACITY: u32 = 1;

/// Which compositing mode a stamp uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BrushTool {
    /// Punch transparency into the buffer
    #[default]
    Erase,
    /// Bring back pixels from the original image
    Restore,
}

/// User-controlled brush state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrushConfig {
    /// Diameter in buffer pixels (5 - 100)
    pub size: u32,
    /// Edge hardness percentage (0 - 100)
    pub hardness: u32,
    /// Stamp opacity percentage (1 - 100)
    pub opacity: u32,
    /// Active tool
    pub tool: BrushTool,
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            size: 20,
            hardness: 100,
            opacity: 100,
            tool: BrushTool::Erase,
        }
    }
}

impl BrushConfig {
    /// Copy of this config with every field forced into its valid range
    pub fn clamped(self) -> Self {
        Self {
            size: self.size.clamp(MIN_BRUSH_SIZE, MAX_BRUSH_SIZE),
            hardness: self.hardness.min(100),
            opacity: self.opacity.clamp(MIN_OPACITY, 100),
            tool: self.tool,
        }
    }

    /// Opacity as a 0.0 - 1.0 factor
    pub fn opacity_factor(&self) -> f32 {
        self.opacity as f32 / 100.0
    }

    /// Distance between interpolated stamps for this brush
    pub fn spacing(&self, spacing_ratio: f32) -> f32 {
        self.size as f32 * spacing_ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brush_config_defaults() {
        let config = BrushConfig::default();
        assert_eq!(config.size, 20);
        assert_eq!(config.hardness, 100);
        assert_eq!(config.opacity, 100);
        assert_eq!(config.tool, BrushTool::Erase);
    }

    #[test]
    fn test_brush_config_clamping() {
        let config = BrushConfig {
            size: 1,
            hardness: 250,
            opacity: 0,
            tool: BrushTool::Restore,
        }
        .clamped();
        assert_eq!(config.size, MIN_BRUSH_SIZE);
        assert_eq!(config.hardness, 100);
        assert_eq!(config.opacity, MIN_OPACITY);

        let config = BrushConfig {
            size: 400,
            ..Default::default()
        }
        .clamped();
        assert_eq!(config.size, MAX_BRUSH_SIZE);
    }

    #[test]
    fn test_spacing_scales_with_size() {
        let small = BrushConfig {
            size: 10,
            ..Default::default()
        };
        let large = BrushConfig {
            size: 100,
            ..Default::default()
        };
        assert!((small.spacing(0.1) - 1.0).abs() < 1e-6);
        assert!((large.spacing(0.1) - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_tool_serde_names() {
        let json = serde_json::to_string(&BrushTool::Restore).unwrap();
        assert_eq!(json, "\"restore\"");
        let tool: BrushTool = serde_json::from_str("\"erase\"").unwrap();
        assert_eq!(tool, BrushTool::Erase);
    }
}
