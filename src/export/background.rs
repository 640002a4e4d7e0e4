//! Background layer configuration and image resolution

use super::color::parse_color;
use crate::error::{EngineError, Result};
use crate::surface::ImageResource;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::Rgba;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Kind of background painted under the edited cutout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundType {
    #[default]
    Transparent,
    Color,
    Gradient,
    Image,
}

/// Background selection made by the host UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BackgroundConfig {
    #[serde(rename = "type")]
    pub kind: BackgroundType,
    #[serde(default)]
    pub value: String,
}

impl BackgroundConfig {
    pub fn transparent() -> Self {
        Self::default()
    }

    pub fn color(value: impl Into<String>) -> Self {
        Self {
            kind: BackgroundType::Color,
            value: value.into(),
        }
    }

    pub fn gradient(value: impl Into<String>) -> Self {
        Self {
            kind: BackgroundType::Gradient,
            value: value.into(),
        }
    }

    pub fn image(value: impl Into<String>) -> Self {
        Self {
            kind: BackgroundType::Image,
            value: value.into(),
        }
    }
}

/// Two-stop left-to-right gradient
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradientPreset {
    pub from: Rgba<u8>,
    pub to: Rgba<u8>,
}

const GRADIENT_PRESETS: [(&str, [u8; 3], [u8; 3]); 4] = [
    ("#ff7e5f", [0xff, 0x7e, 0x5f], [0xfe, 0xb4, 0x7b]),
    ("#43e97b", [0x43, 0xe9, 0x7b], [0x38, 0xf9, 0xd7]),
    ("#00c6ff", [0x00, 0xc6, 0xff], [0x00, 0x72, 0xff]),
    ("#f83600", [0xf8, 0x36, 0x00], [0xf9, 0xd4, 0x23]),
];

/// Look up the preset whose first stop appears in `value`
pub fn gradient_preset(value: &str) -> Option<GradientPreset> {
    let lower = value.to_ascii_lowercase();
    GRADIENT_PRESETS
        .iter()
        .find(|(key, _, _)| lower.contains(key))
        .map(|(_, from, to)| GradientPreset {
            from: Rgba([from[0], from[1], from[2], 255]),
            to: Rgba([to[0], to[1], to[2], 255]),
        })
}

/// Solid fill for a colour background, `None` if the value is not a colour
pub fn solid_color(value: &str) -> Option<Rgba<u8>> {
    parse_color(value)
}

/// Turns a background image reference into an encoded image
pub trait ImageResolver: Send + Sync {
    fn resolve(&self, reference: &str) -> Result<ImageResource>;
}

/// Resolves `data:` URIs and local file paths
#[derive(Debug, Clone, Default)]
pub struct DataUriResolver {
    base_dir: Option<PathBuf>,
}

impl DataUriResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative paths against `base_dir`
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }
}

impl ImageResolver for DataUriResolver {
    fn resolve(&self, reference: &str) -> Result<ImageResource> {
        let reference = reference.trim();
        if let Some(rest) = reference.strip_prefix("data:") {
            return decode_data_uri(rest);
        }
        if reference.contains("://") {
            return Err(EngineError::InvalidResource(format!(
                "unsupported image reference: {}",
                reference
            )));
        }

        let path = match &self.base_dir {
            Some(base) => base.join(reference),
            None => PathBuf::from(reference),
        };
        let data = std::fs::read(&path)?;
        Ok(ImageResource::from_bytes(data))
    }
}

fn decode_data_uri(rest: &str) -> Result<ImageResource> {
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| EngineError::InvalidResource("data URI has no payload".into()))?;
    if !header.ends_with(";base64") {
        return Err(EngineError::InvalidResource(
            "only base64 data URIs are supported".into(),
        ));
    }
    let bytes = BASE64
        .decode(payload.trim())
        .map_err(|e| EngineError::InvalidResource(format!("base64: {}", e)))?;
    Ok(ImageResource::from_bytes(bytes))
}

/// In-memory resources keyed by reference
#[derive(Debug, Clone, Default)]
pub struct MapResolver {
    resources: HashMap<String, ImageResource>,
}

impl MapResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, reference: impl Into<String>, resource: ImageResource) {
        self.resources.insert(reference.into(), resource);
    }
}

impl ImageResolver for MapResolver {
    fn resolve(&self, reference: &str) -> Result<ImageResource> {
        self.resources
            .get(reference)
            .cloned()
            .ok_or_else(|| EngineError::InvalidResource(format!("unknown image: {}", reference)))
    }
}
