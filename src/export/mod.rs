//! Export compositor - flattens the edited cutout over a background
//!
//! Order of operations:
//! 1. allocate an output the size of the buffer
//! 2. paint the background layer (nothing, solid, gradient or cover-fit image)
//! 3. draw the buffer on top at (0, 0), unscaled
//! 4. encode; JPEG first flattens leftover transparency onto a fixed fill
//!
//! A background image that cannot be resolved or decoded is logged and
//! skipped. Only failures that prevent any output are returned as errors.

mod background;
mod color;

pub use background::{
    gradient_preset, solid_color, BackgroundConfig, BackgroundType, DataUriResolver,
    GradientPreset, ImageResolver, MapResolver,
};
pub use color::parse_color;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::surface::{ImageResource, PixelBuffer};
use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Output encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
}

impl ExportFormat {
    pub fn image_format(&self) -> ImageFormat {
        match self {
            ExportFormat::Png => ImageFormat::Png,
            ExportFormat::Jpeg => ImageFormat::Jpeg,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpeg",
        }
    }

    /// Suggested download name
    pub fn file_name(&self) -> String {
        format!("removed-bg.{}", self.extension())
    }
}

/// Background resolved and ready to paint
#[derive(Debug, Clone, PartialEq)]
pub enum BackgroundLayer {
    None,
    Solid(Rgba<u8>),
    Gradient(GradientPreset),
    Image(RgbaImage),
}

/// Paints backgrounds, composites the buffer and encodes the result
#[derive(Clone)]
pub struct ExportCompositor {
    resolver: Arc<dyn ImageResolver>,
    jpeg_background: Rgb<u8>,
}

impl Default for ExportCompositor {
    fn default() -> Self {
        Self::new(Arc::new(DataUriResolver::new()))
    }
}

impl ExportCompositor {
    pub fn new(resolver: Arc<dyn ImageResolver>) -> Self {
        Self {
            resolver,
            jpeg_background: Rgb([255, 255, 255]),
        }
    }

    /// Default resolver with the JPEG fill taken from `config`
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::default().with_jpeg_background(config.jpeg_background)
    }

    /// Fill used under transparent pixels when exporting JPEG
    pub fn with_jpeg_background(mut self, rgb: [u8; 3]) -> Self {
        self.jpeg_background = Rgb(rgb);
        self
    }

    /// Flatten `buffer` over `background` and encode it
    pub async fn export(
        &self,
        buffer: &PixelBuffer,
        background: &BackgroundConfig,
        format: ExportFormat,
    ) -> Result<ImageResource> {
        let layer = self.resolve_background(background).await;
        let composed = compose(buffer.image(), &layer);
        self.encode(composed, format).await
    }

    /// Like `export`, starting from an encoded foreground (e.g. a saved edit)
    pub async fn export_resource(
        &self,
        foreground: &ImageResource,
        background: &BackgroundConfig,
        format: ExportFormat,
    ) -> Result<ImageResource> {
        let image = foreground.decode_async("foreground image").await?;
        self.export(&PixelBuffer::new(image), background, format).await
    }

    /// Turn a background config into something paintable; never fails
    pub async fn resolve_background(&self, background: &BackgroundConfig) -> BackgroundLayer {
        match background.kind {
            BackgroundType::Transparent => BackgroundLayer::None,
            BackgroundType::Color => match solid_color(&background.value) {
                Some(color) => BackgroundLayer::Solid(color),
                None => {
                    tracing::warn!(
                        "Unrecognised background colour {:?}, painting none",
                        background.value
                    );
                    BackgroundLayer::None
                }
            },
            BackgroundType::Gradient => match gradient_preset(&background.value) {
                Some(preset) => BackgroundLayer::Gradient(preset),
                None => BackgroundLayer::Solid(Rgba([255, 255, 255, 255])),
            },
            BackgroundType::Image => {
                if background.value.trim().is_empty() {
                    return BackgroundLayer::None;
                }
                match self.load_background_image(&background.value).await {
                    Ok(image) => BackgroundLayer::Image(image),
                    Err(e) => {
                        tracing::warn!("Failed to load background image for export: {}", e);
                        BackgroundLayer::None
                    }
                }
            }
        }
    }

    async fn load_background_image(&self, reference: &str) -> Result<RgbaImage> {
        let resolver = self.resolver.clone();
        let reference = reference.to_string();
        tokio::task::spawn_blocking(move || {
            resolver
                .resolve(&reference)?
                .decode("background image")
        })
        .await
        .map_err(|e| EngineError::LoadCancelled(e.to_string()))?
    }

    async fn encode(&self, composed: RgbaImage, format: ExportFormat) -> Result<ImageResource> {
        let fill = self.jpeg_background;
        tokio::task::spawn_blocking(move || match format {
            ExportFormat::Png => ImageResource::encode(&composed, ImageFormat::Png),
            ExportFormat::Jpeg => encode_rgb(&flatten(&composed, fill), ImageFormat::Jpeg),
        })
        .await
        .map_err(|e| EngineError::LoadCancelled(e.to_string()))?
    }
}

impl std::fmt::Debug for ExportCompositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportCompositor")
            .field("jpeg_background", &self.jpeg_background)
            .finish_non_exhaustive()
    }
}

/// Background first, then the buffer unscaled at the origin
pub fn compose(foreground: &RgbaImage, background: &BackgroundLayer) -> RgbaImage {
    if matches!(background, BackgroundLayer::None) {
        return foreground.clone();
    }
    let (width, height) = foreground.dimensions();
    let mut out = RgbaImage::new(width, height);
    paint_background(&mut out, background);
    imageops::overlay(&mut out, foreground, 0, 0);
    out
}

/// Paint a background layer over the whole surface
pub fn paint_background(out: &mut RgbaImage, layer: &BackgroundLayer) {
    match layer {
        BackgroundLayer::None => {}
        BackgroundLayer::Solid(color) => {
            for pixel in out.pixels_mut() {
                *pixel = *color;
            }
        }
        BackgroundLayer::Gradient(preset) => paint_gradient(out, preset),
        BackgroundLayer::Image(image) => paint_cover(out, image),
    }
}

fn paint_gradient(out: &mut RgbaImage, preset: &GradientPreset) {
    let width = out.width().max(1) as f32;
    for (x, _, pixel) in out.enumerate_pixels_mut() {
        let t = (x as f32 + 0.5) / width;
        let mut channels = [0u8; 4];
        for (c, value) in channels.iter_mut().enumerate() {
            let from = preset.from.0[c] as f32;
            let to = preset.to.0[c] as f32;
            *value = (from + (to - from) * t).round().clamp(0.0, 255.0) as u8;
        }
        *pixel = Rgba(channels);
    }
}

/// Scale `image` to cover the surface, keep aspect ratio, centre and crop.
///
/// Only the source pixels that end up visible are resized, so a very thin
/// background never allocates its full cover-scaled size.
fn paint_cover(out: &mut RgbaImage, image: &RgbaImage) {
    let (out_w, out_h) = (out.width() as f32, out.height() as f32);
    let (img_w, img_h) = (image.width() as f32, image.height() as f32);
    if img_w == 0.0 || img_h == 0.0 || out_w == 0.0 || out_h == 0.0 {
        return;
    }

    let scale = (out_w / img_w).max(out_h / img_h);

    // Visible window in source coordinates, centred
    let visible_w = (out_w / scale).min(img_w);
    let visible_h = (out_h / scale).min(img_h);
    let src_x = (img_w - visible_w) / 2.0;
    let src_y = (img_h - visible_h) / 2.0;

    // Whole source pixels touching the window
    let x0 = src_x.floor().max(0.0);
    let y0 = src_y.floor().max(0.0);
    let x1 = (src_x + visible_w).ceil().min(img_w).max(x0 + 1.0);
    let y1 = (src_y + visible_h).ceil().min(img_h).max(y0 + 1.0);

    let cropped =
        imageops::crop_imm(image, x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32)
            .to_image();
    let scaled_w = ((x1 - x0) * scale).round().max(1.0) as u32;
    let scaled_h = ((y1 - y0) * scale).round().max(1.0) as u32;
    let dx = ((x0 - src_x) * scale).round() as i64;
    let dy = ((y0 - src_y) * scale).round() as i64;

    let scaled = if scaled_w == cropped.width() && scaled_h == cropped.height() {
        cropped
    } else {
        imageops::resize(&cropped, scaled_w, scaled_h, FilterType::Triangle)
    };
    imageops::overlay(out, &scaled, dx, dy);
}

/// Composite over an opaque fill, dropping alpha
fn flatten(image: &RgbaImage, fill: Rgb<u8>) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let src = image.get_pixel(x, y);
        let a = src.0[3] as f32 / 255.0;
        let mut rgb = [0u8; 3];
        for (c, value) in rgb.iter_mut().enumerate() {
            let v = src.0[c] as f32 * a + fill.0[c] as f32 * (1.0 - a);
            *value = v.round().clamp(0.0, 255.0) as u8;
        }
        Rgb(rgb)
    })
}

fn encode_rgb(image: &RgbImage, format: ImageFormat) -> Result<ImageResource> {
    let mut data = std::io::Cursor::new(Vec::new());
    image
        .write_to(&mut data, format)
        .map_err(|source| EngineError::Encode {
            format: crate::surface::format_name(format),
            source,
        })?;
    Ok(ImageResource::from_bytes(data.into_inner()).with_mime_type(format.to_mime_type()))
}
