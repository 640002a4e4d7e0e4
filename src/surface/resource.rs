//! Encoded image payloads crossing the engine boundary

use crate::error::{EngineError, Result};
use image::{ImageFormat, RgbaImage};
use std::path::Path;
use std::sync::Arc;

/// An encoded image (PNG, JPEG, ...) plus an optional MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResource {
    data: Arc<[u8]>,
    mime_type: Option<&'static str>,
}

impl ImageResource {
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        let data: Vec<u8> = data.into();
        Self {
            data: data.into(),
            mime_type: None,
        }
    }

    pub fn with_mime_type(mut self, mime_type: &'static str) -> Self {
        self.mime_type = Some(mime_type);
        self
    }

    /// Read a resource from disk
    pub async fn from_path(path: &Path) -> Result<Self> {
        let data = tokio::fs::read(path).await?;
        let mime_type = ImageFormat::from_path(path)
            .ok()
            .map(|format| format.to_mime_type());
        Ok(Self {
            data: data.into(),
            mime_type,
        })
    }

    /// Encode an RGBA bitmap
    pub fn encode(image: &RgbaImage, format: ImageFormat) -> Result<Self> {
        let mut data = std::io::Cursor::new(Vec::new());
        image
            .write_to(&mut data, format)
            .map_err(|source| EngineError::Encode {
                format: format_name(format),
                source,
            })?;
        Ok(Self::from_bytes(data.into_inner()).with_mime_type(format.to_mime_type()))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// MIME type if known, otherwise sniffed from the payload
    pub fn mime_type(&self) -> Option<&'static str> {
        self.mime_type.or_else(|| {
            image::guess_format(&self.data)
                .ok()
                .map(|format| format.to_mime_type())
        })
    }

    /// Decode into an RGBA bitmap at natural size
    pub fn decode(&self, what: &'static str) -> Result<RgbaImage> {
        if self.data.is_empty() {
            return Err(EngineError::EmptyResource);
        }
        let image = image::load_from_memory(&self.data)
            .map_err(|source| EngineError::Decode { what, source })?;
        Ok(image.to_rgba8())
    }

    /// Decode on the blocking pool so the caller's task is not stalled
    pub async fn decode_async(&self, what: &'static str) -> Result<RgbaImage> {
        let resource = self.clone();
        tokio::task::spawn_blocking(move || resource.decode(what))
            .await
            .map_err(|e| EngineError::LoadCancelled(e.to_string()))?
    }
}

pub(crate) fn format_name(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "png",
        ImageFormat::Jpeg => "jpeg",
        ImageFormat::WebP => "webp",
        _ => "image",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_png_encode_decode_preserves_alpha() {
        let mut image = RgbaImage::from_pixel(4, 3, Rgba([10, 20, 30, 255]));
        image.put_pixel(1, 1, Rgba([0, 0, 0, 0]));

        let resource = ImageResource::encode(&image, ImageFormat::Png).unwrap();
        assert_eq!(resource.mime_type(), Some("image/png"));

        let decoded = resource.decode("test").unwrap();
        assert_eq!(decoded, image);
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let resource = ImageResource::from_bytes(b"definitely not an image".to_vec());
        assert!(matches!(
            resource.decode("foreground"),
            Err(EngineError::Decode { what: "foreground", .. })
        ));
    }

    #[test]
    fn test_empty_resource() {
        let resource = ImageResource::from_bytes(Vec::new());
        assert!(resource.is_empty());
        assert!(matches!(resource.decode("x"), Err(EngineError::EmptyResource)));
    }

    #[tokio::test]
    async fn test_decode_async() {
        let image = RgbaImage::from_pixel(8, 8, Rgba([1, 2, 3, 4]));
        let resource = ImageResource::encode(&image, ImageFormat::Png).unwrap();
        let decoded = resource.decode_async("test").await.unwrap();
        assert_eq!(decoded.dimensions(), (8, 8));
    }
}
