//! Raster surface - the editable pixel buffer and the original image
//!
//! The buffer is sized once, from the foreground's natural dimensions, when
//! the surface is loaded. There is no resize; a different foreground needs a
//! fresh surface.

mod original;
mod resource;

pub use original::OriginalSlot;
pub use resource::ImageResource;
pub(crate) use resource::format_name;

use crate::error::Result;
use crate::input::BufferDims;
use image::{Rgba, RgbaImage};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Editable RGBA bitmap at native resolution
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    image: RgbaImage,
}

impl PixelBuffer {
    pub fn new(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dims(&self) -> BufferDims {
        BufferDims::new(self.image.width(), self.image.height())
    }

    pub fn pixel(&self, x: u32, y: u32) -> &Rgba<u8> {
        self.image.get_pixel(x, y)
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub(crate) fn image_mut(&mut self) -> &mut RgbaImage {
        &mut self.image
    }

    /// Raw row-major RGBA bytes
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Overwrite every pixel from raw RGBA bytes of the same size.
    ///
    /// Returns false (and leaves the buffer alone) on a length mismatch.
    pub(crate) fn overwrite_raw(&mut self, raw: &[u8]) -> bool {
        let dst: &mut [u8] = &mut self.image;
        if dst.len() != raw.len() {
            return false;
        }
        dst.copy_from_slice(raw);
        true
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

/// Rectangle of buffer pixels touched by an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl DirtyRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Smallest rectangle covering both
    pub fn union(&self, other: &DirtyRect) -> DirtyRect {
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = (self.x + self.width).max(other.x + other.width);
        let y1 = (self.y + self.height).max(other.y + other.height);
        DirtyRect::new(x0, y0, x1 - x0, y1 - y0)
    }
}

/// Notifications the host UI redraws on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// Buffer decoded and ready
    Loaded { width: u32, height: u32 },
    /// A stamp changed pixels inside `dirty`
    Stamped { dirty: DirtyRect },
    /// The whole buffer was replaced from history snapshot `index`
    Restored { index: usize },
    /// The original image for restore finished loading
    OriginalReady,
}

type Observer = Arc<dyn Fn(&SurfaceEvent) + Send + Sync>;

/// Fan-out of surface events to subscribed observers.
///
/// Observers run synchronously inside `notify`, outside the list lock, so a
/// callback may itself subscribe or query the notifier.
#[derive(Clone, Default)]
pub struct ChangeNotifier {
    observers: Arc<Mutex<Vec<Observer>>>,
}

impl ChangeNotifier {
    pub fn subscribe(&self, observer: impl Fn(&SurfaceEvent) + Send + Sync + 'static) {
        self.observers.lock().push(Arc::new(observer));
    }

    pub fn notify(&self, event: &SurfaceEvent) {
        let observers: Vec<Observer> = self.observers.lock().clone();
        for observer in observers {
            observer(event);
        }
    }

    pub fn observer_count(&self) -> usize {
        self.observers.lock().len()
    }
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("observers", &self.observer_count())
            .finish()
    }
}

/// Owns the editable buffer and the original-image slot for one session
#[derive(Debug)]
pub struct RasterSurface {
    buffer: PixelBuffer,
    original: OriginalSlot,
    notifier: ChangeNotifier,
}

impl RasterSurface {
    /// Decode the foreground into a new buffer at its natural size
    pub async fn load(foreground: &ImageResource) -> Result<Self> {
        let image = foreground.decode_async("foreground image").await?;
        Ok(Self::from_image(image))
    }

    pub fn from_image(image: RgbaImage) -> Self {
        tracing::debug!("Raster surface created: {}x{}", image.width(), image.height());
        Self {
            buffer: PixelBuffer::new(image),
            original: OriginalSlot::new(),
            notifier: ChangeNotifier::default(),
        }
    }

    /// Share an existing original slot (so a load started earlier lands here)
    pub fn with_original_slot(mut self, original: OriginalSlot) -> Self {
        self.original = original;
        self
    }

    /// Share an existing notifier with whoever already holds it
    pub fn with_notifier(mut self, notifier: ChangeNotifier) -> Self {
        self.notifier = notifier;
        self
    }

    /// Start decoding the original image for restore
    pub fn load_original(&self, original: ImageResource) -> JoinHandle<()> {
        self.original.spawn_load(original, self.notifier.clone())
    }

    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    pub(crate) fn buffer_mut(&mut self) -> &mut PixelBuffer {
        &mut self.buffer
    }

    pub fn dims(&self) -> BufferDims {
        self.buffer.dims()
    }

    pub fn original(&self) -> Option<Arc<RgbaImage>> {
        self.original.get()
    }

    pub fn original_slot(&self) -> &OriginalSlot {
        &self.original
    }

    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    pub fn into_buffer(self) -> PixelBuffer {
        self.buffer
    }
}
