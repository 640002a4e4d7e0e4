//! Read-only original bitmap used by the restore tool
//!
//! Loads run as background tasks and write into a shared slot, so a newer
//! load may be issued while an older one is pending. Whichever finishes last
//! is what restore sees.

use super::{ChangeNotifier, ImageResource, SurfaceEvent};
use image::RgbaImage;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Default)]
pub struct OriginalSlot {
    image: Arc<RwLock<Option<Arc<RgbaImage>>>>,
}

impl OriginalSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current original, if one has finished loading
    pub fn get(&self) -> Option<Arc<RgbaImage>> {
        self.image.read().clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.image.read().is_some()
    }

    pub fn set(&self, image: RgbaImage) {
        *self.image.write() = Some(Arc::new(image));
    }

    pub fn clear(&self) {
        *self.image.write() = None;
    }

    /// Decode `resource` in the background and publish it when done.
    ///
    /// A failed decode leaves the slot as it was; restore then stays a no-op.
    pub(crate) fn spawn_load(
        &self,
        resource: ImageResource,
        notifier: ChangeNotifier,
    ) -> JoinHandle<()> {
        let slot = self.clone();
        tokio::spawn(async move {
            match resource.decode_async("original image").await {
                Ok(image) => {
                    tracing::debug!(
                        "Original image ready: {}x{}",
                        image.width(),
                        image.height()
                    );
                    slot.set(image);
                    notifier.notify(&SurfaceEvent::OriginalReady);
                }
                Err(e) => {
                    tracing::warn!("Original image unavailable, restore disabled: {}", e);
                }
            }
        })
    }
}
