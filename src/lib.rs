//! Maskbrush - brush-based mask refinement for background-removed images
//!
//! Erase punches transparency into a cutout, restore paints the original
//! pixels back. Everything runs on an in-memory RGBA buffer at the image's
//! native resolution; the host UI supplies pointer events and redraws on
//! surface notifications.

pub mod brush;
pub mod config;
pub mod error;
pub mod export;
pub mod history;
pub mod input;
pub mod session;
pub mod surface;

pub use brush::{BrushConfig, BrushTip, BrushTool};
pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use export::{BackgroundConfig, BackgroundType, ExportCompositor, ExportFormat};
pub use history::HistoryManager;
pub use input::{CanvasPoint, DisplayRect, PointerPosition, ViewportState};
pub use session::EditSession;
pub use surface::{ImageResource, PixelBuffer, SurfaceEvent};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the default log subscriber.
///
/// Honours `RUST_LOG`; otherwise logs this crate at debug. Safe to call more
/// than once, later calls are ignored.
pub fn init_logging() {
    let result = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "maskbrush=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    if result.is_ok() {
        tracing::info!("Maskbrush initializing...");
    }
}
