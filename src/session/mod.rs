//! Edit session - explicit owner of all editing state
//!
//! A session lives from entering edit mode to save or cancel. The host feeds
//! it pointer events together with the current on-screen rectangle of the
//! buffer and redraws when the surface notifies a change.

use crate::brush::{stamp, BrushConfig, BrushTip, BrushTool, StrokeInterpolator};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::export::{BackgroundConfig, ExportCompositor, ExportFormat};
use crate::history::HistoryManager;
use crate::input::{CanvasPoint, CoordinateMapper, DisplayRect, PointerPosition, ViewportState};
use crate::surface::{
    ChangeNotifier, DirtyRect, ImageResource, OriginalSlot, PixelBuffer, RasterSurface,
    SurfaceEvent,
};
use image::ImageFormat;
use tokio::task::JoinHandle;


pub struct EditSession {
    config: EngineConfig,
    surface: RasterSurface,
    history: HistoryManager,
    brush: BrushConfig,
    tip: BrushTip,
    interpolator: StrokeInterpolator,
    viewport: ViewportState,
    stroke_dirty: Option<DirtyRect>,
}

impl EditSession {
    /// Enter edit mode with default settings
    pub async fn open(foreground: ImageResource, original: Option<ImageResource>) -> Result<Self> {
        Self::open_with_config(foreground, original, EngineConfig::default()).await
    }

    /// Decode the foreground (and original, if any) and seed history.
    ///
    /// Fails only if the foreground cannot be decoded. A broken original just
    /// leaves restore disabled.
    pub async fn open_with_config(
        foreground: ImageResource,
        original: Option<ImageResource>,
        config: EngineConfig,
    ) -> Result<Self> {
        let config = config.validate();
        let notifier = ChangeNotifier::default();
        let original_slot = OriginalSlot::new();
        let original_task =
            original.map(|resource| original_slot.spawn_load(resource, notifier.clone()));

        let image = match foreground.decode_async("foreground image").await {
            Ok(image) => image,
            Err(e) => {
                if let Some(task) = original_task {
                    task.abort();
                }
                tracing::warn!("Edit session could not start: {}", e);
                return Err(e);
            }
        };
        if let Some(task) = original_task {
            // A panicked or aborted original load only disables restore
            if let Err(e) = task.await {
                tracing::warn!("Original image load did not finish: {}", e);
            }
        }

        Ok(Self::from_parts(image, original_slot, notifier, config))
    }

    /// Build a session around an already decoded foreground
    pub fn from_image(image: image::RgbaImage, config: EngineConfig) -> Self {
        Self::from_parts(
            image,
            OriginalSlot::new(),
            ChangeNotifier::default(),
            config.validate(),
        )
    }

    fn from_parts(
        image: image::RgbaImage,
        original: OriginalSlot,
        notifier: ChangeNotifier,
        config: EngineConfig,
    ) -> Self {
        let surface = RasterSurface::from_image(image)
            .with_original_slot(original)
            .with_notifier(notifier);

        let mut history = HistoryManager::new(config.history_capacity);
        history.commit(surface.buffer());

        let brush = config.brush;
        let dims = surface.dims();
        tracing::info!(
            "Edit session opened: {}x{}, restore {}",
            dims.width,
            dims.height,
            if surface.original().is_some() {
                "available"
            } else {
                "unavailable"
            }
        );

        let session = Self {
            tip: BrushTip::generate(brush.size, brush.hardness),
            interpolator: StrokeInterpolator::new(config.spacing_ratio),
            viewport: ViewportState::from_config(&config),
            surface,
            history,
            brush,
            stroke_dirty: None,
            config,
        };
        session.surface.notifier().notify(&SurfaceEvent::Loaded {
            width: dims.width,
            height: dims.height,
        });
        session
    }

    // === Observers ===

    /// Register a callback for buffer changes.
    ///
    /// Callbacks run on the thread that changed the buffer and may subscribe
    /// further observers; those only see later events.
    pub fn subscribe(&self, observer: impl Fn(&SurfaceEvent) + Send + Sync + 'static) {
        self.surface.notifier().subscribe(observer);
    }

    /// Swap in a different original for restore; the last load to finish wins
    pub fn replace_original(&self, original: ImageResource) -> JoinHandle<()> {
        self.surface.load_original(original)
    }

    // === Brush controls ===

    pub fn brush(&self) -> &BrushConfig {
        &self.brush
    }

    pub fn tip(&self) -> &BrushTip {
        &self.tip
    }

    /// Replace the whole brush config; the tip is rebuilt if its shape changed
    pub fn set_brush(&mut self, brush: BrushConfig) {
        self.brush = brush.clamped();
        if !self.tip.matches(self.brush.size, self.brush.hardness) {
            self.tip = BrushTip::generate(self.brush.size, self.brush.hardness);
            tracing::debug!(
                "Brush tip regenerated: size {} hardness {}",
                self.brush.size,
                self.brush.hardness
            );
        }
    }

    pub fn set_brush_size(&mut self, size: u32) {
        self.set_brush(BrushConfig { size, ..self.brush });
    }

    pub fn set_hardness(&mut self, hardness: u32) {
        self.set_brush(BrushConfig {
            hardness,
            ..self.brush
        });
    }

    pub fn set_opacity(&mut self, opacity: u32) {
        self.set_brush(BrushConfig {
            opacity,
            ..self.brush
        });
    }

    pub fn set_tool(&mut self, tool: BrushTool) {
        self.set_brush(BrushConfig { tool, ..self.brush });
    }

    // === Viewport ===

    pub fn viewport(&self) -> &ViewportState {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut ViewportState {
        &mut self.viewport
    }

    /// On-screen brush cursor diameter for the current display rectangle
    pub fn cursor_diameter(&self, rect: DisplayRect) -> f32 {
        CoordinateMapper::new(rect, self.surface.dims()).cursor_diameter(self.brush.size)
    }

    // === Pointer input ===

    fn map_pointer(&self, pointer: PointerPosition, rect: DisplayRect) -> CanvasPoint {
        CoordinateMapper::new(rect, self.surface.dims()).map(pointer)
    }

    pub fn pointer_down(&mut self, pointer: PointerPosition, rect: DisplayRect) {
        let point = self.map_pointer(pointer, rect);
        self.begin_stroke(point);
    }

    pub fn pointer_move(&mut self, pointer: PointerPosition, rect: DisplayRect) {
        if !self.interpolator.is_active() {
            return;
        }
        let point = self.map_pointer(pointer, rect);
        self.extend_stroke(point);
    }

    /// Finish the stroke. Returns true if a stroke was committed.
    pub fn pointer_up(&mut self) -> bool {
        self.end_stroke()
    }

    /// Leaving the canvas ends the stroke the same way as releasing
    pub fn pointer_leave(&mut self) -> bool {
        self.end_stroke()
    }

    // === Strokes in buffer space ===

    pub fn is_stroking(&self) -> bool {
        self.interpolator.is_active()
    }

    /// Start a stroke at a buffer-space point, stamping once.
    ///
    /// A stroke already in progress is committed first.
    pub fn begin_stroke(&mut self, point: CanvasPoint) {
        if self.interpolator.is_active() {
            self.end_stroke();
        }
        if self.brush.tool == BrushTool::Restore && self.surface.original().is_none() {
            tracing::debug!("Restore requested without an original image; stroke is a no-op");
        }
        let stamps = self.interpolator.begin(point);
        self.apply_stamps(&stamps);
    }

    pub fn extend_stroke(&mut self, point: CanvasPoint) {
        let stamps = self.interpolator.extend(point, self.brush.size as f32);
        self.apply_stamps(&stamps);
    }

    /// Commit the stroke as one history entry
    pub fn end_stroke(&mut self) -> bool {
        if !self.interpolator.end() {
            return false;
        }
        self.history.commit(self.surface.buffer());
        if let Some(dirty) = self.stroke_dirty.take() {
            tracing::debug!(
                "Stroke committed, dirty {}x{} at ({}, {})",
                dirty.width,
                dirty.height,
                dirty.x,
                dirty.y
            );
        }
        true
    }

    fn apply_stamps(&mut self, stamps: &[CanvasPoint]) {
        if stamps.is_empty() {
            return;
        }
        debug_assert!(
            self.tip.matches(self.brush.size, self.brush.hardness),
            "stale brush tip"
        );

        let original = self.surface.original();
        let mut dirty: Option<DirtyRect> = None;
        for &center in stamps {
            if let Some(rect) = stamp(
                self.surface.buffer_mut(),
                &self.tip,
                center,
                &self.brush,
                original.as_deref(),
            ) {
                dirty = Some(match dirty {
                    Some(d) => d.union(&rect),
                    None => rect,
                });
            }
        }

        if let Some(dirty) = dirty {
            self.stroke_dirty = Some(match self.stroke_dirty {
                Some(d) => d.union(&dirty),
                None => dirty,
            });
            self.surface
                .notifier()
                .notify(&SurfaceEvent::Stamped { dirty });
        }
    }

    // === History ===

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Step back one stroke. An in-progress stroke is committed first.
    pub fn undo(&mut self) -> bool {
        self.end_stroke();
        match self.history.undo(self.surface.buffer_mut()) {
            Some(index) => {
                self.surface
                    .notifier()
                    .notify(&SurfaceEvent::Restored { index });
                true
            }
            None => false,
        }
    }

    /// Step forward one stroke. An in-progress stroke is committed first.
    pub fn redo(&mut self) -> bool {
        self.end_stroke();
        match self.history.redo(self.surface.buffer_mut()) {
            Some(index) => {
                self.surface
                    .notifier()
                    .notify(&SurfaceEvent::Restored { index });
                true
            }
            None => false,
        }
    }

    // === Output ===

    pub fn buffer(&self) -> &PixelBuffer {
        self.surface.buffer()
    }

    pub fn surface(&self) -> &RasterSurface {
        &self.surface
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Flatten the current buffer over a background
    pub async fn export(
        &self,
        compositor: &ExportCompositor,
        background: &BackgroundConfig,
        format: ExportFormat,
    ) -> Result<ImageResource> {
        compositor.export(self.surface.buffer(), background, format).await
    }

    /// Leave edit mode keeping the edits: the buffer re-encoded as PNG
    pub fn save(mut self) -> Result<ImageResource> {
        self.end_stroke();
        let resource = ImageResource::encode(self.surface.buffer().image(), ImageFormat::Png)?;
        tracing::info!("Edit session saved ({} bytes)", resource.len());
        Ok(resource)
    }

    /// Leave edit mode discarding the edits
    pub fn cancel(self) {
        tracing::info!(
            "Edit session cancelled, {} history entries dropped",
            self.history.len()
        );
    }
}

impl std::fmt::Debug for EditSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditSession")
            .field("dims", &self.surface.dims())
            .field("brush", &self.brush)
            .field("history_len", &self.history.len())
            .field("history_index", &self.history.index())
            .field("stroking", &self.interpolator.is_active())
            .finish()
    }
}
