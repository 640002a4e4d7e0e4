//! Snapshot history - bounded undo/redo over full-frame buffer copies
//!
//! Each snapshot is a complete copy of the buffer, LZ4 compressed at rest.
//! The cursor always points at the snapshot that matches the buffer outside
//! of an uncommitted stroke.

use crate::surface::PixelBuffer;
use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use std::collections::VecDeque;

/// Default number of snapshots kept
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// Immutable full-frame copy of the buffer
#[derive(Debug, Clone)]
pub struct HistorySnapshot {
    /// LZ4 compressed RGBA (with prepended size)
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl HistorySnapshot {
    pub fn capture(buffer: &PixelBuffer) -> Self {
        Self {
            data: compress_prepend_size(buffer.as_raw()),
            width: buffer.width(),
            height: buffer.height(),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Compressed size in bytes
    pub fn stored_size(&self) -> usize {
        self.data.len()
    }

    /// Decompressed RGBA bytes
    pub fn pixels(&self) -> Option<Vec<u8>> {
        match decompress_size_prepended(&self.data) {
            Ok(pixels) => Some(pixels),
            Err(e) => {
                tracing::error!("Corrupt history snapshot: {}", e);
                None
            }
        }
    }

    /// Whether this snapshot holds exactly the buffer's current pixels
    pub fn matches(&self, buffer: &PixelBuffer) -> bool {
        self.dimensions() == (buffer.width(), buffer.height())
            && self.pixels().as_deref() == Some(buffer.as_raw())
    }

    fn restore_into(&self, buffer: &mut PixelBuffer) -> bool {
        if self.dimensions() != (buffer.width(), buffer.height()) {
            tracing::warn!(
                "Snapshot {}x{} does not fit buffer {}x{}",
                self.width,
                self.height,
                buffer.width(),
                buffer.height()
            );
            return false;
        }
        match self.pixels() {
            Some(pixels) => buffer.overwrite_raw(&pixels),
            None => false,
        }
    }
}

/// Ordered snapshots plus a cursor
#[derive(Debug, Clone)]
pub struct HistoryManager {
    snapshots: VecDeque<HistorySnapshot>,
    index: usize,
    capacity: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryManager {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            snapshots: VecDeque::with_capacity(capacity),
            index: 0,
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Cursor position, `None` before the first commit
    pub fn index(&self) -> Option<usize> {
        if self.snapshots.is_empty() {
            None
        } else {
            Some(self.index)
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.snapshots.is_empty() && self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        !self.snapshots.is_empty() && self.index + 1 < self.snapshots.len()
    }

    pub fn snapshot(&self, index: usize) -> Option<&HistorySnapshot> {
        self.snapshots.get(index)
    }

    /// Snapshot under the cursor
    pub fn current(&self) -> Option<&HistorySnapshot> {
        self.index().and_then(|i| self.snapshots.get(i))
    }

    /// Record the buffer as the newest state, dropping any redo branch
    pub fn commit(&mut self, buffer: &PixelBuffer) {
        if !self.snapshots.is_empty() {
            self.snapshots.truncate(self.index + 1);
        }
        self.snapshots.push_back(HistorySnapshot::capture(buffer));

        while self.snapshots.len() > self.capacity {
            self.snapshots.pop_front();
        }
        self.index = self.snapshots.len() - 1;

        tracing::debug!(
            "History commit: {} snapshot(s), index {}",
            self.snapshots.len(),
            self.index
        );
    }

    /// Step back one snapshot and write it into `buffer`.
    ///
    /// Returns the new index, or `None` when already at the oldest state.
    pub fn undo(&mut self, buffer: &mut PixelBuffer) -> Option<usize> {
        if !self.can_undo() {
            return None;
        }
        self.move_to(self.index - 1, buffer)
    }

    /// Step forward one snapshot and write it into `buffer`.
    ///
    /// Returns the new index, or `None` when already at the newest state.
    pub fn redo(&mut self, buffer: &mut PixelBuffer) -> Option<usize> {
        if !self.can_redo() {
            return None;
        }
        self.move_to(self.index + 1, buffer)
    }

    fn move_to(&mut self, target: usize, buffer: &mut PixelBuffer) -> Option<usize> {
        let snapshot = self.snapshots.get(target)?;
        if !snapshot.restore_into(buffer) {
            return None;
        }
        self.index = target;
        tracing::debug!("History moved to index {}", target);
        Some(target)
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.index = 0;
    }

    /// Total compressed bytes held
    pub fn memory_size(&self) -> usize {
        self.snapshots.iter().map(HistorySnapshot::stored_size).sum()
    }
}
