//! The working set of captions for the current video.
//! It keeps the adjusted copy, the untouched original and the undo history.

use crate::error::SyncError;
use crate::srt::CaptionEntry;
use tracing::debug;

/// A full copy of the working timeline taken before an adjustment.
#[derive(Debug, Clone, PartialEq)]
struct Snapshot {
    entries: Vec<CaptionEntry>,
    active: Option<usize>,
}

/// Captions for one loaded file.
///
/// `current` is what the sync engine reads and what adjustments move.
/// `original` never changes after a load and is only used for reset and drift.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    current: Vec<CaptionEntry>,
    original: Vec<CaptionEntry>,
    active: Option<usize>,
    undo: Vec<Snapshot>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything with a freshly parsed file.
    /// The history is dropped and nothing is active.
    pub fn load(&mut self, entries: Vec<CaptionEntry>) {
        self.original = entries.clone();
        self.current = entries;
        self.active = None;
        self.undo.clear();
    }

    /// Forget the loaded file entirely.
    pub fn clear(&mut self) {
        self.current.clear();
        self.original.clear();
        self.active = None;
        self.undo.clear();
    }

    pub fn current(&self) -> &[CaptionEntry] {
        &self.current
    }

    pub fn original(&self) -> &[CaptionEntry] {
        &self.original
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    /// Point the active marker at `index`; out of range indices clear it.
    pub fn set_active(&mut self, index: Option<usize>) {
        self.active = index.filter(|&i| i < self.current.len());
    }

    pub fn active_entry(&self) -> Option<&CaptionEntry> {
        self.active.and_then(|i| self.current.get(i))
    }

    /// Number of adjustments that can still be undone.
    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    /// Save the working copy so the next adjustment can be undone.
    pub(crate) fn push_snapshot(&mut self) {
        self.undo.push(Snapshot {
            entries: self.current.clone(),
            active: self.active,
        });
    }

    /// Add `delta` seconds to every caption of the working copy.
    pub(crate) fn shift_all(&mut self, delta: f64) {
        for entry in &mut self.current {
            entry.shift(delta);
        }
    }

    /// How far the caption at `index` has moved from where the file put it.
    pub fn drift(&self, index: usize) -> Option<f64> {
        let current = self.current.get(index)?;
        let original = self.original.get(index)?;
        Some(current.start - original.start)
    }

    /// Restore the working copy saved before the last adjustment.
    /// The active marker is restored with it.
    pub fn undo(&mut self) -> Result<(), SyncError> {
        let snapshot = self.undo.pop().ok_or(SyncError::NothingToUndo)?;
        self.current = snapshot.entries;
        self.active = snapshot.active;
        debug!(remaining = self.undo.len(), "timeline: undo applied");
        Ok(())
    }

    /// Throw away every adjustment and go back to the parsed timings.
    /// The undo history is left as is.
    pub fn reset(&mut self) {
        self.current = self.original.clone();
        self.active = None;
    }
}
