//! Session state: the wizard's single mutable record.
//!
//! One [`Session`] lives for the whole wizard lifetime, owned by the
//! controller and passed by reference — no process-wide singleton. It is
//! created empty at startup, populated on upload success, gains a `result`
//! on OCR success, and is cleared entirely on reset.
//!
//! The page-range editor lives here too. Two quirks are deliberate:
//! removing the last remaining range is allowed (the list may become
//! empty), and field edits are stored without any consistency
//! re-validation — ranges are only checked as a whole immediately before
//! OCR submission, and invalid values are rejected there rather than
//! corrected in place.

use crate::api::types::OcrResult;
use crate::error::WizardError;
use serde::{Deserialize, Serialize};

/// The three mutually exclusive wizard screens.
///
/// Transitions: `Upload → Preview` on upload success, `Preview → Results`
/// on OCR success, and any screen `→ Upload` on explicit reset. Failures
/// never change the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Screen {
    Upload,
    Preview,
    Results,
}

impl Screen {
    /// 1-based step number for a step-indicator UI.
    pub fn step(self) -> u8 {
        match self {
            Screen::Upload => 1,
            Screen::Preview => 2,
            Screen::Results => 3,
        }
    }
}

/// An inclusive page range, 1-based on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Wire representation: the `[start, end]` pair the backend expects.
    pub fn as_pair(self) -> [u32; 2] {
        [self.start, self.end]
    }
}

/// Which field of a range a UI edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeField {
    Start,
    End,
}

/// The uploaded document, as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub doc_id: String,
    pub filename: String,
    pub total_pages: u32,
    pub is_image: bool,
}

/// The wizard's mutable session record.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub document: Option<DocumentInfo>,
    pub ranges: Vec<PageRange>,
    pub result: Option<OcrResult>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total page count of the current document, 0 when none is loaded.
    pub fn total_pages(&self) -> u32 {
        self.document.as_ref().map_or(0, |d| d.total_pages)
    }

    /// True when the current document is a single image.
    pub fn is_image(&self) -> bool {
        self.document.as_ref().is_some_and(|d| d.is_image)
    }

    /// Install a freshly uploaded document, dropping any previous ranges
    /// and result.
    pub fn open_document(&mut self, document: DocumentInfo) {
        self.document = Some(document);
        self.ranges.clear();
        self.result = None;
    }

    /// Clear the entire record back to its initial empty state.
    pub fn clear(&mut self) {
        self.document = None;
        self.ranges.clear();
        self.result = None;
    }

    // ── Range editor ──────────────────────────────────────────────────────

    /// Append a new range.
    ///
    /// The first range spans the whole document. Subsequent ranges default
    /// to start = previous range's end + 1 (clamped to the total) and
    /// end = total, so consecutive adds naturally tile the document.
    pub fn add_range(&mut self) {
        let total = self.total_pages();
        let range = match self.ranges.last() {
            Some(prev) => PageRange::new((prev.end + 1).min(total), total),
            None => PageRange::new(1, total),
        };
        self.ranges.push(range);
    }

    /// Remove the range at `index`. Out-of-bounds indices are ignored.
    /// Removing the last remaining range is allowed — the list may become
    /// empty.
    pub fn remove_range(&mut self, index: usize) {
        if index < self.ranges.len() {
            self.ranges.remove(index);
        }
    }

    /// Store a field edit from raw UI input.
    ///
    /// Input parses as an integer; anything non-numeric (or zero) falls
    /// back to 1. No consistency re-validation happens here — an edit that
    /// makes the range invalid is caught by [`Session::validate_ranges`]
    /// at submission time, not corrected in place.
    pub fn set_range_field(&mut self, index: usize, field: RangeField, raw: &str) {
        let Some(range) = self.ranges.get_mut(index) else {
            return;
        };
        let value = raw.trim().parse::<u32>().ok().filter(|v| *v != 0).unwrap_or(1);
        match field {
            RangeField::Start => range.start = value,
            RangeField::End => range.end = value,
        }
    }

    /// Check every range against the current document, returning the first
    /// violation found (no partial submission).
    pub fn validate_ranges(&self) -> Result<(), WizardError> {
        let total = self.total_pages();
        for range in &self.ranges {
            if range.start > range.end {
                return Err(WizardError::RangeOrder {
                    start: range.start,
                    end: range.end,
                });
            }
            if range.start < 1 || range.end > total {
                return Err(WizardError::RangeOutOfBounds {
                    start: range.start,
                    end: range.end,
                    total,
                });
            }
        }
        Ok(())
    }

    /// The ordered `[start, end]` pairs submitted to the backend.
    pub fn wire_ranges(&self) -> Vec<[u32; 2]> {
        self.ranges.iter().map(|r| r.as_pair()).collect()
    }
}
