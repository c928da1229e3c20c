//! PDF engine abstraction and supporting types.
//!
//! The executor never touches PDF internals. It drives an [`EngineDocument`]
//! obtained from a [`PdfEngine`], which lets the MuPDF backend be swapped for
//! a test double.

use crate::domain::Rect;
use crate::error::RedactorResult;
use serde::Serialize;
use std::path::Path;

/// Fill colour and label applied to every redaction mark.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkStyle {
    /// RGB components in `0.0..=1.0`
    pub fill: [f32; 3],

    /// Text drawn over the redacted region; empty draws no text
    pub label: String,
}

impl MarkStyle {
    pub fn new(fill: [f32; 3], label: impl Into<String>) -> Self {
        Self {
            fill,
            label: label.into(),
        }
    }
}

impl Default for MarkStyle {
    fn default() -> Self {
        Self::new([1.0, 1.0, 0.0], crate::domain::DEFAULT_PLACEHOLDER)
    }
}

/// Statistics about a redaction run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RedactionResult {
    /// Pages visited (after the page filter)
    pub pages_processed: usize,

    /// Pages whose apply step committed at least one change
    pub pages_modified: usize,

    /// Pages whose apply step failed and were left unredacted
    pub pages_failed: usize,

    /// Marks placed (keyword hits plus manual boxes)
    pub instances_redacted: usize,

    pub keyword_hits: usize,

    pub boxes_applied: usize,

    /// Boxes dropped for bad geometry, engine rejection or an unprocessed page
    pub boxes_skipped: usize,

    /// Pages on which image removal ran
    pub image_pages: usize,

    /// Whether content was physically removed (vs visually obscured)
    pub secure: bool,
}

impl RedactionResult {
    /// Creates a result indicating no redactions were needed.
    pub fn none() -> Self {
        Self::default()
    }

    /// Returns true if any redactions were applied.
    pub fn has_redactions(&self) -> bool {
        self.instances_redacted > 0
    }

    /// Returns true if the saved document would differ from the source.
    pub fn has_changes(&self) -> bool {
        self.has_redactions() || self.image_pages > 0
    }
}

/// A PDF backend able to open documents for redaction.
pub trait PdfEngine: Send + Sync {
    /// Opens a document. Failure is fatal for the job.
    fn open(&self, path: &Path) -> RedactorResult<Box<dyn EngineDocument>>;

    /// Returns a human-readable name for this engine.
    fn name(&self) -> &str;

    /// Returns whether this engine physically removes marked content.
    fn is_secure(&self) -> bool;
}

/// An open document. Dropping it releases every engine resource.
///
/// Page indices are zero-based and always below [`page_count`].
///
/// [`page_count`]: EngineDocument::page_count
pub trait EngineDocument {
    fn page_count(&self) -> RedactorResult<usize>;

    /// Bounding rectangles of every occurrence of `needle` on `page`.
    fn search(&mut self, page: usize, needle: &str) -> RedactorResult<Vec<Rect>>;

    /// Marks `rect` on `page` for redaction. Nothing changes until [`apply`].
    ///
    /// [`apply`]: EngineDocument::apply
    fn add_redaction(&mut self, page: usize, rect: Rect, style: &MarkStyle)
        -> RedactorResult<()>;

    /// Removes every embedded image on `page`, regardless of marks.
    fn remove_images(&mut self, page: usize) -> RedactorResult<()>;

    /// Irreversibly commits all pending marks on `page`.
    fn apply(&mut self, page: usize) -> RedactorResult<()>;

    /// Writes the whole document to `output`. Failure is fatal for the job.
    fn save(&mut self, output: &Path) -> RedactorResult<()>;
}
