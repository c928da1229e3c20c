//! MuPDF-backed redaction engine.
//!
//! Text search and the irreversible apply step use MuPDF's redaction API,
//! so marked content is physically removed from the page and cannot be
//! recovered. Image removal and the placeholder overlay are done by the
//! lopdf pass in [`postprocess`](super::postprocess) after MuPDF has saved.

use super::engine::{EngineDocument, MarkStyle, PdfEngine};
use super::postprocess::{self, Overlay, PageEdits};
use crate::domain::Rect;
use crate::error::{RedactorError, RedactorResult};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use mupdf::pdf::{PdfAnnotation, PdfAnnotationType, PdfDocument, PdfPage};
use mupdf::{Page, Rect as MuRect};
use tracing::{debug, warn};

/// MuPDF contexts are not safe to use from several threads at once (font
/// loading races), so each open document holds this lock until dropped.
static MUPDF_LOCK: Mutex<()> = Mutex::new(());

/// Default cap on search hits per keyword per page.
pub const DEFAULT_MAX_HITS: u32 = 1000;

/// Redaction engine that physically removes content using MuPDF.
#[derive(Debug, Clone)]
pub struct MupdfEngine {
    /// Maximum search hits per keyword per page
    max_hits: u32,
}

impl MupdfEngine {
    /// Creates a new engine with default settings.
    pub fn new() -> Self {
        Self {
            max_hits: DEFAULT_MAX_HITS,
        }
    }

    /// Sets the maximum number of search hits per keyword per page.
    pub fn with_max_hits(mut self, max_hits: u32) -> Self {
        self.max_hits = max_hits;
        self
    }

    pub fn max_hits(&self) -> u32 {
        self.max_hits
    }

    fn open_document(&self, path: &Path) -> RedactorResult<MupdfDocument> {
        let path_str = path.to_str().ok_or_else(|| {
            RedactorError::invalid_input("source", "Path contains invalid UTF-8")
        })?;

        let guard = MUPDF_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let doc = PdfDocument::open(path_str).map_err(|e| RedactorError::PdfProcessing {
            message: format!("Failed to open PDF '{}' with MuPDF", path.display()),
            page: None,
            source: Some(Box::new(e)),
        })?;

        Ok(MupdfDocument {
            pending: BTreeMap::new(),
            loaded: None,
            doc,
            max_hits: self.max_hits,
            edits: PageEdits::default(),
            _guard: guard,
        })
    }
}

impl Default for MupdfEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfEngine for MupdfEngine {
    fn open(&self, path: &Path) -> RedactorResult<Box<dyn EngineDocument>> {
        Ok(Box::new(self.open_document(path)?))
    }

    fn name(&self) -> &str {
        "MuPDF"
    }

    fn is_secure(&self) -> bool {
        true
    }
}

/// A Redact annotation placed on a page but not yet applied.
struct PendingMark {
    annot: PdfAnnotation,
    overlay: Overlay,
}

/// A document opened through MuPDF.
///
/// Fields drop in declaration order: annotations and pages before the
/// document, the lock last.
struct MupdfDocument {
    /// Marks created but not yet applied, by page
    pending: BTreeMap<usize, Vec<PendingMark>>,

    /// Most recently loaded page, reused across passes on the same index
    loaded: Option<(usize, Page, PdfPage)>,

    doc: PdfDocument,
    max_hits: u32,

    /// Work for the lopdf pass, recorded as pages are applied
    edits: PageEdits,

    _guard: MutexGuard<'static, ()>,
}

impl MupdfDocument {
    fn page(&mut self, index: usize) -> RedactorResult<(&Page, &mut PdfPage)> {
        if self.loaded.as_ref().map(|(i, _, _)| *i) != Some(index) {
            let number = i32::try_from(index).map_err(|_| {
                RedactorError::invalid_input("page", format!("page index {} out of range", index))
            })?;
            let page = self
                .doc
                .load_page(number)
                .map_err(|e| RedactorError::PdfProcessing {
                    message: format!("Failed to load page {}", index + 1),
                    page: Some(index + 1),
                    source: Some(Box::new(e)),
                })?;
            let pdf_page =
                PdfPage::try_from(page.clone()).map_err(|_| RedactorError::PdfProcessing {
                    message: "Page is not a PDF page".to_string(),
                    page: Some(index + 1),
                    source: None,
                })?;
            self.loaded = Some((index, page, pdf_page));
        }

        match self.loaded.as_mut() {
            Some((_, page, pdf_page)) => Ok((&*page, pdf_page)),
            None => Err(RedactorError::PdfProcessing {
                message: "Page cache empty after load".to_string(),
                page: Some(index + 1),
                source: None,
            }),
        }
    }

    /// Deletes the Redact annotations placed on `index` since its last apply.
    ///
    /// Returns how many were removed.
    fn discard_pending(&mut self, index: usize) -> RedactorResult<usize> {
        let Some(marks) = self.pending.remove(&index) else {
            return Ok(0);
        };

        let (_, pdf_page) = self.page(index)?;
        let mut removed = 0;
        for mark in &marks {
            match pdf_page.delete_annotation(&mark.annot) {
                Ok(()) => removed += 1,
                Err(e) => warn!(page = index, error = %e, "could not delete redaction annotation"),
            }
        }
        Ok(removed)
    }
}

impl EngineDocument for MupdfDocument {
    fn page_count(&self) -> RedactorResult<usize> {
        let count = self
            .doc
            .page_count()
            .map_err(|e| RedactorError::BackendError {
                backend: "MuPDF".to_string(),
                message: format!("Failed to get page count: {}", e),
                source: Some(Box::new(e)),
            })?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn search(&mut self, index: usize, needle: &str) -> RedactorResult<Vec<Rect>> {
        let max_hits = self.max_hits;
        let (page, _) = self.page(index)?;

        let hits = page
            .search(needle, max_hits)
            .map_err(|e| RedactorError::BackendError {
                backend: "MuPDF".to_string(),
                message: format!("Search failed for '{}'", needle),
                source: Some(Box::new(e)),
            })?;

        Ok(hits
            .into_iter()
            .map(|quad| Rect {
                x0: quad.ul.x.min(quad.ll.x).min(quad.ur.x).min(quad.lr.x),
                y0: quad.ul.y.min(quad.ll.y).min(quad.ur.y).min(quad.lr.y),
                x1: quad.ul.x.max(quad.ll.x).max(quad.ur.x).max(quad.lr.x),
                y1: quad.ul.y.max(quad.ll.y).max(quad.ur.y).max(quad.lr.y),
            })
            .collect())
    }

    fn add_redaction(
        &mut self,
        index: usize,
        rect: Rect,
        style: &MarkStyle,
    ) -> RedactorResult<()> {
        if rect.is_empty() {
            return Err(RedactorError::PdfProcessing {
                message: format!("Empty redaction rectangle {:?}", rect),
                page: Some(index + 1),
                source: None,
            });
        }

        let (_, pdf_page) = self.page(index)?;
        let annot = pdf_page
            .create_annotation(PdfAnnotationType::Redact)
            .map_err(|e| RedactorError::PdfProcessing {
                message: "Failed to create redaction annotation".to_string(),
                page: Some(index + 1),
                source: Some(Box::new(e)),
            })?;

        unsafe {
            ffi::set_annotation_rect(
                &annot,
                MuRect {
                    x0: rect.x0,
                    y0: rect.y0,
                    x1: rect.x1,
                    y1: rect.y1,
                },
            );
        }

        self.pending.entry(index).or_default().push(PendingMark {
            annot,
            overlay: Overlay {
                rect,
                style: style.clone(),
            },
        });
        Ok(())
    }

    fn remove_images(&mut self, index: usize) -> RedactorResult<()> {
        self.edits.strip_images(index);
        Ok(())
    }

    fn apply(&mut self, index: usize) -> RedactorResult<()> {
        if !self.pending.contains_key(&index) {
            return Ok(());
        }

        let (_, pdf_page) = self.page(index)?;
        if let Err(e) = pdf_page.redact() {
            // Unapplied marks must not reach the saved file as bare annotations
            let removed = self.discard_pending(index)?;
            debug!(page = index, removed, "discarded unapplied redaction marks");
            return Err(RedactorError::PdfProcessing {
                message: format!("Failed to apply redactions on page {}", index + 1),
                page: Some(index + 1),
                source: Some(Box::new(e)),
            });
        }

        let marks = self.pending.remove(&index).unwrap_or_default();
        debug!(page = index, marks = marks.len(), "applied redactions");
        self.edits
            .overlay(index, marks.into_iter().map(|mark| mark.overlay));
        Ok(())
    }

    fn save(&mut self, output: &Path) -> RedactorResult<()> {
        let output_str = output.to_str().ok_or_else(|| {
            RedactorError::invalid_input("output", "Path contains invalid UTF-8")
        })?;

        // Drop the cached page so all annotation edits are flushed to the document
        self.loaded = None;

        self.doc
            .save(output_str)
            .map_err(|e| RedactorError::PdfProcessing {
                message: "Failed to save redacted PDF".to_string(),
                page: None,
                source: Some(Box::new(e)),
            })?;

        if !self.edits.is_empty() {
            postprocess::finish(output, &self.edits)?;
        }
        Ok(())
    }
}

/// FFI helpers for MuPDF annotation operations.
mod ffi {
    use mupdf::pdf::PdfAnnotation;
    use mupdf::Rect;

    /// Sets the rectangle for a PDF annotation via FFI.
    ///
    /// # Safety
    /// This function uses unsafe FFI calls to access MuPDF's C API.
    /// The annotation must be valid and the context properly initialized.
    pub unsafe fn set_annotation_rect(annot: &PdfAnnotation, rect: Rect) {
        #[repr(C)]
        struct PdfAnnotRaw {
            inner: *mut mupdf_sys::pdf_annot,
        }

        let annot_raw = std::mem::transmute::<&PdfAnnotation, &PdfAnnotRaw>(annot);
        let ctx = mupdf_sys::mupdf_new_base_context();

        if !ctx.is_null() {
            let fz_rect = mupdf_sys::fz_rect {
                x0: rect.x0,
                y0: rect.y0,
                x1: rect.x1,
                y1: rect.y1,
            };

            mupdf_sys::pdf_set_annot_rect(ctx, annot_raw.inner, fz_rect);
            mupdf_sys::mupdf_drop_base_context(ctx);
        }
    }
}
