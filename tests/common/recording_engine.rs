//! An in-memory engine double.
//!
//! Every call the executor makes is appended to a shared log so tests can
//! assert on ordering and arguments. Failures can be injected per page.

use pdfredact::domain::Rect;
use pdfredact::{EngineDocument, MarkStyle, PdfEngine, RedactorError, RedactorResult};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Bytes written by [`RecordingDocument::save`].
pub const FAKE_PDF_BYTES: &[u8] = b"%PDF-1.7\n% redacted by recording engine\n%%EOF\n";

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Search { page: usize, needle: String },
    Mark { page: usize, rect: Rect, label: String },
    RemoveImages { page: usize },
    Apply { page: usize },
    Save,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingEngine {
    pub pages: usize,
    /// Hits returned by `search`, keyed by (page, needle)
    pub hits: HashMap<(usize, String), Vec<Rect>>,
    pub fail_open: bool,
    pub fail_search_on: HashSet<usize>,
    pub fail_apply_on: HashSet<usize>,
    pub fail_save: bool,
    pub calls: Arc<Mutex<Vec<Call>>>,
}

impl RecordingEngine {
    pub fn with_pages(pages: usize) -> Self {
        Self {
            pages,
            ..Default::default()
        }
    }

    pub fn with_hit(mut self, page: usize, needle: &str, rect: Rect) -> Self {
        self.hits
            .entry((page, needle.to_string()))
            .or_default()
            .push(rect);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn marks(&self) -> Vec<(usize, Rect)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Mark { page, rect, .. } => Some((page, rect)),
                _ => None,
            })
            .collect()
    }

    pub fn searched_pages(&self) -> Vec<usize> {
        let mut pages: Vec<usize> = self
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Search { page, .. } => Some(page),
                _ => None,
            })
            .collect();
        pages.dedup();
        pages
    }
}

impl PdfEngine for RecordingEngine {
    fn open(&self, path: &Path) -> RedactorResult<Box<dyn EngineDocument>> {
        if self.fail_open {
            return Err(RedactorError::PdfProcessing {
                message: format!("cannot open '{}'", path.display()),
                page: None,
                source: None,
            });
        }
        Ok(Box::new(RecordingDocument {
            engine: self.clone(),
        }))
    }

    fn name(&self) -> &str {
        "Recording"
    }

    fn is_secure(&self) -> bool {
        true
    }
}

pub struct RecordingDocument {
    engine: RecordingEngine,
}

impl RecordingDocument {
    fn record(&self, call: Call) {
        self.engine.calls.lock().unwrap().push(call);
    }

    fn failure(page: usize, what: &str) -> RedactorError {
        RedactorError::PdfProcessing {
            message: format!("injected {} failure", what),
            page: Some(page),
            source: None,
        }
    }
}

impl EngineDocument for RecordingDocument {
    fn page_count(&self) -> RedactorResult<usize> {
        Ok(self.engine.pages)
    }

    fn search(&mut self, page: usize, needle: &str) -> RedactorResult<Vec<Rect>> {
        self.record(Call::Search {
            page,
            needle: needle.to_string(),
        });
        if self.engine.fail_search_on.contains(&page) {
            return Err(Self::failure(page, "search"));
        }
        Ok(self
            .engine
            .hits
            .get(&(page, needle.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    fn add_redaction(&mut self, page: usize, rect: Rect, style: &MarkStyle) -> RedactorResult<()> {
        self.record(Call::Mark {
            page,
            rect,
            label: style.label.clone(),
        });
        Ok(())
    }

    fn remove_images(&mut self, page: usize) -> RedactorResult<()> {
        self.record(Call::RemoveImages { page });
        Ok(())
    }

    fn apply(&mut self, page: usize) -> RedactorResult<()> {
        self.record(Call::Apply { page });
        if self.engine.fail_apply_on.contains(&page) {
            return Err(Self::failure(page, "apply"));
        }
        Ok(())
    }

    fn save(&mut self, output: &Path) -> RedactorResult<()> {
        self.record(Call::Save);
        if self.engine.fail_save {
            return Err(RedactorError::BackendError {
                backend: "Recording".to_string(),
                message: "injected save failure".to_string(),
                source: None,
            });
        }
        std::fs::write(output, FAKE_PDF_BYTES).map_err(|e| RedactorError::Io {
            path: output.to_path_buf(),
            source: e,
        })
    }
}
