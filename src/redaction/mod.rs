//! Redaction engine, executor and service layer.
//!
//! [`RedactionService`] owns a [`PdfEngine`] and the outputs directory. It
//! opens the job's source, runs the per-page passes from [`executor`], and
//! persists the result to `<outputs>/redacted_<name>`.

pub mod engine;
pub mod executor;
pub mod mupdf;
pub mod postprocess;

pub use engine::{EngineDocument, MarkStyle, PdfEngine, RedactionResult};
pub use mupdf::MupdfEngine;

use crate::domain::{output_file_name, RedactionJob};
use crate::error::{RedactorError, RedactorResult};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

/// What a finished job produced.
#[derive(Debug, Clone)]
pub struct RedactionOutcome {
    /// Path of the redacted document
    pub output: PathBuf,

    pub result: RedactionResult,
}

impl RedactionOutcome {
    /// File name of the output, as exposed for download.
    pub fn output_name(&self) -> String {
        self.output
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Redaction service coordinating engine execution.
pub struct RedactionService {
    engine: Box<dyn PdfEngine>,
    outputs: PathBuf,
    style: MarkStyle,
}

impl RedactionService {
    /// Creates a new service writing into `outputs`.
    pub fn new(engine: Box<dyn PdfEngine>, outputs: impl Into<PathBuf>, style: MarkStyle) -> Self {
        Self {
            engine,
            outputs: outputs.into(),
            style,
        }
    }

    /// Creates a service backed by MuPDF with the default mark style.
    pub fn with_mupdf(outputs: impl Into<PathBuf>) -> Self {
        Self::new(Box::new(MupdfEngine::new()), outputs, MarkStyle::default())
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    pub fn outputs_dir(&self) -> &Path {
        &self.outputs
    }

    /// Executes a validated job, consuming it.
    ///
    /// The source is never modified. The output is staged in the outputs
    /// directory and renamed into place, so a failed run leaves no file
    /// behind and concurrent runs on the same name are last-writer-wins.
    pub fn execute(&self, job: RedactionJob) -> RedactorResult<RedactionOutcome> {
        let mut doc = self.engine.open(&job.source)?;

        let style = MarkStyle {
            label: job.placeholder_label.clone(),
            ..self.style.clone()
        };
        let mut result = executor::redact_pages(doc.as_mut(), &job, &style)?;
        result.secure = self.engine.is_secure();

        std::fs::create_dir_all(&self.outputs).map_err(|e| RedactorError::Io {
            path: self.outputs.clone(),
            source: e,
        })?;
        let output = self.outputs.join(output_file_name(&job.file_name));
        let staged = NamedTempFile::new_in(&self.outputs).map_err(|e| RedactorError::Io {
            path: self.outputs.clone(),
            source: e,
        })?;

        if result.has_changes() {
            doc.save(staged.path())?;
        } else {
            std::fs::copy(&job.source, staged.path()).map_err(|e| RedactorError::Io {
                path: staged.path().to_path_buf(),
                source: e,
            })?;
        }
        drop(doc);

        staged.persist(&output).map_err(|e| RedactorError::Io {
            path: output.clone(),
            source: e.error,
        })?;

        info!(
            source = %job.source.display(),
            output = %output.display(),
            pages = result.pages_processed,
            redacted = result.instances_redacted,
            failed_pages = result.pages_failed,
            "redaction complete"
        );

        Ok(RedactionOutcome { output, result })
    }
}

/// Extracts the text of a PDF, for verification and debugging.
pub fn extract_text_from_pdf(input: &Path) -> RedactorResult<String> {
    let bytes = std::fs::read(input).map_err(|e| RedactorError::Io {
        path: input.to_path_buf(),
        source: e,
    })?;

    pdf_extract::extract_text_from_mem(&bytes).map_err(|e| RedactorError::BackendError {
        backend: "pdf-extract".to_string(),
        message: format!("text extraction failed for '{}': {}", input.display(), e),
        source: None,
    })
}
