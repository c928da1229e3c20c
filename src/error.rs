//! Error types for the PDF redaction library.
//!
//! Errors are grouped into three classes (see [`ErrorClass`]) so that callers
//! can tell "fix your input" from "this resource doesn't exist" from "the
//! server failed". Best-effort failures inside a job (one keyword, one box,
//! one page's apply step) never become a `RedactorError`; they are logged and
//! counted in the job's [`RedactionResult`](crate::RedactionResult).

use crate::domain::PageRangeError;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type alias for redaction operations.
pub type RedactorResult<T> = Result<T, RedactorError>;

/// Coarse classification used by the HTTP layer to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Client sent something unusable. Rejected before any file I/O.
    MalformedInput,
    /// A requested source or output file does not exist.
    NotFound,
    /// Opening, processing or saving a document failed.
    EngineFailure,
}

impl ErrorClass {
    /// Stable machine-readable name, used in error payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedInput => "malformed_input",
            Self::NotFound => "not_found",
            Self::EngineFailure => "engine_failure",
        }
    }
}

/// Error type for all redaction operations.
#[derive(Debug)]
pub enum RedactorError {
    /// Error occurred while reading or writing files
    Io { path: PathBuf, source: io::Error },

    /// A named resource does not exist
    NotFound { what: String, path: PathBuf },

    /// Invalid request field or parameter
    InvalidInput { parameter: String, reason: String },

    /// Page range expression could not be parsed
    PageRange(PageRangeError),

    /// A manual redaction box is missing required fields
    IncompleteBox {
        index: usize,
        missing: Vec<&'static str>,
    },

    /// Error occurred during PDF processing
    PdfProcessing {
        message: String,
        page: Option<usize>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Backend-specific error (MuPDF, lopdf, etc.)
    BackendError {
        backend: String,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl RedactorError {
    /// Shorthand for an [`RedactorError::InvalidInput`].
    pub fn invalid_input(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Returns the class this error belongs to.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidInput { .. } | Self::PageRange(_) | Self::IncompleteBox { .. } => {
                ErrorClass::MalformedInput
            }
            Self::NotFound { .. } => ErrorClass::NotFound,
            Self::Io { .. } | Self::PdfProcessing { .. } | Self::BackendError { .. } => {
                ErrorClass::EngineFailure
            }
        }
    }
}

impl fmt::Display for RedactorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "IO error for path '{}': {}", path.display(), source)
            }
            Self::NotFound { what, path } => {
                write!(f, "{} not found: '{}'", what, path.display())
            }
            Self::InvalidInput { parameter, reason } => {
                write!(f, "Invalid input for '{}': {}", parameter, reason)
            }
            Self::PageRange(err) => write!(f, "Invalid page range: {}", err),
            Self::IncompleteBox { index, missing } => {
                write!(
                    f,
                    "Manual box {} is missing required field(s): {}",
                    index,
                    missing.join(", ")
                )
            }
            Self::PdfProcessing { message, page, .. } => {
                if let Some(p) = page {
                    write!(f, "PDF processing error on page {}: {}", p, message)
                } else {
                    write!(f, "PDF processing error: {}", message)
                }
            }
            Self::BackendError {
                backend, message, ..
            } => {
                write!(f, "{} backend error: {}", backend, message)
            }
        }
    }
}

impl std::error::Error for RedactorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::PageRange(err) => Some(err),
            Self::PdfProcessing { source, .. } | Self::BackendError { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

impl From<PageRangeError> for RedactorError {
    fn from(err: PageRangeError) -> Self {
        Self::PageRange(err)
    }
}

impl From<lopdf::Error> for RedactorError {
    fn from(err: lopdf::Error) -> Self {
        Self::BackendError {
            backend: "lopdf".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}
