//! PDF redaction service with secure content removal.
//!
//! Users upload a PDF, name keywords and/or draw rectangles to redact, and
//! download a sanitized copy in which the marked regions are physically
//! removed (not just covered). Content removal is done by MuPDF's redaction
//! API; this crate provides page-range parsing, request validation, the
//! per-page executor and an HTTP API around them.
//!
//! # Architecture
//!
//! - [`domain`]: page ranges, filename sanitization, request validation
//! - [`redaction`]: engine abstraction, MuPDF backend, executor and service
//! - [`api`]: axum router for upload/redact/download
//! - [`config`]: server configuration
//! - [`error`]: error types and their classification
//!
//! # Quick Start
//!
//! ```no_run
//! use pdfredact::domain::{RedactRequest, RequestValidator, StorageLayout, DEFAULT_PLACEHOLDER};
//! use pdfredact::RedactionService;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let layout = StorageLayout::new("uploads", "outputs");
//! let request = RedactRequest {
//!     filename: "contract.pdf".to_string(),
//!     keywords: Some("CONFIDENTIAL, Acme Corp".into()),
//!     page_range: Some("1-3".to_string()),
//!     ..Default::default()
//! };
//!
//! let job = RequestValidator::new(&layout, DEFAULT_PLACEHOLDER).validate(&request)?;
//! let outcome = RedactionService::with_mupdf(layout.outputs_dir()).execute(job)?;
//! println!("{} regions redacted", outcome.result.instances_redacted);
//! # Ok(())
//! # }
//! ```
//!
//! # Page ranges
//!
//! ```
//! use pdfredact::domain::PageSet;
//!
//! let pages: PageSet = "1-3,5".parse().unwrap();
//! assert_eq!(pages.to_vec(), vec![0, 1, 2, 4]);
//! ```

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod redaction;

pub use config::ServerConfig;
pub use domain::{PageSet, RedactRequest, RedactionBox, RedactionJob, RequestValidator};
pub use error::{ErrorClass, RedactorError, RedactorResult};
pub use redaction::{
    extract_text_from_pdf, EngineDocument, MarkStyle, MupdfEngine, PdfEngine, RedactionOutcome,
    RedactionResult, RedactionService,
};
