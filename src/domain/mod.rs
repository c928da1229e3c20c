//! Domain models and request handling.
//!
//! This module holds the parts of the service that know nothing about PDFs:
//! page range parsing, filename sanitization, the storage layout, and the
//! validation that turns a raw request into a [`RedactionJob`].

pub mod job;
pub mod page_range;
pub mod request;
pub mod storage;

pub use job::{Rect, RedactionBox, RedactionJob, DEFAULT_PLACEHOLDER};
pub use page_range::{PageRangeError, PageSet};
pub use request::{RedactRequest, RequestValidator};
pub use storage::{output_file_name, sanitize_filename, StorageLayout};
