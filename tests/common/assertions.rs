//! Custom assertions for PDF redaction testing.
//!
//! Text checks go through the MuPDF engine's own search, so "redacted" means
//! exactly what the redaction pass would have matched.

use pdfredact::{MupdfEngine, PdfEngine};
use std::path::Path;

/// Number of MuPDF search hits for `needle` on a zero-indexed page.
pub fn search_hits(pdf_path: &Path, page: usize, needle: &str) -> usize {
    // The document holds the engine lock until it is dropped at scope end
    let mut doc = MupdfEngine::new()
        .open(pdf_path)
        .unwrap_or_else(|e| panic!("failed to open '{}': {}", pdf_path.display(), e));
    doc.search(page, needle)
        .unwrap_or_else(|e| panic!("search failed on page {}: {}", page, e))
        .len()
}

/// Asserts that `needle` no longer matches on `page`.
///
/// # Panics
/// Panics if the needle is still found.
pub fn assert_redacted_on(pdf_path: &Path, page: usize, needle: &str) {
    let hits = search_hits(pdf_path, page, needle);
    assert_eq!(
        hits,
        0,
        "'{}' should be redacted on page {} of '{}' but matched {} time(s)",
        needle,
        page + 1,
        pdf_path.display(),
        hits
    );
}

/// Asserts that `needle` still matches on `page`.
///
/// # Panics
/// Panics if the needle is not found.
pub fn assert_preserved_on(pdf_path: &Path, page: usize, needle: &str) {
    assert!(
        search_hits(pdf_path, page, needle) > 0,
        "'{}' should be preserved on page {} of '{}'",
        needle,
        page + 1,
        pdf_path.display()
    );
}

/// Page count as seen by lopdf.
pub fn page_count(pdf_path: &Path) -> usize {
    lopdf::Document::load(pdf_path)
        .unwrap_or_else(|e| panic!("'{}' is not a loadable PDF: {}", pdf_path.display(), e))
        .get_pages()
        .len()
}

/// Asserts that no object in the document is an image XObject.
///
/// # Panics
/// Panics if any image stream survives.
pub fn assert_no_images(pdf_path: &Path) {
    let doc = lopdf::Document::load(pdf_path).expect("output should load");
    let images = doc
        .objects
        .values()
        .filter(|object| {
            object
                .as_stream()
                .ok()
                .and_then(|s| s.dict.get(b"Subtype").ok())
                .and_then(|s| s.as_name().ok())
                == Some(b"Image".as_slice())
        })
        .count();
    assert_eq!(images, 0, "'{}' still contains {} image(s)", pdf_path.display(), images);
}
