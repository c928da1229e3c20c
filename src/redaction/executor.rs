//! Per-page redaction state machine.
//!
//! Each requested page goes through four passes: keywords, manual boxes,
//! images, apply. Every unit inside a pass is best-effort. A failed search,
//! a rejected box or a page whose apply step fails is logged and skipped, and
//! the rest of the job carries on. Only [`EngineDocument::page_count`]
//! failing aborts the run here; open and save failures are handled by the
//! caller.

use super::engine::{EngineDocument, MarkStyle, RedactionResult};
use crate::domain::RedactionJob;
use crate::error::RedactorResult;
use tracing::{debug, warn};

/// Runs every pass of `job` against an open document.
pub fn redact_pages(
    doc: &mut dyn EngineDocument,
    job: &RedactionJob,
    style: &MarkStyle,
) -> RedactorResult<RedactionResult> {
    let page_count = doc.page_count()?;
    let mut result = RedactionResult::none();

    for page in job.page_filter.iter() {
        if page < 0 || page >= page_count as i64 {
            warn!(
                page = page + 1,
                page_count, "requested page does not exist in document, ignoring"
            );
        }
    }

    for (index, b) in job.manual_boxes.iter().enumerate() {
        if b.page >= page_count || !job.page_filter.includes(b.page) {
            warn!(box_index = index, page = b.page, "manual box targets a page that is not processed, skipping");
            result.boxes_skipped += 1;
        }
    }

    for page in 0..page_count {
        if !job.page_filter.includes(page) {
            continue;
        }
        debug!(page, "processing page");
        result.pages_processed += 1;

        let marks = keyword_pass(doc, job, page, style, &mut result)
            + box_pass(doc, job, page, style, &mut result);

        let images_removed = job.remove_images && image_pass(doc, page);
        if images_removed {
            result.image_pages += 1;
        }

        match doc.apply(page) {
            Ok(()) => {
                result.instances_redacted += marks;
                if marks > 0 || images_removed {
                    result.pages_modified += 1;
                }
            }
            Err(e) => {
                warn!(page, error = %e, "failed to apply redactions, page left unchanged");
                result.pages_failed += 1;
            }
        }
    }

    Ok(result)
}

fn keyword_pass(
    doc: &mut dyn EngineDocument,
    job: &RedactionJob,
    page: usize,
    style: &MarkStyle,
    result: &mut RedactionResult,
) -> usize {
    let mut marks = 0;

    for keyword in &job.keywords {
        let hits = match doc.search(page, keyword) {
            Ok(hits) => hits,
            Err(e) => {
                warn!(page, keyword = %keyword, error = %e, "keyword search failed, skipping");
                continue;
            }
        };

        for rect in hits {
            match doc.add_redaction(page, rect, style) {
                Ok(()) => {
                    marks += 1;
                    result.keyword_hits += 1;
                }
                Err(e) => warn!(page, keyword = %keyword, error = %e, "could not mark keyword hit"),
            }
        }
    }

    marks
}

fn box_pass(
    doc: &mut dyn EngineDocument,
    job: &RedactionJob,
    page: usize,
    style: &MarkStyle,
    result: &mut RedactionResult,
) -> usize {
    let mut marks = 0;

    for b in job.boxes_on(page) {
        let rect = b.rect();
        if rect.is_empty() {
            warn!(page, ?rect, "invalid box geometry, skipping");
            result.boxes_skipped += 1;
            continue;
        }

        match doc.add_redaction(page, rect, style) {
            Ok(()) => {
                marks += 1;
                result.boxes_applied += 1;
            }
            Err(e) => {
                warn!(page, ?rect, error = %e, "engine rejected box, skipping");
                result.boxes_skipped += 1;
            }
        }
    }

    marks
}

fn image_pass(doc: &mut dyn EngineDocument, page: usize) -> bool {
    match doc.remove_images(page) {
        Ok(()) => true,
        Err(e) => {
            warn!(page, error = %e, "failed to remove images");
            false
        }
    }
}
