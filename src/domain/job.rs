//! Redaction job description.

use super::page_range::PageSet;
use serde::Serialize;
use std::path::PathBuf;

/// Label drawn over every redacted region unless configured otherwise.
pub const DEFAULT_PLACEHOLDER: &str = "[---REDACTED---]";

/// Axis-aligned rectangle in page space (points, origin at the top left).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// True when the rectangle has no positive area (or a NaN corner).
    pub fn is_empty(&self) -> bool {
        !(self.x0 < self.x1 && self.y0 < self.y1)
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }
}

/// A manual redaction region drawn by the user.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RedactionBox {
    pub page: usize,
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl RedactionBox {
    /// Builds a box, clamping negative coordinates to zero.
    pub fn clamped(page: usize, x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            page,
            x0: x0.max(0.0),
            y0: y0.max(0.0),
            x1: x1.max(0.0),
            y1: y1.max(0.0),
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x0, self.y0, self.x1, self.y1)
    }
}

/// One redaction run, built fresh per request and consumed once.
#[derive(Debug, Clone)]
pub struct RedactionJob {
    /// Input document under the uploads root
    pub source: PathBuf,

    /// Sanitized base name of the input; the output is `redacted_<file_name>`
    pub file_name: String,

    /// Search strings, each already carrying its trailing space
    pub keywords: Vec<String>,

    /// Pages to process; empty means all pages
    pub page_filter: PageSet,

    pub manual_boxes: Vec<RedactionBox>,

    /// Delete every embedded image on processed pages
    pub remove_images: bool,

    pub placeholder_label: String,
}

impl RedactionJob {
    /// Manual boxes targeting `page`, in request order.
    pub fn boxes_on(&self, page: usize) -> impl Iterator<Item = &RedactionBox> {
        self.manual_boxes.iter().filter(move |b| b.page == page)
    }

    /// True when the job asks for nothing that could change the document.
    pub fn is_noop(&self) -> bool {
        self.keywords.is_empty() && self.manual_boxes.is_empty() && !self.remove_images
    }
}
