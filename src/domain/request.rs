//! Redaction request validation.
//!
//! [`RedactRequest`] is the raw, client-shaped request (the JSON body of
//! `POST /redact`, or the equivalent CLI flags). [`RequestValidator`] turns
//! it into a [`RedactionJob`] or fails with a descriptive error; nothing is
//! silently coerced except negative box coordinates, which clamp to zero.

use super::job::{RedactionBox, RedactionJob};
use super::page_range;
use super::storage::{sanitize_filename, StorageLayout};
use crate::error::{RedactorError, RedactorResult};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Fields every manual box must carry.
pub const BOX_FIELDS: [&str; 5] = ["page", "x0", "y0", "x1", "y1"];

/// Raw redaction request as submitted by a client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedactRequest {
    pub filename: String,

    /// Comma-separated keywords; any non-string value is rejected
    #[serde(default)]
    pub keywords: Option<Value>,

    #[serde(default)]
    pub page_range: Option<String>,

    #[serde(default, alias = "remove_images")]
    pub remove_graphics: Option<bool>,

    #[serde(default)]
    pub manual_boxes: Option<Vec<Value>>,
}

/// Validates raw requests against a storage layout.
#[derive(Debug, Clone)]
pub struct RequestValidator<'a> {
    layout: &'a StorageLayout,
    placeholder: &'a str,
}

impl<'a> RequestValidator<'a> {
    pub fn new(layout: &'a StorageLayout, placeholder: &'a str) -> Self {
        Self {
            layout,
            placeholder,
        }
    }

    /// Validates a request and builds the job it describes.
    ///
    /// All syntactic checks run before the source file is looked up, so a
    /// malformed request never touches the filesystem.
    pub fn validate(&self, request: &RedactRequest) -> RedactorResult<RedactionJob> {
        let file_name = sanitize_filename(&request.filename)?;
        let keywords = parse_keywords(request.keywords.as_ref())?;
        let manual_boxes = parse_boxes(request.manual_boxes.as_deref())?;
        let page_filter = page_range::parse(request.page_range.as_deref())?;

        let source = self.layout.uploads_dir().join(&file_name);
        if !source.is_file() {
            return Err(RedactorError::NotFound {
                what: "Source file".to_string(),
                path: source,
            });
        }

        Ok(RedactionJob {
            source,
            file_name,
            keywords,
            page_filter,
            manual_boxes,
            remove_images: request.remove_graphics.unwrap_or(false),
            placeholder_label: self.placeholder.to_string(),
        })
    }
}

/// Splits a comma-separated keyword string into search strings.
///
/// Each surviving keyword gets exactly one trailing space appended. This
/// biases engine matches toward whole words: `"CONFIDENTIAL"` does not match
/// inside `"CONFIDENTIALLY"`.
pub fn parse_keywords(raw: Option<&Value>) -> RedactorResult<Vec<String>> {
    match raw {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(text)) => Ok(text
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(|k| format!("{} ", k))
            .collect()),
        Some(_) => Err(RedactorError::invalid_input(
            "keywords",
            "Keywords must be a comma-separated string",
        )),
    }
}

fn parse_boxes(raw: Option<&[Value]>) -> RedactorResult<Vec<RedactionBox>> {
    raw.unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(index, value)| parse_box(index, value))
        .collect()
}

fn parse_box(index: usize, value: &Value) -> RedactorResult<RedactionBox> {
    let Value::Object(fields) = value else {
        return Err(RedactorError::invalid_input(
            format!("manual_boxes[{}]", index),
            "each manual box must be an object with page, x0, y0, x1, y1",
        ));
    };

    let missing: Vec<&'static str> = BOX_FIELDS
        .iter()
        .copied()
        .filter(|key| fields.get(*key).map_or(true, Value::is_null))
        .collect();
    if !missing.is_empty() {
        return Err(RedactorError::IncompleteBox { index, missing });
    }

    let page = fields
        .get("page")
        .and_then(Value::as_u64)
        .and_then(|p| usize::try_from(p).ok())
        .ok_or_else(|| {
            RedactorError::invalid_input(
                format!("manual_boxes[{}].page", index),
                "page must be a non-negative integer",
            )
        })?;

    Ok(RedactionBox::clamped(
        page,
        coordinate(fields, index, "x0")?,
        coordinate(fields, index, "y0")?,
        coordinate(fields, index, "x1")?,
        coordinate(fields, index, "y1")?,
    ))
}

fn coordinate(fields: &Map<String, Value>, index: usize, key: &str) -> RedactorResult<f32> {
    fields
        .get(key)
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite())
        .map(|v| v as f32)
        .ok_or_else(|| {
            RedactorError::invalid_input(
                format!("manual_boxes[{}].{}", index, key),
                "coordinate must be a finite number",
            )
        })
}
