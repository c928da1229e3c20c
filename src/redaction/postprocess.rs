//! lopdf pass run over the engine's saved output.
//!
//! MuPDF removes marked content, but it has no call to strip every image from
//! a page and it does not draw replacement text. Both happen here: image
//! XObjects are dropped from the page resources (along with the `Do`
//! operators that paint them), and each applied mark gets a filled rectangle
//! with the placeholder label on top.
//!
//! Every edit is page-local. Shared or inherited resource dictionaries are
//! copied onto the page before they are changed, so other pages never lose
//! resources they still use.

use super::engine::MarkStyle;
use crate::domain::Rect;
use crate::error::{RedactorError, RedactorResult};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, warn};

/// Resource name under which the overlay font is registered.
const OVERLAY_FONT: &str = "RdxHelv";

/// Parent-chain depth limit when resolving inherited page attributes.
const MAX_INHERITANCE_DEPTH: usize = 32;

/// An applied mark to draw over, in engine page space.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub rect: Rect,
    pub style: MarkStyle,
}

/// Work collected during a run, keyed by zero-based page index.
#[derive(Debug, Clone, Default)]
pub struct PageEdits {
    images: BTreeSet<usize>,
    overlays: BTreeMap<usize, Vec<Overlay>>,
}

impl PageEdits {
    pub fn strip_images(&mut self, page: usize) {
        self.images.insert(page);
    }

    pub fn overlay(&mut self, page: usize, marks: impl IntoIterator<Item = Overlay>) {
        self.overlays.entry(page).or_default().extend(marks);
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.overlays.is_empty()
    }
}

/// Loads `path`, applies `edits` and writes the document back in place.
pub fn finish(path: &Path, edits: &PageEdits) -> RedactorResult<()> {
    let mut doc = Document::load(path)?;
    apply_edits(&mut doc, edits);
    doc.prune_objects();
    doc.save(path).map_err(|e| RedactorError::BackendError {
        backend: "lopdf".to_string(),
        message: format!("Failed to write '{}': {}", path.display(), e),
        source: None,
    })?;
    Ok(())
}

/// Applies `edits` to an in-memory document.
///
/// Failures are per page: they are logged and the remaining pages still get
/// their edits.
pub fn apply_edits(doc: &mut Document, edits: &PageEdits) {
    let pages = doc.get_pages();
    let page_id = |index: usize| {
        u32::try_from(index + 1)
            .ok()
            .and_then(|number| pages.get(&number).copied())
    };

    for &index in &edits.images {
        let Some(id) = page_id(index) else {
            warn!(page = index, "image removal requested for missing page");
            continue;
        };
        match strip_images(doc, id) {
            Ok(removed) => debug!(page = index, removed, "stripped images"),
            Err(e) => warn!(page = index, error = %e, "failed to remove images"),
        }
    }

    for (&index, overlays) in &edits.overlays {
        let Some(id) = page_id(index) else {
            continue;
        };
        if let Err(e) = draw_overlays(doc, id, overlays) {
            warn!(page = index, error = %e, "failed to draw redaction labels");
        }
    }
}

/// Removes every image XObject painted directly by a page.
///
/// Returns how many XObject entries were removed. The image streams
/// themselves disappear once nothing else references them and the document
/// is pruned.
pub fn strip_images(doc: &mut Document, page_id: ObjectId) -> RedactorResult<usize> {
    localize_resources(doc, page_id)?;

    let names: Vec<Vec<u8>> = match page_resources(doc, page_id)?.get(b"XObject") {
        Ok(Object::Dictionary(xobjects)) => xobjects
            .iter()
            .filter(|(_, obj)| is_image(doc, obj))
            .map(|(name, _)| name.clone())
            .collect(),
        _ => Vec::new(),
    };
    if names.is_empty() {
        return Ok(0);
    }

    if let Ok(Object::Dictionary(xobjects)) = page_resources_mut(doc, page_id)?.get_mut(b"XObject") {
        for name in &names {
            xobjects.remove(name);
        }
    }

    let content = doc.get_and_decode_page_content(page_id)?;
    let operations = content
        .operations
        .into_iter()
        .filter(|op| !paints_any(op, &names))
        .collect();
    let encoded = Content { operations }.encode()?;
    let stream_id = add_stream(doc, encoded);
    set_page_contents(doc, page_id, Object::Reference(stream_id))?;

    Ok(names.len())
}

/// Draws a filled, labelled rectangle over each overlay.
pub fn draw_overlays(
    doc: &mut Document,
    page_id: ObjectId,
    overlays: &[Overlay],
) -> RedactorResult<()> {
    if overlays.is_empty() {
        return Ok(());
    }

    let (left, top) = page_origin(doc, page_id)?;
    let ops = overlay_operations(overlays, left, top);

    localize_resources(doc, page_id)?;
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources = page_resources_mut(doc, page_id)?;
    if !matches!(resources.get(b"Font"), Ok(Object::Dictionary(_))) {
        resources.set("Font", Dictionary::new());
    }
    if let Ok(Object::Dictionary(fonts)) = resources.get_mut(b"Font") {
        fonts.set(OVERLAY_FONT, Object::Reference(font_id));
    }

    // Wrap the existing content in q/Q so its graphics state cannot leak
    // into the overlay.
    let existing = match doc.get_dictionary(page_id)?.get(b"Contents") {
        Ok(Object::Reference(id)) => vec![Object::Reference(*id)],
        Ok(Object::Array(parts)) => parts.clone(),
        _ => Vec::new(),
    };
    let open = add_stream(doc, b"q\n".to_vec());
    let close = add_stream(doc, Content { operations: ops }.encode()?);

    let mut parts = Vec::with_capacity(existing.len() + 2);
    parts.push(Object::Reference(open));
    parts.extend(existing);
    parts.push(Object::Reference(close));
    set_page_contents(doc, page_id, Object::Array(parts))
}

/// Builds the overlay content stream, starting with the `Q` that closes the
/// wrapper opened before the original content.
fn overlay_operations(overlays: &[Overlay], left: f32, top: f32) -> Vec<Operation> {
    let mut ops = vec![Operation::new("Q", vec![])];

    for overlay in overlays {
        let rect = overlay.rect;
        let (x, y) = (left + rect.x0, top - rect.y1);
        let (w, h) = (rect.width(), rect.height());
        let [r, g, b] = overlay.style.fill;

        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new("rg", vec![r.into(), g.into(), b.into()]));
        ops.push(Operation::new(
            "re",
            vec![x.into(), y.into(), w.into(), h.into()],
        ));
        ops.push(Operation::new("f", vec![]));

        let label = overlay.style.label.as_str();
        let size = label_font_size(label, w, h);
        if size > 0.0 {
            ops.push(Operation::new("rg", vec![0.into(), 0.into(), 0.into()]));
            ops.push(Operation::new("BT", vec![]));
            ops.push(Operation::new("Tf", vec![OVERLAY_FONT.into(), size.into()]));
            ops.push(Operation::new(
                "Td",
                vec![(x + 1.0).into(), (y + (h - size) / 2.0 + size * 0.2).into()],
            ));
            ops.push(Operation::new("Tj", vec![Object::string_literal(label)]));
            ops.push(Operation::new("ET", vec![]));
        }
        ops.push(Operation::new("Q", vec![]));
    }

    ops
}

/// Font size that fits `label` into a `w` x `h` box, or 0 if it cannot be
/// drawn legibly.
fn label_font_size(label: &str, w: f32, h: f32) -> f32 {
    if label.is_empty() {
        return 0.0;
    }
    // Helvetica averages a little over half an em per glyph
    let by_width = (w - 2.0) / (label.chars().count() as f32 * 0.55);
    let size = by_width.min(h * 0.8).min(12.0);
    if size >= 3.0 {
        size
    } else {
        0.0
    }
}

fn paints_any(op: &Operation, names: &[Vec<u8>]) -> bool {
    op.operator == "Do"
        && op
            .operands
            .first()
            .and_then(|o| o.as_name().ok())
            .is_some_and(|name| names.iter().any(|n| n.as_slice() == name))
}

fn is_image(doc: &Document, obj: &Object) -> bool {
    let stream = match obj {
        Object::Reference(id) => match doc.get_object(*id) {
            Ok(Object::Stream(stream)) => stream,
            _ => return false,
        },
        Object::Stream(stream) => stream,
        _ => return false,
    };
    matches!(stream.dict.get(b"Subtype"), Ok(Object::Name(n)) if n == b"Image")
}

fn add_stream(doc: &mut Document, content: Vec<u8>) -> ObjectId {
    let mut stream = Stream::new(Dictionary::new(), content);
    if let Err(e) = stream.compress() {
        debug!(error = %e, "content stream left uncompressed");
    }
    doc.add_object(stream)
}

fn set_page_contents(doc: &mut Document, page_id: ObjectId, contents: Object) -> RedactorResult<()> {
    doc.get_object_mut(page_id)?
        .as_dict_mut()?
        .set("Contents", contents);
    Ok(())
}

/// Looks up `key` on the page or, failing that, its ancestors.
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> RedactorResult<Option<&'a Object>> {
    let mut node = page_id;
    for _ in 0..MAX_INHERITANCE_DEPTH {
        let dict = doc.get_dictionary(node)?;
        if let Ok(value) = dict.get(key) {
            return Ok(Some(value));
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent)) => node = *parent,
            _ => return Ok(None),
        }
    }
    Ok(None)
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> RedactorResult<&'a Object> {
    match obj {
        Object::Reference(id) => Ok(doc.get_object(*id)?),
        other => Ok(other),
    }
}

/// Top-left corner of the visible page area in PDF user space. Engine
/// coordinates are measured from here with y growing downwards.
fn page_origin(doc: &Document, page_id: ObjectId) -> RedactorResult<(f32, f32)> {
    let page_box = match inherited(doc, page_id, b"CropBox")? {
        Some(obj) => Some(obj),
        None => inherited(doc, page_id, b"MediaBox")?,
    };
    let Some(page_box) = page_box else {
        return Err(RedactorError::PdfProcessing {
            message: "Page has no MediaBox".to_string(),
            page: None,
            source: None,
        });
    };

    let values: Vec<f32> = resolve(doc, page_box)?
        .as_array()?
        .iter()
        .filter_map(|v| match resolve(doc, v) {
            Ok(Object::Integer(i)) => Some(*i as f32),
            Ok(Object::Real(r)) => Some(*r as f32),
            _ => None,
        })
        .collect();

    match values.as_slice() {
        [x0, y0, x1, y1] => Ok((x0.min(*x1), y0.max(*y1))),
        _ => Err(RedactorError::PdfProcessing {
            message: "Malformed page box".to_string(),
            page: None,
            source: None,
        }),
    }
}

/// Copies the page's effective resources (and its XObject and Font
/// sub-dictionaries) inline onto the page, so later edits stay page-local.
fn localize_resources(doc: &mut Document, page_id: ObjectId) -> RedactorResult<()> {
    let mut resources = match inherited(doc, page_id, b"Resources")? {
        Some(obj) => resolve(doc, obj)?.as_dict()?.clone(),
        None => Dictionary::new(),
    };

    for key in [b"XObject".as_slice(), b"Font".as_slice()] {
        let resolved = match resources.get(key) {
            Ok(Object::Reference(id)) => Some(doc.get_dictionary(*id)?.clone()),
            _ => None,
        };
        if let Some(dict) = resolved {
            resources.set(key, dict);
        }
    }

    doc.get_object_mut(page_id)?
        .as_dict_mut()?
        .set("Resources", resources);
    Ok(())
}

fn page_resources(doc: &Document, page_id: ObjectId) -> RedactorResult<&Dictionary> {
    Ok(doc.get_dictionary(page_id)?.get(b"Resources")?.as_dict()?)
}

fn page_resources_mut(doc: &mut Document, page_id: ObjectId) -> RedactorResult<&mut Dictionary> {
    Ok(doc
        .get_object_mut(page_id)?
        .as_dict_mut()?
        .get_mut(b"Resources")?
        .as_dict_mut()?)
}
