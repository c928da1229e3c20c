//! Test fixtures and PDF builders.
//!
//! Provides builders for creating test PDFs with specific content,
//! following the Builder pattern for clean test setup.

use anyhow::Result;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, Stream};
use pdfredact::domain::StorageLayout;
use printpdf::*;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Builder for multi-page text PDFs.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// # use anyhow::Result;
/// # fn main() -> Result<()> {
/// let pdf = TestPdfBuilder::new()
///     .with_page(&["Quarterly report", "Nothing to hide here"])
///     .with_page(&["This page is CONFIDENTIAL and internal"])
///     .build(Path::new("/tmp/test.pdf"))?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TestPdfBuilder {
    title: String,
    pages: Vec<Vec<String>>,
    /// Free-standing text runs: page, x and baseline from the top (mm), text
    placed: Vec<(usize, f32, f32, String)>,
    page_width: Mm,
    page_height: Mm,
}

impl TestPdfBuilder {
    pub fn new() -> Self {
        Self {
            title: "Test Document".to_string(),
            pages: Vec::new(),
            placed: Vec::new(),
            page_width: Mm(215.9),  // US Letter width
            page_height: Mm(279.4), // US Letter height
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    /// Appends a page holding one text line per entry.
    pub fn with_page(mut self, lines: &[&str]) -> Self {
        self.pages
            .push(lines.iter().map(|line| line.to_string()).collect());
        self
    }

    /// Places a text run at `x_mm` with its baseline `top_mm` below the top
    /// edge of page `page`, outside the regular line flow.
    pub fn with_text_at(mut self, page: usize, x_mm: f32, top_mm: f32, text: &str) -> Self {
        self.placed.push((page, x_mm, top_mm, text.to_string()));
        self
    }

    /// Builds the PDF and writes it to the specified path.
    pub fn build(self, output_path: &Path) -> Result<PathBuf> {
        let (doc, first_page, first_layer) =
            PdfDocument::new(&self.title, self.page_width, self.page_height, "Layer 1");
        let font = doc.add_builtin_font(BuiltinFont::Helvetica)?;

        let pages = if self.pages.is_empty() {
            vec![vec![self.title.clone()]]
        } else {
            self.pages
        };

        for (index, lines) in pages.iter().enumerate() {
            let (page, layer) = if index == 0 {
                (first_page, first_layer)
            } else {
                doc.add_page(self.page_width, self.page_height, "Layer 1")
            };
            let layer = doc.get_page(page).get_layer(layer);

            // Lines are placed individually so each is its own text run
            for (row, line) in lines.iter().enumerate() {
                let y = self.page_height.0 - 30.0 - row as f32 * 10.0;
                layer.use_text(line.as_str(), 12.0, Mm(20.0), Mm(y), &font);
            }

            for (_, x, top, text) in self.placed.iter().filter(|(p, ..)| *p == index) {
                let y = self.page_height.0 - top;
                layer.use_text(text.as_str(), 12.0, Mm(*x), Mm(y), &font);
            }
        }

        doc.save(&mut BufWriter::new(fs::File::create(output_path)?))?;
        Ok(output_path.to_path_buf())
    }
}

impl Default for TestPdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Three pages with "CONFIDENTIAL" only on the second one.
pub fn create_three_page_report(path: &Path) -> Result<PathBuf> {
    TestPdfBuilder::new()
        .with_title("Quarterly Report")
        .with_page(&["Quarterly report page one", "Revenue grew this quarter"])
        .with_page(&["This section is CONFIDENTIAL and internal", "Do not share"])
        .with_page(&["Quarterly report page three", "Appendix follows"])
        .build(path)
}

/// A single-page PDF painting one image XObject plus a line of text.
pub fn create_image_pdf(path: &Path) -> Result<PathBuf> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 2,
            "Height" => 2,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
        },
        vec![0u8, 255, 255, 0],
    ));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
        "XObject" => dictionary! { "Im1" => image_id },
    });

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![100.into(), 0.into(), 0.into(), 100.into(), 72.into(), 500.into()],
            ),
            Operation::new("Do", vec!["Im1".into()]),
            Operation::new("Q", vec![]),
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 700.into()]),
            Operation::new("Tj", vec![Object::string_literal("Photo of the site ")]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc.save(path)?;
    Ok(path.to_path_buf())
}

/// A temporary uploads/outputs pair.
pub struct TestWorkspace {
    _dir: TempDir,
    pub layout: StorageLayout,
}

impl TestWorkspace {
    pub fn new() -> Result<Self> {
        let dir = TempDir::new()?;
        let layout = StorageLayout::new(dir.path().join("uploads"), dir.path().join("outputs"));
        layout.ensure_dirs()?;
        Ok(Self { _dir: dir, layout })
    }

    pub fn upload_path(&self, name: &str) -> PathBuf {
        self.layout.uploads_dir().join(name)
    }

    pub fn output_path(&self, name: &str) -> PathBuf {
        self.layout.outputs_dir().join(format!("redacted_{}", name))
    }

    /// Writes raw bytes as an uploaded file.
    pub fn upload_bytes(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.upload_path(name);
        fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Number of entries in the outputs directory.
    pub fn output_count(&self) -> usize {
        fs::read_dir(self.layout.outputs_dir())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_pattern() {
        let builder = TestPdfBuilder::new()
            .with_title("Test")
            .with_page(&["one"])
            .with_page(&["two", "lines"])
            .with_text_at(0, 5.0, 10.0, "corner");

        assert_eq!(builder.title, "Test");
        assert_eq!(builder.placed.len(), 1);
        assert_eq!(builder.pages.len(), 2);
        assert_eq!(builder.pages[1].len(), 2);
    }
}
