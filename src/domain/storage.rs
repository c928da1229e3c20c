//! Filename sanitization and the on-disk storage layout.
//!
//! All client-supplied names pass through [`sanitize_filename`] before they
//! are joined to a storage root, so a resolved path can never escape the
//! uploads or outputs directory.

use crate::error::{RedactorError, RedactorResult};
use std::path::{Path, PathBuf};

/// Prefix given to every redacted output file.
pub const OUTPUT_PREFIX: &str = "redacted_";

/// Strips any directory components from a client-supplied file name.
///
/// Both `/` and `\` are treated as separators. The base name is kept
/// byte-for-byte; names that are blank, `.`, `..` or contain NUL after
/// stripping are rejected.
///
/// ```
/// use pdfredact::domain::sanitize_filename;
///
/// assert_eq!(sanitize_filename("../../etc/report.pdf").unwrap(), "report.pdf");
/// assert!(sanitize_filename("uploads/..").is_err());
/// ```
pub fn sanitize_filename(name: &str) -> RedactorResult<String> {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    if base.trim().is_empty() || base == "." || base == ".." || base.contains('\0') {
        return Err(RedactorError::invalid_input(
            "filename",
            format!("'{}' does not name a file", name),
        ));
    }

    Ok(base.to_string())
}

/// Name of the redacted output for a sanitized input name.
pub fn output_file_name(sanitized: &str) -> String {
    format!("{}{}", OUTPUT_PREFIX, sanitized)
}

/// Returns true if the name carries a `.pdf` extension (any case).
pub fn has_pdf_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// The two fixed directories the service reads from and writes to.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    uploads: PathBuf,
    outputs: PathBuf,
}

impl StorageLayout {
    pub fn new(uploads: impl Into<PathBuf>, outputs: impl Into<PathBuf>) -> Self {
        Self {
            uploads: uploads.into(),
            outputs: outputs.into(),
        }
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads
    }

    pub fn outputs_dir(&self) -> &Path {
        &self.outputs
    }

    /// Creates both directories if they do not exist yet.
    pub fn ensure_dirs(&self) -> RedactorResult<()> {
        for dir in [&self.uploads, &self.outputs] {
            std::fs::create_dir_all(dir).map_err(|e| RedactorError::Io {
                path: dir.clone(),
                source: e,
            })?;
        }
        Ok(())
    }

    /// Resolves a client-supplied name to its location under the uploads root.
    pub fn upload_path(&self, name: &str) -> RedactorResult<PathBuf> {
        Ok(self.uploads.join(sanitize_filename(name)?))
    }

    /// Resolves a client-supplied *input* name to its redacted output path.
    pub fn output_path(&self, name: &str) -> RedactorResult<PathBuf> {
        let sanitized = sanitize_filename(name)?;
        Ok(self.outputs.join(output_file_name(&sanitized)))
    }
}
