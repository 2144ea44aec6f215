//! Text extraction: read the plain text of a result document.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which keeps
//! thread-local state and is not safe to call from async contexts.
//! [`extract_text_blocking`] moves each document onto Tokio's blocking pool
//! so the workers driving other documents never stall on pdfium.
//!
//! The pipeline only needs "the text of a file", so the backend sits behind
//! [`TextExtractor`]. Tests plug in an in-memory extractor; production uses
//! [`PdfiumTextExtractor`].

use crate::error::{DocumentError, TgnError};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Source of plain text for a document file.
///
/// Implementations are called from the blocking pool, possibly for several
/// documents at once.
pub trait TextExtractor: Send + Sync {
    /// Best-effort text of the whole document, pages in order.
    fn extract_text(&self, path: &Path) -> Result<String, DocumentError>;
}

/// Extracts text with pdfium, one bind per document.
#[derive(Debug, Clone)]
pub struct PdfiumTextExtractor {
    lib_dir: Option<PathBuf>,
}

impl PdfiumTextExtractor {
    /// Create an extractor, checking once that pdfium can be bound.
    ///
    /// `lib_dir` is the directory holding the platform library
    /// (`libpdfium.so`, `libpdfium.dylib` or `pdfium.dll`); `None` uses the
    /// system loader.
    pub fn new(lib_dir: Option<PathBuf>) -> Result<Self, TgnError> {
        let extractor = Self { lib_dir };
        extractor
            .bind()
            .map_err(|e| TgnError::PdfiumBindingFailed(format!("{:?}", e)))?;
        info!("pdfium bound ({})", extractor.library_label());
        Ok(extractor)
    }

    fn library_label(&self) -> String {
        match &self.lib_dir {
            Some(dir) => Pdfium::pdfium_platform_library_name_at_path(dir)
                .display()
                .to_string(),
            None => "system library".to_string(),
        }
    }

    fn bind(&self) -> Result<Pdfium, PdfiumError> {
        let bindings = match &self.lib_dir {
            Some(dir) => {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))?
            }
            None => Pdfium::bind_to_system_library()?,
        };
        Ok(Pdfium::new(bindings))
    }
}

impl TextExtractor for PdfiumTextExtractor {
    fn extract_text(&self, path: &Path) -> Result<String, DocumentError> {
        let pdfium = self.bind().map_err(|e| DocumentError::DocumentRead {
            detail: format!("pdfium bind: {:?}", e),
        })?;

        let document =
            pdfium
                .load_pdf_from_file(path, None)
                .map_err(|e| DocumentError::DocumentRead {
                    detail: format!("{:?}", e),
                })?;

        let mut pages_text = Vec::new();
        for (idx, page) in document.pages().iter().enumerate() {
            let text = page.text().map_err(|e| DocumentError::DocumentRead {
                detail: format!("page {}: {:?}", idx + 1, e),
            })?;
            pages_text.push(text.all());
        }

        debug!(
            "Extracted {} pages of text from {}",
            pages_text.len(),
            path.display()
        );

        // Page breaks become line breaks so the last line of one page never
        // fuses with the first line of the next.
        Ok(pages_text.join("\n"))
    }
}

/// Run `extractor` for one file on the blocking pool.
///
/// A panicking extractor is reported as [`DocumentError::DocumentRead`]
/// for that document only.
pub async fn extract_text_blocking(
    extractor: Arc<dyn TextExtractor>,
    path: PathBuf,
) -> Result<String, DocumentError> {
    tokio::task::spawn_blocking(move || extractor.extract_text(&path))
        .await
        .map_err(|e| DocumentError::DocumentRead {
            detail: format!("extraction task panicked: {}", e),
        })?
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoPath;

    impl TextExtractor for EchoPath {
        fn extract_text(&self, path: &Path) -> Result<String, DocumentError> {
            Ok(path.display().to_string())
        }
    }

    struct Panics;

    impl TextExtractor for Panics {
        fn extract_text(&self, _path: &Path) -> Result<String, DocumentError> {
            panic!("corrupt stream");
        }
    }

    #[tokio::test]
    async fn blocking_wrapper_returns_text() {
        let text = extract_text_blocking(Arc::new(EchoPath), PathBuf::from("BT_2024_03_15.pdf"))
            .await
            .unwrap();
        assert_eq!(text, "BT_2024_03_15.pdf");
    }

    #[tokio::test]
    async fn panicking_extractor_becomes_document_error() {
        let err = extract_text_blocking(Arc::new(Panics), PathBuf::from("x.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::DocumentRead { .. }));
    }
}
