//! Document Text Extractors
//!
//! This module turns uploaded binary documents into the plain text the
//! tokenizer consumes.
//!
//! ## Architecture
//!
//! ```text
//! Uploaded file (PDF, DOCX)
//!     ↓
//! [DocumentExtractor] (dispatch by extension)
//!     ↓
//! [Format-specific TextExtractor]
//!     ↓
//! Plain text
//! ```
//!
//! ## Available Extractors
//!
//! - `PdfExtractor` - PDF documents via a pluggable backend (`pdftotext` by default)
//! - `DocxExtractor` - Word documents (zip container + WordprocessingML)
//!
//! Legacy `.doc` files have no extractor and fail with `UnsupportedFormat`.

pub mod docx;
pub mod pdf;
pub mod traits;

pub use docx::DocxExtractor;
pub use pdf::{PdfBackend, PdfBackendImpl, PdfExtractor, PdftotextBackend};
pub use traits::TextExtractor;

use crate::config::ExtractionConfig;
use crate::error::{KeyclassError, Result};
use std::path::Path;
use tracing::info;

/// Routes a file to the first registered extractor that supports its extension.
pub struct DocumentExtractor {
    extractors: Vec<Box<dyn TextExtractor>>,
}

impl Default for DocumentExtractor {
    fn default() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }
}

impl DocumentExtractor {
    /// Create an extractor with nothing registered
    pub fn empty() -> Self {
        Self {
            extractors: Vec::new(),
        }
    }

    /// Register PDF and DOCX extraction as configured
    pub fn from_config(config: &ExtractionConfig) -> Self {
        let pdf = PdfExtractor::new(PdfBackendImpl::Pdftotext(PdftotextBackend::new(
            &config.pdftotext_path,
        )));
        Self::empty()
            .with_extractor(Box::new(pdf))
            .with_extractor(Box::new(DocxExtractor::new()))
    }

    pub fn with_extractor(mut self, extractor: Box<dyn TextExtractor>) -> Self {
        self.extractors.push(extractor);
        self
    }

    pub fn supports(&self, file_name: &str) -> bool {
        let path = Path::new(file_name);
        self.extractors.iter().any(|e| e.supports_file_type(path))
    }

    /// Extract plain text from `bytes`, choosing the extractor by `file_name`.
    pub fn extract(&self, file_name: &str, bytes: &[u8]) -> Result<String> {
        let path = Path::new(file_name);
        let extractor = self
            .extractors
            .iter()
            .find(|e| e.supports_file_type(path))
            .ok_or_else(|| {
                KeyclassError::UnsupportedFormat(format!(
                    "no text extractor for '{file_name}' (supported: pdf, docx)"
                ))
            })?;

        let text = extractor.extract(bytes)?;
        info!(
            file_name,
            extractor = extractor.name(),
            bytes = bytes.len(),
            chars = text.chars().count(),
            "extracted document text"
        );
        Ok(text)
    }
}

/// Case-insensitive extension check shared by the extractors.
pub(crate) fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            extensions.iter().any(|candidate| *candidate == ext)
        })
        .unwrap_or(false)
}
