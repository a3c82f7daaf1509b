//! PDF Extractor
//!
//! Extracts PDF text through a pluggable backend.

pub mod backends;

use crate::error::{KeyclassError, Result};
use crate::extractors::{has_extension, TextExtractor};
use std::path::Path;

pub use backends::{PdfBackend, PdftotextBackend};

/// How far into the file the `%PDF-` marker may appear
const HEADER_SEARCH_WINDOW: usize = 1024;

/// Backend enum for runtime backend selection
pub enum PdfBackendImpl {
    Pdftotext(PdftotextBackend),
    Custom(Box<dyn PdfBackend>),
}

impl PdfBackend for PdfBackendImpl {
    fn extract_text(&self, pdf_bytes: &[u8]) -> Result<String> {
        match self {
            PdfBackendImpl::Pdftotext(backend) => backend.extract_text(pdf_bytes),
            PdfBackendImpl::Custom(backend) => backend.extract_text(pdf_bytes),
        }
    }

    fn name(&self) -> &str {
        match self {
            PdfBackendImpl::Pdftotext(backend) => backend.name(),
            PdfBackendImpl::Custom(backend) => backend.name(),
        }
    }

    fn is_healthy(&self) -> bool {
        match self {
            PdfBackendImpl::Pdftotext(backend) => backend.is_healthy(),
            PdfBackendImpl::Custom(backend) => backend.is_healthy(),
        }
    }
}

/// PDF extractor with pluggable backend
///
/// Rejects input without a `%PDF-` header before handing it to the backend.
pub struct PdfExtractor {
    backend: PdfBackendImpl,
}

impl PdfExtractor {
    pub fn new(backend: PdfBackendImpl) -> Self {
        Self { backend }
    }

    pub fn with_backend(backend: Box<dyn PdfBackend>) -> Self {
        Self::new(PdfBackendImpl::Custom(backend))
    }

    /// Get the backend name for logging
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Check if the backend is healthy
    pub fn is_healthy(&self) -> bool {
        self.backend.is_healthy()
    }
}

impl TextExtractor for PdfExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String> {
        let window = &bytes[..bytes.len().min(HEADER_SEARCH_WINDOW)];
        if !window.windows(5).any(|w| w == b"%PDF-") {
            return Err(KeyclassError::ExtractionError(
                "missing %PDF- header".to_string(),
            ));
        }
        self.backend.extract_text(bytes)
    }

    fn name(&self) -> &str {
        "PdfExtractor"
    }

    fn supports_file_type(&self, path: &Path) -> bool {
        has_extension(path, &["pdf"])
    }
}
