//! PDF Backend trait
//!
//! Defines the interface that all PDF text backends must implement.

use crate::error::Result;

/// Backend trait for PDF text extraction
///
/// Backends return the document's text with pages separated by form feeds
/// or newlines; layout beyond that is not significant for classification.
pub trait PdfBackend: Send + Sync {
    /// Extract PDF bytes to plain text
    fn extract_text(&self, pdf_bytes: &[u8]) -> Result<String>;

    /// Backend identifier for logging/debugging
    fn name(&self) -> &str;

    /// Check if backend is healthy/ready
    fn is_healthy(&self) -> bool;
}

pub mod pdftotext;

pub use pdftotext::PdftotextBackend;
