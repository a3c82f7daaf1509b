// Text extraction abstraction
//
// This module defines the boundary between document formats (PDF, DOCX bytes)
// and classification (plain text). Everything after this point is
// format-agnostic.

use crate::error::Result;
use std::path::Path;

/// Extractor trait - converts document bytes to plain text
///
/// Implementations must fail rather than return empty text when a document
/// cannot be read; callers never substitute an empty string for a failure.
pub trait TextExtractor: Send + Sync {
    /// Extract the plain text of a document held in memory
    fn extract(&self, bytes: &[u8]) -> Result<String>;

    /// Get extractor name for logging
    fn name(&self) -> &str;

    /// Check if extractor supports the given file type
    fn supports_file_type(&self, path: &Path) -> bool;
}
