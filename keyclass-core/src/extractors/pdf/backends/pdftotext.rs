//! `pdftotext` subprocess backend
//!
//! Spills the PDF to a temporary file and runs
//! `pdftotext -enc UTF-8 <file> -`, reading the text from stdout.

use super::PdfBackend;
use crate::error::{KeyclassError, Result};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::{debug, warn};

pub struct PdftotextBackend {
    binary: PathBuf,
}

impl PdftotextBackend {
    /// `binary` may be a bare command name resolved through `PATH`
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for PdftotextBackend {
    fn default() -> Self {
        Self::new("pdftotext")
    }
}

impl PdfBackend for PdftotextBackend {
    fn extract_text(&self, pdf_bytes: &[u8]) -> Result<String> {
        let mut spill = tempfile::Builder::new().suffix(".pdf").tempfile()?;
        spill.write_all(pdf_bytes)?;
        spill.flush()?;

        debug!(binary = %self.binary.display(), bytes = pdf_bytes.len(), "running pdftotext");
        let output = Command::new(&self.binary)
            .arg("-enc")
            .arg("UTF-8")
            .arg(spill.path())
            .arg("-")
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                KeyclassError::ExtractionError(format!(
                    "cannot run {}: {e}",
                    self.binary.display()
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(status = %output.status, stderr = %stderr.trim(), "pdftotext failed");
            return Err(KeyclassError::ExtractionError(format!(
                "pdftotext exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn name(&self) -> &str {
        "pdftotext"
    }

    fn is_healthy(&self) -> bool {
        Command::new(&self.binary)
            .arg("-v")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }
}
