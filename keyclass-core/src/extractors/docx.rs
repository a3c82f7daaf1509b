//! DOCX Extractor
//!
//! A `.docx` file is a zip archive; the body lives in `word/document.xml`.
//! Text runs (`w:t`) are concatenated, each paragraph (`w:p`) ends with a
//! newline, `w:tab` becomes a tab and `w:br`/`w:cr` a newline.

use crate::error::{KeyclassError, Result};
use crate::extractors::{has_extension, TextExtractor};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use std::path::Path;

const DOCUMENT_PART: &str = "word/document.xml";

#[derive(Debug, Default)]
pub struct DocxExtractor;

impl DocxExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl TextExtractor for DocxExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String> {
        let xml = read_document_part(bytes)?;
        document_text(&xml)
    }

    fn name(&self) -> &str {
        "DocxExtractor"
    }

    fn supports_file_type(&self, path: &Path) -> bool {
        has_extension(path, &["docx"])
    }
}

fn read_document_part(bytes: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| KeyclassError::ExtractionError(format!("not a DOCX archive: {e}")))?;
    let mut part = archive.by_name(DOCUMENT_PART).map_err(|e| {
        KeyclassError::ExtractionError(format!("missing {DOCUMENT_PART}: {e}"))
    })?;

    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .map_err(|e| KeyclassError::ExtractionError(format!("unreadable {DOCUMENT_PART}: {e}")))?;
    Ok(xml)
}

fn document_text(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::with_capacity(xml.len() / 4);
    let mut in_run_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if e.name().as_ref() == b"w:t" {
                    in_run_text = true;
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_run_text = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" => text.push('\t'),
                b"w:br" | b"w:cr" | b"w:p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_run_text => {
                let unescaped = t.unescape().map_err(|e| {
                    KeyclassError::ExtractionError(format!("bad text in {DOCUMENT_PART}: {e}"))
                })?;
                text.push_str(&unescaped);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(KeyclassError::ExtractionError(format!(
                    "malformed {DOCUMENT_PART} at byte {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
    }

    Ok(text)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraphs_become_lines() {
        let bytes = fixtures::docx_bytes(&["Birinchi qator", "Second &amp; last"]);
        let text = DocxExtractor::new().extract(&bytes).unwrap();
        assert_eq!(text, "Birinchi qator\nSecond & last\n");
    }

    #[test]
    fn runs_tabs_and_breaks() {
        let xml = r#"<w:document><w:body><w:p><w:r><w:t>a</w:t></w:r><w:r><w:tab/><w:t>b</w:t><w:br/><w:t>c</w:t></w:r></w:p></w:body></w:document>"#;
        assert_eq!(document_text(xml).unwrap(), "a\tb\nc\n");
    }

    #[test]
    fn text_outside_runs_is_ignored() {
        let xml = r#"<w:document><w:body><w:p><w:instrText>PAGE</w:instrText><w:r><w:t>x</w:t></w:r></w:p></w:body></w:document>"#;
        assert_eq!(document_text(xml).unwrap(), "x\n");
    }

    #[test]
    fn non_zip_input_is_an_extraction_error() {
        let err = DocxExtractor::new().extract(b"plain text, not a zip").unwrap_err();
        assert!(matches!(err, KeyclassError::ExtractionError(_)), "{err}");
    }

    #[test]
    fn zip_without_document_part_is_an_extraction_error() {
        use std::io::Write;
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("readme.txt", zip::write::FileOptions::default())
            .unwrap();
        writer.write_all(b"hello").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let err = DocxExtractor::new().extract(&bytes).unwrap_err();
        assert!(err.to_string().contains("word/document.xml"), "{err}");
    }
}
