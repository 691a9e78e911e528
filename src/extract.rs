//! # Document Extraction Module
//!
//! ## Purpose
//! Converts uploaded document bytes into plain text for classification and
//! matching. The core algorithms only ever see already-extracted text; this
//! module is the boundary where binary formats are handled or refused.
//!
//! ## Input/Output Specification
//! - **Input**: Uploaded file name and raw bytes
//! - **Output**: Extracted plain text, or `UnsupportedFormat` for extensions
//!   the extractor cannot handle
//! - **Formats**: TXT (UTF-8), PDF

use crate::errors::{MatchError, Result};
use std::path::Path;

/// Extensions the extractor can turn into text
pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "pdf"];

/// Extract plain text from an uploaded document.
///
/// Extension matching is case-insensitive. Unknown or absent extensions are
/// refused with `UnsupportedFormat`; DOCX/RTF/ODT uploads land here too until
/// their extractors exist.
pub fn extract_text(filename: &str, data: &[u8]) -> Result<String> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    tracing::debug!(
        "Extracting text from '{}' ({} bytes, .{})",
        filename,
        data.len(),
        extension
    );

    match extension.as_str() {
        "txt" => extract_txt(filename, data),
        "pdf" => extract_pdf(filename, data),
        _ => Err(MatchError::UnsupportedFormat { extension }),
    }
}

fn extract_txt(filename: &str, data: &[u8]) -> Result<String> {
    String::from_utf8(data.to_vec()).map_err(|_| MatchError::InvalidInput {
        field: "file".to_string(),
        reason: format!("'{}' is not valid UTF-8 text", filename),
    })
}

fn extract_pdf(filename: &str, data: &[u8]) -> Result<String> {
    pdf_extract::extract_text_from_mem(data).map_err(|e| MatchError::ExtractionFailed {
        filename: filename.to_string(),
        details: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn txt_files_decode_as_utf8() {
        let text = extract_text("judgment.txt", "wage dispute award".as_bytes()).unwrap();
        assert_eq!(text, "wage dispute award");
    }

    #[test]
    fn extension_matching_is_case_insensitive() {
        let text = extract_text("JUDGMENT.TXT", b"ok").unwrap();
        assert_eq!(text, "ok");
    }

    #[test]
    fn invalid_utf8_txt_is_rejected_as_input() {
        let err = extract_text("broken.txt", &[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, MatchError::InvalidInput { .. }));
    }

    #[test]
    fn unknown_extensions_are_unsupported() {
        for name in ["case.docx", "case.rtf", "case.odt", "case.exe", "case"] {
            let err = extract_text(name, b"data").unwrap_err();
            assert!(
                matches!(err, MatchError::UnsupportedFormat { .. }),
                "expected UnsupportedFormat for {name}"
            );
        }
    }

    #[test]
    fn malformed_pdf_reports_extraction_failure() {
        let err = extract_text("case.pdf", b"not a pdf at all").unwrap_err();
        assert!(matches!(err, MatchError::ExtractionFailed { .. }));
    }
}
