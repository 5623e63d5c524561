//! Document text extraction for uploaded resumes.
//!
//! Parsing itself is delegated to `pdf-extract` and `docx-rs`; this module only
//! picks the reader by file extension and normalises failures into `ExtractionError`.

pub mod docx;
pub mod pdf;

use std::fmt;

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("PDF parse error: {0}")]
    Pdf(String),

    #[error("DOCX parse error: {0}")]
    Docx(String),

    #[error("no readable text found in document")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Docx,
    Txt,
}

impl DocumentKind {
    /// Resolves the document kind from the lower-cased file extension.
    pub fn from_filename(filename: &str) -> Result<Self, ExtractionError> {
        let ext = std::path::Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))
            .unwrap_or_default();

        match ext.as_str() {
            ".pdf" => Ok(DocumentKind::Pdf),
            ".docx" => Ok(DocumentKind::Docx),
            ".txt" => Ok(DocumentKind::Txt),
            _ => Err(ExtractionError::UnsupportedType(ext)),
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::Docx => "docx",
            DocumentKind::Txt => "txt",
        };
        f.write_str(s)
    }
}

/// Extracted text plus the original bytes, which the suspicious-content
/// detector inspects for formatting tricks the plain text cannot show.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub kind: DocumentKind,
    pub text: String,
    pub bytes: Bytes,
}

/// Extracts plain text from an uploaded resume.
///
/// CPU bound; async callers should run it on the blocking pool.
pub fn extract_text(filename: &str, bytes: Bytes) -> Result<ExtractedDocument, ExtractionError> {
    let kind = DocumentKind::from_filename(filename)?;

    let text = match kind {
        DocumentKind::Pdf => pdf::extract_text(&bytes)?,
        DocumentKind::Docx => docx::extract_text(&bytes)?,
        DocumentKind::Txt => String::from_utf8_lossy(&bytes).replace('\u{FFFD}', ""),
    };

    if text.trim().is_empty() {
        return Err(ExtractionError::Empty);
    }

    Ok(ExtractedDocument { kind, text, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_extension_is_case_insensitive() {
        assert_eq!(DocumentKind::from_filename("CV.PDF").unwrap(), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_filename("a.b.Docx").unwrap(), DocumentKind::Docx);
        assert_eq!(DocumentKind::from_filename("notes.txt").unwrap(), DocumentKind::Txt);
    }

    #[test]
    fn test_unsupported_extension_names_the_extension() {
        let err = DocumentKind::from_filename("resume.rtf").unwrap_err();
        assert_eq!(err.to_string(), "Unsupported file type: .rtf");
    }

    #[test]
    fn test_missing_extension_is_unsupported() {
        assert!(matches!(
            DocumentKind::from_filename("resume"),
            Err(ExtractionError::UnsupportedType(ext)) if ext.is_empty()
        ));
    }

    #[test]
    fn test_txt_decodes_lossily() {
        let bytes = Bytes::from_static(b"Jane Doe\n\xff\xfeRust engineer");
        let doc = extract_text("jane.txt", bytes).unwrap();
        assert_eq!(doc.kind, DocumentKind::Txt);
        assert_eq!(doc.text, "Jane Doe\nRust engineer");
    }

    #[test]
    fn test_blank_txt_is_empty_error() {
        let err = extract_text("blank.txt", Bytes::from_static(b"  \n\t ")).unwrap_err();
        assert!(matches!(err, ExtractionError::Empty));
    }

    #[test]
    fn test_garbage_pdf_is_an_error_not_a_panic() {
        let err = extract_text("broken.pdf", Bytes::from_static(b"%PDF-1.4 garbage")).unwrap_err();
        assert!(matches!(err, ExtractionError::Pdf(_)));
    }

    #[test]
    fn test_garbage_docx_is_an_error() {
        let err = extract_text("broken.docx", Bytes::from_static(b"not a zip")).unwrap_err();
        assert!(matches!(err, ExtractionError::Docx(_)));
    }
}
