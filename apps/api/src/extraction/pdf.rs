use std::panic::{catch_unwind, AssertUnwindSafe};

use lopdf::content::{Content, Operation};
use lopdf::Document;
use tracing::warn;

use super::ExtractionError;

/// Extracts text from PDF bytes.
///
/// `pdf-extract` panics on some malformed inputs; the panic is contained so a
/// single hostile upload can only fail its own result.
pub fn extract_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    match catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes))) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(ExtractionError::Pdf(e.to_string())),
        Err(_) => Err(ExtractionError::Pdf("parser crashed on malformed document".to_string())),
    }
}

/// Decoded content-stream operations for every page, in page order.
/// Pages whose content cannot be decoded are skipped.
pub fn page_operations(bytes: &[u8]) -> Result<Vec<Vec<Operation>>, ExtractionError> {
    let doc = Document::load_mem(bytes).map_err(|e| ExtractionError::Pdf(e.to_string()))?;

    let mut pages = Vec::new();
    for (page_number, page_id) in doc.get_pages() {
        let content = match doc.get_page_content(page_id) {
            Ok(c) => c,
            Err(e) => {
                warn!("Skipping PDF page {page_number}: {e}");
                continue;
            }
        };
        match Content::decode(&content) {
            Ok(decoded) => pages.push(decoded.operations),
            Err(e) => warn!("Could not decode content of PDF page {page_number}: {e}"),
        }
    }
    Ok(pages)
}
