use docx_rs::{read_docx, DocumentChild, Docx, ParagraphChild, RunChild};
use serde_json::Value;

use super::ExtractionError;

fn read(bytes: &[u8]) -> Result<Docx, ExtractionError> {
    read_docx(bytes).map_err(|e| ExtractionError::Docx(e.to_string()))
}

/// Extracts paragraph text from DOCX bytes, one line per paragraph.
pub fn extract_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let docx = read(bytes)?;

    let mut text = String::new();
    for child in docx.document.children {
        if let DocumentChild::Paragraph(paragraph) = child {
            for paragraph_child in paragraph.children {
                if let ParagraphChild::Run(run) = paragraph_child {
                    for run_child in run.children {
                        match run_child {
                            RunChild::Text(t) => text.push_str(&t.text),
                            RunChild::Tab(_) => text.push('\t'),
                            _ => {}
                        }
                    }
                }
            }
            text.push('\n');
        }
    }
    Ok(text)
}

/// The document body as a JSON tree, including run formatting properties.
pub fn document_tree(bytes: &[u8]) -> Result<Value, ExtractionError> {
    let docx = read(bytes)?;
    serde_json::to_value(&docx.document).map_err(|e| ExtractionError::Docx(e.to_string()))
}
