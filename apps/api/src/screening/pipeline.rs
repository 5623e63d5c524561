//! Per-file screening pipeline: extract → detect → evaluate.
//!
//! Every failure is contained in that file's `ScreeningResult`; a batch always
//! yields one result per upload, in upload order.

use std::path::Path;

use anyhow::Context;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::extraction::{extract_text, ExtractedDocument, ExtractionError};
use crate::screening::evaluator::ResumeEvaluator;
use crate::screening::report::ScreeningResult;
use crate::screening::suspicious::{self, SuspiciousFlag};

/// A resume file as received.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Bytes,
}

impl Upload {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    /// Reads a local file; the upload keeps only the file name, not the directory.
    pub async fn from_path(path: &Path) -> anyhow::Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Could not read {}", path.display()))?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(filename, bytes))
    }
}

/// Extraction and detection run together on the blocking pool.
fn prepare(upload: &Upload) -> Result<(ExtractedDocument, Vec<SuspiciousFlag>), ExtractionError> {
    let document = extract_text(&upload.filename, upload.bytes.clone())?;
    let flags = suspicious::detect(&document);
    Ok((document, flags))
}

/// Screens one file. Never fails: problems become an error entry.
pub async fn screen_upload(
    evaluator: &dyn ResumeEvaluator,
    job_description: &str,
    upload: Upload,
) -> ScreeningResult {
    let filename = upload.filename.clone();

    let prepared = tokio::task::spawn_blocking(move || prepare(&upload)).await;
    let (document, flags) = match prepared {
        Ok(Ok(prepared)) => prepared,
        Ok(Err(e)) => {
            warn!(file = %filename, "Text extraction failed: {e}");
            return ScreeningResult::failed(filename, format!("Could not extract text: {e}"), &[]);
        }
        Err(e) => {
            warn!(file = %filename, "Extraction task failed: {e}");
            return ScreeningResult::failed(
                filename,
                "Could not extract text: extraction task failed",
                &[],
            );
        }
    };

    if !flags.is_empty() {
        info!(file = %filename, flags = flags.len(), "Suspicious content flagged");
    }

    match evaluator.evaluate(job_description, &document.text).await {
        Ok(assessment) => ScreeningResult::evaluated(filename, assessment, &flags),
        Err(e) => {
            warn!(file = %filename, "Evaluation failed: {e}");
            ScreeningResult::failed(filename, e.to_string(), &flags)
        }
    }
}

/// Screens a batch with at most `concurrency` files in flight.
/// Results are returned in upload order.
pub async fn screen_batch(
    evaluator: &dyn ResumeEvaluator,
    job_description: &str,
    uploads: Vec<Upload>,
    concurrency: usize,
) -> Vec<ScreeningResult> {
    stream::iter(uploads)
        .map(|upload| screen_upload(evaluator, job_description, upload))
        .buffered(concurrency.max(1))
        .collect()
        .await
}
