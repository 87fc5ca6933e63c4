use tracing::{info, warn};

use crate::error::ExtractionError;

/// Extract the text layer of a PDF byte stream as a single string, pages
/// concatenated in order. A stream that parses but yields no text (scanned
/// pages, image-only documents) is an error: every downstream prompt depends
/// on non-empty input, so an empty string must never slip through silently.
pub fn extract_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| ExtractionError::Unreadable(e.to_string()))?;

    if text.trim().is_empty() {
        warn!("document parsed as PDF but produced no text layer");
        return Err(ExtractionError::NoTextLayer);
    }

    info!("extracted {} characters from uploaded document", text.len());
    Ok(text)
}

/// Async wrapper that offloads PDF parsing to a blocking thread so it does
/// not obstruct the async scheduler.
pub async fn extract_text_async(bytes: Vec<u8>) -> Result<String, ExtractionError> {
    tokio::task::spawn_blocking(move || extract_text(&bytes))
        .await
        .map_err(|e| ExtractionError::Unreadable(format!("extraction task failed: {}", e)))?
}
