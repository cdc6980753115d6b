// src/pdf/mod.rs
use std::fs;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;

use crate::utils::error::PdfError;

/// Reads a PDF from disk and returns the text of all pages concatenated in page order.
pub fn extract_text_from_pdf(path: &Path) -> Result<String, PdfError> {
    tracing::info!("Reading PDF document: {}", path.display());

    // The file handle lives only for the duration of the read
    let bytes = fs::read(path)?;
    tracing::debug!("Read {} bytes from {}", bytes.len(), path.display());

    let pages = extract_pages_from_mem(&bytes)?;
    let text = join_pages(&pages);

    tracing::info!("Extracted {} characters from {} pages", text.len(), pages.len());
    Ok(text)
}

/// Extracts plain text per page. Panics inside the PDF library surface as parse errors.
pub fn extract_pages_from_mem(bytes: &[u8]) -> Result<Vec<String>, PdfError> {
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }));

    match outcome {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(e)) => Err(PdfError::Parse(e.to_string())),
        Err(panic) => {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic in PDF decoder".to_string());
            tracing::error!("PDF decoder panicked: {}", reason);
            Err(PdfError::Parse(reason))
        }
    }
}

/// Concatenates page texts without inserting separators.
pub fn join_pages(pages: &[String]) -> String {
    pages.concat()
}
