//! Text extraction from PDF documents

use crate::error::{Result, ResumeAnalyzerError};
use log::{debug, warn};
use lopdf::Document;
use std::path::Path;
use tokio::fs;

pub trait TextExtractor {
    fn extract(&self, path: &Path) -> impl std::future::Future<Output = Result<String>> + Send;
}

/// Page-wise PDF text extraction.
///
/// Pages are concatenated in page order with no separator and the result is
/// trimmed. Pages without decodable text are skipped, so a document with no
/// text at all extracts to an empty string rather than an error.
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let bytes = fs::read(path).await.map_err(ResumeAnalyzerError::Io)?;

        self.extract_from_bytes(&bytes).map_err(|e| match e {
            ResumeAnalyzerError::PdfExtraction(msg) => ResumeAnalyzerError::PdfExtraction(format!(
                "Failed to extract text from PDF '{}': {}",
                path.display(),
                msg
            )),
            other => other,
        })
    }
}

impl PdfExtractor {
    pub fn extract_from_bytes(&self, bytes: &[u8]) -> Result<String> {
        match Document::load_mem(bytes) {
            Ok(doc) => Ok(Self::extract_pages(&doc)),
            Err(lopdf_err) => {
                // lopdf is stricter about xref tables than pdf-extract
                warn!("lopdf could not parse document ({}), retrying with pdf-extract", lopdf_err);
                let text = pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
                    ResumeAnalyzerError::PdfExtraction(format!("{} (lopdf: {})", e, lopdf_err))
                })?;
                Ok(text.trim().to_string())
            }
        }
    }

    fn extract_pages(doc: &Document) -> String {
        let mut text = String::new();

        for (page_num, _page_id) in doc.get_pages() {
            match doc.extract_text(&[page_num]) {
                // lopdf ends each text object with a newline
                Ok(page_text) if !page_text.trim().is_empty() => {
                    text.push_str(page_text.trim_end_matches('\n'))
                }
                Ok(_) => debug!("Page {} has no text, skipping", page_num),
                Err(e) => debug!("Page {} could not be decoded ({}), skipping", page_num, e),
            }
        }

        text.trim().to_string()
    }
}
