//! Input manager: validates an upload and routes it to the extractor

use crate::error::{Result, ResumeAnalyzerError};
use crate::input::file_detector::FileType;
use crate::input::text_extractor::{PdfExtractor, TextExtractor};
use log::info;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

#[derive(Default)]
pub struct InputManager;

impl InputManager {
    pub fn new() -> Self {
        Self
    }

    /// Extract text from a resume upload.
    ///
    /// Returns `EmptyDocument` when the file is a valid PDF but no page
    /// yielded any text.
    pub async fn extract_text(&self, path: &Path) -> Result<String> {
        if !path.exists() {
            return Err(ResumeAnalyzerError::InvalidInput(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        let file_type = self.detect_file_type(path).await?;

        let text = match file_type {
            FileType::Pdf => {
                info!("Extracting text from PDF: {}", path.display());
                PdfExtractor.extract(path).await?
            }
            FileType::Unknown => {
                return Err(ResumeAnalyzerError::UnsupportedFormat(format!(
                    "Only PDF resumes are supported: {}",
                    path.display()
                )));
            }
        };

        if text.is_empty() {
            return Err(ResumeAnalyzerError::EmptyDocument);
        }

        info!("Extracted {} characters from {}", text.chars().count(), path.display());
        Ok(text)
    }

    async fn detect_file_type(&self, path: &Path) -> Result<FileType> {
        let mut head = Vec::with_capacity(1024);
        File::open(path).await?.take(1024).read_to_end(&mut head).await?;
        Ok(FileType::detect(path, &head))
    }
}
